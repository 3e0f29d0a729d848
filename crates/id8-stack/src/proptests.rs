//! Property-based tests for the stack store.
