//! Fixed-window rate limiting for ID8 endpoints.
//!
//! Provides:
//! - [`RateLimiter`]: process-scoped, bounded table of per-client windows
//! - [`RateLimitConfig`]: limit, window length and table bounds
//! - [`RateLimitDecision`]: outcome of one check, with header metadata
//!
//! Counts live in process memory only. Restarting the process resets every
//! window, and horizontally scaled deployments keep independent counters per
//! instance.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod limiter;

pub use limiter::{RateLimitConfig, RateLimitDecision, RateLimiter};
