//! # id8-api
//!
//! HTTP API for the ID8 marketplace.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/track/view` | count a detail-page view (rate limited) |
//! | `POST /api/track/install` | count an install (rate limited) |
//! | `GET /api/catalog/search` | ranked search over published items |
//! | `GET /api/catalog/items` | filtered, paginated listing |
//! | `GET /api/catalog/items/{slug}` | one published item |
//! | `GET /api/admin/items` | listing including drafts (bearer auth) |
//! | `GET /health` | liveness and catalog readiness |
//!
//! Errors are JSON `{ "error": message }`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, Result};
pub use server::{Server, build_router};
pub use state::AppState;
