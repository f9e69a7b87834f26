//! HTTP surface for the financial analysis pipeline
//!
//! - `POST /analyze` starts an analysis and returns its id
//! - `GET /analyze/:request_id` polls it
//! - `DELETE /analyze/:request_id` cancels it
//! - `GET /health`
//!
//! Analyses run in background tasks owned by the [`RequestTracker`]; results
//! live in a [`BoundedStore`] until they expire.

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod tracker;

pub use app::create_app;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;
pub use store::{BoundedStore, Outcome, RequestEntry, RequestStatus, StoreError};
pub use tracker::{RequestTracker, TrackerError};
