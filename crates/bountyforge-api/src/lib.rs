//! The thin HTTP driver for the BountyForge scan pipeline engine: job
//! submission, SSE event stream, job history/detail, adapter
//! availability. No login/session logic lives here — the principal is
//! an opaque header value.

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;
