//! HTTP handler surface.
//!
//! # Data Flow
//! ```text
//! Engine accepts request
//!     → dispatcher attaches MatchedRoute (request.rs)
//!     → Handler::call (handler.rs)
//!     → Outcome::Respond → sent to client
//!     → Outcome::Pass    → next matching handler
//! ```

pub mod handler;
pub mod request;

pub use handler::{respond, Handler, Outcome, SharedHandler};
pub use request::{MatchedRoute, RequestExt, X_REQUEST_ID};
