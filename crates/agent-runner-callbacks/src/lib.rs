//! Inbound callback surface for Agent Runner.
//!
//! While a session runs, Agent Runner calls back into the host application
//! for remote tool execution and status notifications:
//!
//! - `POST /tools/{tool_name}`
//! - `POST /sessions/{session_id}/status`
//!
//! Both routes verify the request's signature envelope before any handler
//! logic runs. [`router`] returns a plain `axum::Router` the host mounts
//! wherever its callback base URL points.

pub mod error;
pub mod routes;
pub mod state;
pub mod verify;

pub use error::AuthError;
pub use routes::router;
pub use state::{CallbackState, StatusListener};
