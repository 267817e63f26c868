//! HTTP client for driving Agent Runner sessions.
//!
//! Provides:
//! - [`RunnerClient`] - the five signed HTTP operations
//! - [`EventStream`] / [`FrameDecoder`] - incremental event stream consumption
//! - [`AgentRunner`] / [`AgentBuilder`] - fluent session configuration with
//!   three execution modes (run / start / dispatch)

pub mod builder;
pub mod client;
pub mod error;
pub mod runner;
pub mod sse;

pub use builder::{AgentBuilder, StartedSession};
pub use client::RunnerClient;
pub use error::{ClientError, StreamError};
pub use runner::AgentRunner;
pub use sse::{EventStream, FrameDecoder};
