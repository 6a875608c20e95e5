//! HTTP control surface
//!
//! REST endpoints for transport and playlist control plus an SSE stream
//! of every event on the bus.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
