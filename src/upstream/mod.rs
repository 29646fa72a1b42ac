//! Upstream model-server forwarding.
//!
//! # Data Flow
//! ```text
//! handler
//!     → ForwardRequest (method, path, borrowed inbound headers, body)
//!     → forwarder.rs (clone headers, strip hop-by-hop, inject trace context)
//!     → hyper client, bounded by the response timeout
//!     → upstream Response<Incoming> streamed back by http/response.rs
//! ```
//!
//! # Design Decisions
//! - Single attempt, no retries
//! - Inbound headers are borrowed and cloned; forwarding never mutates them
//! - Dropping the returned future or body aborts the upstream call

pub mod error;
pub mod forwarder;

pub use error::ForwardError;
pub use forwarder::{ForwardRequest, Forwarder};
