//! Request and response model for intercepted traffic
//!
//! Requests are canonicalized against a [`Scope`] so that `./index.html`
//! and `http://localhost:8080/index.html` address the same cache entry.
//! Responses carry a single-read body, mirroring how a network stream
//! can only be consumed once.

mod headers;
mod request;
mod response;

pub use headers::Headers;
pub use request::{RequestDescriptor, Scope};
pub use response::{Response, ResponseType};
