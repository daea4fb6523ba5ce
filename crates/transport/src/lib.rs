//! Wire protocol of the VM debug server.
//!
//! Every exchange is a single HTTP POST: the request body is one request frame
//! and the response body is one response frame.
//!
//! ```text
//! request:  magic (u64, big-endian) | opcode (u8) | body
//! response: magic (u64, little-endian) | opcode (u8) | payload
//! ```
//!
//! # Scope
//!
//! This crate handles framing only:
//! - Encoding outgoing [`Request`]s
//! - Parsing incoming bytes into typed [`Response`]s
//! - Moving frames over a [`Transport`]
//!
//! Session state, the register bank and breakpoints live in the `debugger` crate.
mod error;
mod http;
mod opcode;
mod request;
mod response;

pub mod testing;

pub use error::{ProtocolError, ServerError, TransportError};
pub use http::HttpTransport;
pub use opcode::Opcode;
pub use request::Request;
pub use response::{Payload, RegisterSnapshot, Response};

use std::future::Future;

use bytes::Bytes;

/// Magic prefix of every request frame, written big-endian.
pub const REQUEST_MAGIC: u64 = 0x4772_C3BC_657A_693F;

/// Magic prefix of every response frame, read little-endian.
pub const RESPONSE_MAGIC: u64 = 0x4772_C3BC_657A_6921;

/// Length of the magic and opcode that start every frame.
pub const HEADER_LEN: usize = 9;

/// Something that can deliver a request frame and return the response frame.
///
/// One exchange is in flight at a time; callers do not pipeline requests.
pub trait Transport: Send + Sync {
    fn exchange(&self, frame: Bytes) -> impl Future<Output = Result<Bytes, TransportError>> + Send;
}
