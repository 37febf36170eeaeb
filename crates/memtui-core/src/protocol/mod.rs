//! memcached ASCII protocol
//!
//! [`codec`] turns requests into bytes and bytes into replies; [`client`]
//! drives a connection with timeouts and cancellation.

pub mod client;
pub mod codec;

pub use client::{ClientOptions, ProtocolClient};
pub use codec::{parse_response, ParseError, Request, Response};
