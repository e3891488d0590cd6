//! Minimal XML-RPC client
//!
//! Covers the subset of XML-RPC the hosting API uses: positional parameters,
//! struct/array values and fault responses. Typed request and response
//! structs cross the wire through [`to_value`] and [`from_value`].

pub mod client;
pub mod codec;
pub mod error;
pub mod value;

pub use client::RpcClient;
pub use codec::{decode_response, encode_call};
pub use error::{Result, RpcError};
pub use value::{Value, from_value, to_value};
