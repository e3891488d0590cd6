//! Hosting API calls and the structs they exchange

pub mod hosting;
pub mod types;

pub use hosting::HostingClient;
pub use types::*;
