// hnv-api: Async HTTP client for the network-virtualization controller REST API

pub mod client;
pub mod error;
pub mod transport;

pub use client::{BasicAuth, HnvClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
