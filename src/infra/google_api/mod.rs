#[path = "transport.rs"]
pub mod transport;

pub use transport::ApiTransport;
