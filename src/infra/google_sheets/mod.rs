#[path = "sheets_client.rs"]
pub mod sheets_client;

pub use sheets_client::GoogleSheetsClient;
