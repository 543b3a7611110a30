#[path = "drive_client.rs"]
pub mod drive_client;

pub use drive_client::GoogleDriveClient;
