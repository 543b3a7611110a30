// Google OAuth2 for the Sheets and Drive clients.
// - `credentials.rs` parses the supported credential files.
// - `token_source.rs` implements the core `TokenProvider`.
// - `installed_flow.rs` runs the loopback browser consent for desktop clients.

#[path = "credentials.rs"]
pub mod credentials;

#[path = "token_source.rs"]
pub mod token_source;

#[path = "installed_flow.rs"]
pub mod installed_flow;

pub use credentials::Credentials;
pub use token_source::GoogleAuth;
