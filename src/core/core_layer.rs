// The core module contains all business logic.
// Nothing in here performs I/O directly; remote calls go through the ports
// defined next to the logic that uses them.

#[path = "auth/token_provider.rs"]
pub mod auth;

#[path = "sheets/mod.rs"]
pub mod sheets;
