// The infra module contains implementations of core traits.
// Each external service gets its own submodule.

#[path = "google_auth/mod.rs"]
pub mod google_auth;

#[path = "google_api/mod.rs"]
pub mod google_api;

#[path = "google_sheets/mod.rs"]
pub mod google_sheets;

#[path = "google_drive/mod.rs"]
pub mod google_drive;
