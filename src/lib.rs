// Google Sheets and Drive nodes for BIM automation.
//
// **Architecture Overview:**
// - `core/` = Business logic (cell typing, row deletion, the sheets service)
// - `infra/` = Implementations of core traits (Google OAuth2, REST clients)
// - `nodes/` = Host adapter (typed node outputs, CLI command catalog)

#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;
#[path = "nodes/node_layer.rs"]
pub mod nodes;

pub mod config;
