// Nodes layer - the host-facing surface.
// Node methods call the core service; outputs and the CLI catalog live next
// to them.

#[path = "outputs.rs"]
pub mod outputs;

#[path = "sheets_nodes.rs"]
pub mod sheets_nodes;

#[path = "commands.rs"]
pub mod commands;

pub use sheets_nodes::SheetsNodes;
