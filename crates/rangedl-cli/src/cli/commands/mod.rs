//! CLI command handlers, one per file.

mod discard;
mod get;
mod status;

pub use discard::run_discard;
pub use get::run_get;
pub use status::run_status;
