//! Small shared helpers with no dependency on the engine: async bridging for
//! synchronous call sites, command-line splitting, and text utilities used by
//! run logging.

pub mod async_runtime;
pub mod command_line;
pub mod text;

pub use async_runtime::block_on_future;
pub use command_line::split_command_line;
pub use text::{sanitize_file_stem, truncate_preview};
