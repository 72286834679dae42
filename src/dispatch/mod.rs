pub mod dispatch_loop;
pub mod table;

pub use dispatch_loop::{DispatchLoop, Mode};
pub use table::{Command, ShortcutTable, EXIT_KEYWORD, RESTART_KEYWORD};
