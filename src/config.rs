// Exit statuses follow the BSD sysexits convention.
pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 64;
pub const EXIT_STATIC_ERROR: i32 = 65;
pub const EXIT_RUNTIME_ERROR: i32 = 70;
pub const EXIT_IO_ERROR: i32 = 74;

pub const USAGE: &str = "Usage: oc [script]";

pub const PROMPT: &str = "> ";

// stored under the user's home directory
pub const HISTORY_FILE: &str = ".oc_history";
