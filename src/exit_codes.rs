/// Normal completion, including runs where some items failed.
pub const SUCCESS: u8 = 0;
pub const RUNTIME_ERROR: u8 = 1;
pub const PREREQUISITE_MISSING: u8 = 2;
pub const SOURCE_UNAVAILABLE: u8 = 3;
pub const INTERRUPTED: u8 = 130;
