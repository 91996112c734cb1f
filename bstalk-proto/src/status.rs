//! Status tokens that open every server response line.

pub const INSERTED: &str = "INSERTED";
pub const USING: &str = "USING";
pub const RESERVED: &str = "RESERVED";
pub const DELETED: &str = "DELETED";
pub const RELEASED: &str = "RELEASED";
pub const BURIED: &str = "BURIED";
pub const TOUCHED: &str = "TOUCHED";
pub const WATCHING: &str = "WATCHING";
pub const FOUND: &str = "FOUND";
pub const KICKED: &str = "KICKED";
pub const OK: &str = "OK";
pub const PAUSED: &str = "PAUSED";

// Rejections.
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const EXPECTED_CRLF: &str = "EXPECTED_CRLF";
pub const JOB_TOO_BIG: &str = "JOB_TOO_BIG";
pub const DRAINING: &str = "DRAINING";
pub const OUT_OF_MEMORY: &str = "OUT_OF_MEMORY";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const BAD_FORMAT: &str = "BAD_FORMAT";
pub const UNKNOWN_COMMAND: &str = "UNKNOWN_COMMAND";
pub const DEADLINE_SOON: &str = "DEADLINE_SOON";
pub const TIMED_OUT: &str = "TIMED_OUT";
pub const NOT_IGNORED: &str = "NOT_IGNORED";

/// Statuses whose last meta field announces a trailing body.
pub const BODY_STATUSES: [&str; 3] = [RESERVED, FOUND, OK];

/// Returns true when `status` is followed by a length-prefixed body.
pub fn carries_body(status: &str) -> bool {
    BODY_STATUSES.contains(&status)
}
