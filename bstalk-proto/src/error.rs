//! Error types for protocol framing and payload decoding.

/// Alias for `Result<T, ProtoError>`.
pub type ProtoResult<T> = Result<T, ProtoError>;

/// Malformed data received from the server.
///
/// These are framing or payload defects, not server rejections: a rejection
/// is a well-formed response whose status is not the expected one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ProtoError {
    /// The response had no CRLF-terminated header line.
    #[error("response is missing the CRLF header terminator")]
    MissingCrlf,

    /// The response header was empty.
    #[error("response has an empty status line")]
    EmptyStatus,

    /// A success response lacked a meta field the command needs.
    #[error("{verb}: response is missing meta field #{index}")]
    MissingField {
        /// Verb of the command whose response was short.
        verb: &'static str,
        /// Zero-based position of the missing field.
        index: usize,
    },

    /// A meta field expected to be an unsigned integer was not.
    #[error("{verb}: invalid integer field {value:?}")]
    InvalidNumber {
        /// Verb of the command whose response was malformed.
        verb: &'static str,
        /// The offending field text.
        value: String,
    },

    /// A job id field was zero; the server numbers jobs from 1.
    #[error("{verb}: job id 0 is not valid")]
    ZeroJobId {
        /// Verb of the command whose response carried the id.
        verb: &'static str,
    },

    /// Fewer body bytes arrived than the header declared.
    #[error("body truncated: declared {declared} bytes, received {received}")]
    TruncatedBody {
        /// Byte count announced in the header.
        declared: usize,
        /// Bytes actually present after the header.
        received: usize,
    },

    /// A stats body was not valid UTF-8.
    #[error("stats body is not valid UTF-8")]
    StatsEncoding,

    /// A stats line was neither a list element nor a `key: value` pair.
    #[error("malformed stats line {0:?}")]
    MalformedStats(String),

    /// A list reply carried `key: value` pairs.
    #[error("expected a list document, found key/value pairs")]
    ExpectedList,

    /// A stats body mixed list elements with `key: value` pairs.
    #[error("stats body mixes list elements and key/value pairs")]
    MixedStats,
}
