//! # Response Framing
//!
//! Purpose: Split one complete server reply into its status token, the
//! positional meta fields that follow it, and the optional body.
//!
//! ## Design Principles
//! 1. **Whole Replies Only**: The parser sees a full reply; reassembling
//!    partial reads is the transport's job (see [`declared_body_len`]).
//! 2. **Zero-Copy Bodies**: The remainder after the header is a [`Bytes`]
//!    slice of the original read.
//! 3. **Fail Fast**: A reply without a CRLF header terminator, or a body
//!    shorter than announced, is a framing error.

use bytes::Bytes;

use crate::error::{ProtoError, ProtoResult};
use crate::status;

const CRLF: &[u8] = b"\r\n";

/// A parsed server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: String,
    meta: Vec<String>,
    rest: Bytes,
}

impl Response {
    /// Parses one complete reply.
    pub fn parse(raw: impl Into<Bytes>) -> ProtoResult<Self> {
        let raw = raw.into();
        let end = find_crlf(&raw).ok_or(ProtoError::MissingCrlf)?;
        let header = String::from_utf8_lossy(&raw[..end]);
        let mut fields = header.split(' ').filter(|field| !field.is_empty());
        let status = fields.next().ok_or(ProtoError::EmptyStatus)?.to_string();
        let meta = fields.map(str::to_string).collect();
        Ok(Response {
            status,
            meta,
            rest: raw.slice(end + CRLF.len()..),
        })
    }

    /// Status token that opened the reply.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Meta fields following the status token, in order.
    pub fn meta(&self) -> &[String] {
        &self.meta
    }

    /// Everything after the header line, terminator included.
    pub fn remainder(&self) -> &Bytes {
        &self.rest
    }

    /// Returns meta field `index`, or a framing error naming `verb`.
    pub fn field(&self, verb: &'static str, index: usize) -> ProtoResult<&str> {
        self.meta
            .get(index)
            .map(String::as_str)
            .ok_or(ProtoError::MissingField { verb, index })
    }

    /// Returns meta field `index` parsed as an unsigned integer.
    pub fn number(&self, verb: &'static str, index: usize) -> ProtoResult<u64> {
        let value = self.field(verb, index)?;
        value.parse().map_err(|_| ProtoError::InvalidNumber {
            verb,
            value: value.to_string(),
        })
    }

    /// Returns meta field `index` as a job id, which must be positive.
    pub fn job_id(&self, verb: &'static str, index: usize) -> ProtoResult<u64> {
        match self.number(verb, index)? {
            0 => Err(ProtoError::ZeroJobId { verb }),
            id => Ok(id),
        }
    }

    /// Returns the first `declared` bytes of the remainder.
    ///
    /// Bytes past `declared` (the body's own CRLF) are dropped.
    pub fn body(&self, declared: usize) -> ProtoResult<Bytes> {
        if self.rest.len() < declared {
            return Err(ProtoError::TruncatedBody {
                declared,
                received: self.rest.len(),
            });
        }
        Ok(self.rest.slice(..declared))
    }
}

/// Inspects a header line and reports how many body bytes follow it.
///
/// Only `RESERVED`, `FOUND` and `OK` replies carry a body; the announced
/// length is their last meta field. The returned count excludes the body's
/// trailing CRLF. `header` may or may not include its own terminator.
pub fn declared_body_len(header: &[u8]) -> Option<usize> {
    let header = match find_crlf(header) {
        Some(end) => &header[..end],
        None => header,
    };
    let header = std::str::from_utf8(header).ok()?;
    let mut fields = header.split(' ').filter(|field| !field.is_empty());
    if !status::carries_body(fields.next()?) {
        return None;
    }
    fields.last()?.parse().ok()
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|window| window == CRLF)
}
