//! # beanstalkd Wire Protocol
//!
//! Purpose: Encode beanstalkd commands, frame and parse replies, map each
//! reply onto its command's typed outcome, and decode stats documents.
//! This crate performs no I/O.
//!
//! ## Design Principles
//! 1. **Explicit Descriptors**: Every verb is described once in [`command`].
//! 2. **Binary-Safe**: Job bodies stay raw bytes end to end.
//! 3. **Fail Fast**: Malformed replies surface as [`ProtoError`]s; server
//!    rejections surface as [`Reply::Rejected`].

pub mod command;
mod error;
pub mod outcome;
pub mod response;
pub mod stats;
pub mod status;

pub use command::{Command, CommandSpec, Shape};
pub use error::{ProtoError, ProtoResult};
pub use outcome::{map_response, Job, Outcome, Reply};
pub use response::{declared_body_len, Response};
pub use stats::{decode_names, decode_stats, Stats, StatsValue};
