//! # Status Outcome Mapping
//!
//! Purpose: Turn a framed [`Response`] into the typed value its command
//! promises, or into a rejection carrying the server's status token.
//!
//! ## Design Principles
//! 1. **Table-Driven**: The [`CommandSpec`] decides both the success token
//!    and how to read the reply; nothing is inferred from the reply itself.
//! 2. **Rejections Are Values**: A mismatched status is [`Reply::Rejected`],
//!    not an error. Only malformed success replies are [`ProtoError`]s.

use bytes::Bytes;

use crate::command::{CommandSpec, Shape};
use crate::error::ProtoResult;
use crate::response::Response;
use crate::stats::{decode_names, decode_stats, Stats};

/// A job handed out by `reserve` or a `peek` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub body: Bytes,
}

/// Typed payload of a successful reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ack,
    Id(u64),
    Count(u64),
    Tube(String),
    Job(Job),
    Stats(Stats),
    List(Vec<String>),
}

/// Result of matching a reply against its command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Success(Outcome),
    /// The server answered with a status other than the expected one.
    Rejected(String),
}

/// Maps `response` onto the outcome described by `spec`.
pub fn map_response(spec: CommandSpec, response: &Response) -> ProtoResult<Reply> {
    if response.status() != spec.success {
        return Ok(Reply::Rejected(response.status().to_string()));
    }

    let verb = spec.verb;
    let outcome = match spec.shape {
        Shape::Ack => Outcome::Ack,
        Shape::Id => Outcome::Id(response.job_id(verb, 0)?),
        Shape::Count => Outcome::Count(response.number(verb, 0)?),
        Shape::Tube => Outcome::Tube(response.field(verb, 0)?.to_string()),
        Shape::Job => {
            let id = response.job_id(verb, 0)?;
            let len = response.number(verb, 1)? as usize;
            Outcome::Job(Job {
                id,
                body: response.body(len)?,
            })
        }
        Shape::Stats => {
            let len = response.number(verb, 0)? as usize;
            Outcome::Stats(decode_stats(&response.body(len)?)?)
        }
        Shape::List => {
            let len = response.number(verb, 0)? as usize;
            Outcome::List(decode_names(&response.body(len)?)?)
        }
        Shape::NoReply => return Ok(Reply::Rejected(response.status().to_string())),
    };
    Ok(Reply::Success(outcome))
}
