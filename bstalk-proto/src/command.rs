//! # Command Encoding
//!
//! Purpose: Turn a protocol primitive into the exact bytes beanstalkd expects,
//! and describe what a successful reply to it looks like.
//!
//! ## Design Principles
//! 1. **Descriptor Table**: Each verb has one [`CommandSpec`] naming its
//!    success status and result [`Shape`]; replies are never inspected to
//!    guess their meaning.
//! 2. **Buffer Reuse**: Callers pass the output buffer so a connection can
//!    encode every command into the same allocation.
//! 3. **Binary-Safe Bodies**: `put` bodies are raw bytes; the announced length
//!    is always taken from the slice itself.
//!
//! ## Wire Format
//!
//! ```text
//! <verb> <arg1> <arg2> ...\r\n
//! put <pri> <delay> <ttr> <bytes>\r\n<body>\r\n
//! ```

use std::io::Write;

use crate::status;

/// Result shape of a successful reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Status only; nothing else to extract.
    Ack,
    /// A freshly assigned job id in the first meta field.
    Id,
    /// An integer count in the first meta field.
    Count,
    /// A tube name in the first meta field.
    Tube,
    /// Job id and body length in the first two meta fields, then the body.
    Job,
    /// A YAML-ish stats document in the body.
    Stats,
    /// A YAML-ish list of names in the body.
    List,
    /// The server closes the connection instead of replying.
    NoReply,
}

/// Static description of one protocol verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Verb as written on the wire.
    pub verb: &'static str,
    /// Status token that signals success.
    pub success: &'static str,
    /// What a successful reply carries.
    pub shape: Shape,
}

impl CommandSpec {
    const fn new(verb: &'static str, success: &'static str, shape: Shape) -> Self {
        CommandSpec {
            verb,
            success,
            shape,
        }
    }
}

pub const PUT: CommandSpec = CommandSpec::new("put", status::INSERTED, Shape::Id);
pub const USE: CommandSpec = CommandSpec::new("use", status::USING, Shape::Tube);
pub const RESERVE: CommandSpec = CommandSpec::new("reserve", status::RESERVED, Shape::Job);
pub const RESERVE_WITH_TIMEOUT: CommandSpec =
    CommandSpec::new("reserve-with-timeout", status::RESERVED, Shape::Job);
pub const DELETE: CommandSpec = CommandSpec::new("delete", status::DELETED, Shape::Ack);
pub const RELEASE: CommandSpec = CommandSpec::new("release", status::RELEASED, Shape::Ack);
pub const BURY: CommandSpec = CommandSpec::new("bury", status::BURIED, Shape::Ack);
pub const TOUCH: CommandSpec = CommandSpec::new("touch", status::TOUCHED, Shape::Ack);
pub const WATCH: CommandSpec = CommandSpec::new("watch", status::WATCHING, Shape::Count);
pub const IGNORE: CommandSpec = CommandSpec::new("ignore", status::WATCHING, Shape::Count);
pub const PEEK: CommandSpec = CommandSpec::new("peek", status::FOUND, Shape::Job);
pub const PEEK_READY: CommandSpec = CommandSpec::new("peek-ready", status::FOUND, Shape::Job);
pub const PEEK_DELAYED: CommandSpec = CommandSpec::new("peek-delayed", status::FOUND, Shape::Job);
pub const PEEK_BURIED: CommandSpec = CommandSpec::new("peek-buried", status::FOUND, Shape::Job);
pub const KICK: CommandSpec = CommandSpec::new("kick", status::KICKED, Shape::Count);
pub const KICK_JOB: CommandSpec = CommandSpec::new("kick-job", status::KICKED, Shape::Ack);
pub const STATS: CommandSpec = CommandSpec::new("stats", status::OK, Shape::Stats);
pub const STATS_JOB: CommandSpec = CommandSpec::new("stats-job", status::OK, Shape::Stats);
pub const STATS_TUBE: CommandSpec = CommandSpec::new("stats-tube", status::OK, Shape::Stats);
pub const LIST_TUBES: CommandSpec = CommandSpec::new("list-tubes", status::OK, Shape::List);
pub const LIST_TUBE_USED: CommandSpec =
    CommandSpec::new("list-tube-used", status::USING, Shape::Tube);
pub const LIST_TUBES_WATCHED: CommandSpec =
    CommandSpec::new("list-tubes-watched", status::OK, Shape::List);
pub const PAUSE_TUBE: CommandSpec = CommandSpec::new("pause-tube", status::PAUSED, Shape::Ack);
pub const QUIT: CommandSpec = CommandSpec::new("quit", "", Shape::NoReply);

/// One protocol primitive with its arguments.
///
/// Delays, TTRs and timeouts are whole seconds as the server expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Put {
        priority: u32,
        delay: u64,
        ttr: u64,
        body: &'a [u8],
    },
    Use(&'a str),
    Reserve,
    ReserveWithTimeout(u64),
    Delete(u64),
    Release {
        id: u64,
        priority: u32,
        delay: u64,
    },
    Bury(u64),
    Touch(u64),
    Watch(&'a str),
    Ignore(&'a str),
    Peek(u64),
    PeekReady,
    PeekDelayed,
    PeekBuried,
    Kick(u64),
    KickJob(u64),
    Stats,
    StatsJob(u64),
    StatsTube(&'a str),
    ListTubes,
    ListTubeUsed,
    ListTubesWatched,
    PauseTube {
        tube: &'a str,
        delay: u64,
    },
    Quit,
}

impl Command<'_> {
    /// Returns the descriptor for this command's verb.
    pub fn spec(&self) -> CommandSpec {
        match self {
            Command::Put { .. } => PUT,
            Command::Use(_) => USE,
            Command::Reserve => RESERVE,
            Command::ReserveWithTimeout(_) => RESERVE_WITH_TIMEOUT,
            Command::Delete(_) => DELETE,
            Command::Release { .. } => RELEASE,
            Command::Bury(_) => BURY,
            Command::Touch(_) => TOUCH,
            Command::Watch(_) => WATCH,
            Command::Ignore(_) => IGNORE,
            Command::Peek(_) => PEEK,
            Command::PeekReady => PEEK_READY,
            Command::PeekDelayed => PEEK_DELAYED,
            Command::PeekBuried => PEEK_BURIED,
            Command::Kick(_) => KICK,
            Command::KickJob(_) => KICK_JOB,
            Command::Stats => STATS,
            Command::StatsJob(_) => STATS_JOB,
            Command::StatsTube(_) => STATS_TUBE,
            Command::ListTubes => LIST_TUBES,
            Command::ListTubeUsed => LIST_TUBE_USED,
            Command::ListTubesWatched => LIST_TUBES_WATCHED,
            Command::PauseTube { .. } => PAUSE_TUBE,
            Command::Quit => QUIT,
        }
    }

    /// Verb as written on the wire.
    pub fn verb(&self) -> &'static str {
        self.spec().verb
    }

    /// Appends the wire encoding of this command to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.verb().as_bytes());
        match *self {
            Command::Put {
                priority,
                delay,
                ttr,
                body,
            } => {
                push_num(out, u64::from(priority));
                push_num(out, delay);
                push_num(out, ttr);
                push_num(out, body.len() as u64);
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(body);
            }
            Command::Use(tube)
            | Command::Watch(tube)
            | Command::Ignore(tube)
            | Command::StatsTube(tube) => push_str(out, tube),
            Command::ReserveWithTimeout(value)
            | Command::Delete(value)
            | Command::Bury(value)
            | Command::Touch(value)
            | Command::Peek(value)
            | Command::Kick(value)
            | Command::KickJob(value)
            | Command::StatsJob(value) => push_num(out, value),
            Command::Release {
                id,
                priority,
                delay,
            } => {
                push_num(out, id);
                push_num(out, u64::from(priority));
                push_num(out, delay);
            }
            Command::PauseTube { tube, delay } => {
                push_str(out, tube);
                push_num(out, delay);
            }
            Command::Reserve
            | Command::PeekReady
            | Command::PeekDelayed
            | Command::PeekBuried
            | Command::Stats
            | Command::ListTubes
            | Command::ListTubeUsed
            | Command::ListTubesWatched
            | Command::Quit => {}
        }
        out.extend_from_slice(b"\r\n");
    }
}

fn push_str(out: &mut Vec<u8>, arg: &str) {
    out.push(b' ');
    out.extend_from_slice(arg.as_bytes());
}

fn push_num(out: &mut Vec<u8>, value: u64) {
    // Writing into a Vec cannot fail.
    let _ = write!(out, " {value}");
}
