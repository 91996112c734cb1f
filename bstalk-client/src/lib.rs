//! # bstalk Client
//!
//! Purpose: Provide a lightweight, blocking beanstalkd client over one
//! persistent connection, with the protocol engine in `bstalk-proto`.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: [`Client`] exposes one method per protocol primitive.
//! 2. **Transport Seam**: I/O goes through the [`Transport`] trait;
//!    [`TcpTransport`] is the default.
//! 3. **Local Tube State**: "use" and "watch" selections are cached in
//!    [`TubeState`] so redundant round trips are skipped.
//! 4. **Explicit Failures**: Every command returns [`ClientResult`];
//!    connectivity failures and server rejections are distinct kinds.
//!
//! ```no_run
//! use bstalk_client::Client;
//!
//! # fn main() -> bstalk_client::ClientResult<()> {
//! let mut client = Client::connect_to("127.0.0.1:11300")?;
//! client.use_tube("emails")?;
//! let id = client.put(b"hello")?;
//! client.watch("emails")?;
//! let job = client.reserve()?;
//! assert_eq!(job.id, id);
//! client.delete(job.id)?;
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod transport;
mod tubes;

pub use bstalk_proto::{Job, Stats, StatsValue};
pub use client::{Client, PutOptions, DEFAULT_PRIORITY, DEFAULT_TTR};
pub use error::{ClientError, ClientResult, LastError};
pub use transport::{ClientConfig, TcpTransport, Transport, DEFAULT_MAX_BODY_LEN};
pub use tubes::{TubeState, DEFAULT_TUBE};
