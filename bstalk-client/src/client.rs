//! # Client API
//!
//! Purpose: Expose one blocking method per beanstalkd primitive over a single
//! persistent connection.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: [`Client`] hides encoding, framing and tube
//!    bookkeeping behind typed methods.
//! 2. **Borrow-Friendly API**: Bodies are `&[u8]` and tube names `&str`; the
//!    encode buffer is reused across commands.
//! 3. **Strict Request/Response**: Every command is one send followed by one
//!    receive. `&mut self` keeps a second caller from interleaving.
//! 4. **Typed Failures**: Rejections come back as [`ClientError::Rejected`]
//!    and are also kept in a one-shot [`LastError`] slot.

use std::time::Duration;

use bstalk_proto::{map_response, status, Command, Job, Outcome, Reply, Response, Stats};

use crate::error::{ClientError, ClientResult, LastError};
use crate::transport::{ClientConfig, TcpTransport, Transport};
use crate::tubes::TubeState;

/// Priority used when the caller does not pick one.
pub const DEFAULT_PRIORITY: u32 = 60;

/// Time-to-run used when the caller does not pick one.
pub const DEFAULT_TTR: Duration = Duration::from_secs(30);

/// Scheduling parameters for `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOptions {
    /// Lower is more urgent.
    pub priority: u32,
    /// Time the job waits in the delayed state before becoming ready.
    pub delay: Duration,
    /// Time a worker may hold the job before it is released again.
    pub ttr: Duration,
}

impl Default for PutOptions {
    fn default() -> Self {
        PutOptions {
            priority: DEFAULT_PRIORITY,
            delay: Duration::ZERO,
            ttr: DEFAULT_TTR,
        }
    }
}

/// Blocking beanstalkd client.
///
/// The client starts unconnected; call [`connect`](Client::connect) before
/// issuing commands. Tube selection is cached locally in a [`TubeState`].
pub struct Client<T = TcpTransport> {
    transport: T,
    tubes: TubeState,
    last_error: Option<LastError>,
    write_buf: Vec<u8>,
}

impl Client<TcpTransport> {
    /// Creates an unconnected client for the configured server.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(TcpTransport::new(config))
    }

    /// Creates a client with default configuration and connects it.
    pub fn connect_to(addr: impl Into<String>) -> ClientResult<Self> {
        let config = ClientConfig {
            addr: addr.into(),
            ..ClientConfig::default()
        };
        let mut client = Self::new(config);
        client.connect()?;
        Ok(client)
    }
}

impl<T: Transport> Client<T> {
    /// Wraps an existing transport. The transport is not connected here.
    pub fn with_transport(transport: T) -> Self {
        Client {
            transport,
            tubes: TubeState::default(),
            last_error: None,
            write_buf: Vec::with_capacity(256),
        }
    }

    /// (Re)connects, closing any live connection first.
    ///
    /// A fresh server session uses and watches `default`, so the local tube
    /// state is reset as well.
    pub fn connect(&mut self) -> ClientResult<()> {
        if self.transport.is_connected() {
            self.transport.close();
        }
        self.transport.connect()?;
        self.tubes.reset();
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Sends `quit` if connected, then closes the transport.
    ///
    /// Delivery of `quit` is best effort; the connection is closed either way.
    pub fn disconnect(&mut self) {
        if self.transport.is_connected() {
            self.write_buf.clear();
            Command::Quit.encode(&mut self.write_buf);
            if let Err(err) = self.transport.send(&self.write_buf) {
                tracing::debug!(error = %err, "quit not delivered");
            }
        }
        self.transport.close();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Locally tracked tube selection.
    pub fn tubes(&self) -> &TubeState {
        &self.tubes
    }

    /// Returns and clears the last server rejection.
    pub fn take_last_error(&mut self) -> Option<LastError> {
        self.last_error.take()
    }

    /// Enqueues a job with default priority, no delay and default TTR.
    /// Returns the new job id.
    pub fn put(&mut self, body: &[u8]) -> ClientResult<u64> {
        self.put_with(body, PutOptions::default())
    }

    /// Enqueues a job into the tube currently in use.
    pub fn put_with(&mut self, body: &[u8], options: PutOptions) -> ClientResult<u64> {
        let command = Command::Put {
            priority: options.priority,
            delay: options.delay.as_secs(),
            ttr: options.ttr.as_secs(),
            body,
        };
        match self.execute(&command)? {
            Outcome::Id(id) => Ok(id),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Selects the tube for subsequent `put`s. No round trip when it is
    /// already in use.
    pub fn use_tube(&mut self, tube: &str) -> ClientResult<()> {
        if self.tubes.is_using(tube) {
            tracing::debug!(tube, "already using tube");
            return Ok(());
        }
        let failed = || format!("use tube {} failed", tube);
        match self.execute_with(&Command::Use(tube), failed)? {
            Outcome::Tube(name) if name == tube => {
                self.tubes.set_using(tube);
                Ok(())
            }
            Outcome::Tube(_) => Err(self.reject(status::USING.to_string(), failed())),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Blocks until a job is ready in a watched tube and reserves it.
    pub fn reserve(&mut self) -> ClientResult<Job> {
        self.job(Command::Reserve)
    }

    /// Like [`reserve`](Self::reserve), giving up after `timeout` (whole
    /// seconds) with a `TIMED_OUT` rejection.
    pub fn reserve_with_timeout(&mut self, timeout: Duration) -> ClientResult<Job> {
        self.job(Command::ReserveWithTimeout(timeout.as_secs()))
    }

    pub fn delete(&mut self, id: u64) -> ClientResult<()> {
        self.ack(Command::Delete(id))
    }

    /// Returns a reserved job to the ready (or delayed) queue.
    pub fn release(&mut self, id: u64, priority: u32, delay: Duration) -> ClientResult<()> {
        self.ack(Command::Release {
            id,
            priority,
            delay: delay.as_secs(),
        })
    }

    pub fn bury(&mut self, id: u64) -> ClientResult<()> {
        self.ack(Command::Bury(id))
    }

    /// Asks for more time to work on a reserved job.
    pub fn touch(&mut self, id: u64) -> ClientResult<()> {
        self.ack(Command::Touch(id))
    }

    /// Adds `tube` to the watch list and returns the number of watched
    /// tubes. No round trip when it is already watched.
    pub fn watch(&mut self, tube: &str) -> ClientResult<u64> {
        if self.tubes.is_watching(tube) {
            tracing::debug!(tube, "already watching tube");
            return Ok(self.tubes.watch_count() as u64);
        }
        let count = self.count(Command::Watch(tube))?;
        self.tubes.add_watch(tube);
        Ok(count)
    }

    /// Removes `tube` from the watch list and returns the number of tubes
    /// still watched.
    ///
    /// Fails locally, without a round trip, when the tube is not watched or
    /// is the only watched tube.
    pub fn ignore(&mut self, tube: &str) -> ClientResult<u64> {
        let index = self.tubes.begin_ignore(tube)?;
        match self.count(Command::Ignore(tube)) {
            Ok(count) => Ok(count),
            Err(err) => {
                self.tubes.abort_ignore(tube, index);
                Err(err)
            }
        }
    }

    pub fn peek(&mut self, id: u64) -> ClientResult<Job> {
        self.job(Command::Peek(id))
    }

    pub fn peek_ready(&mut self) -> ClientResult<Job> {
        self.job(Command::PeekReady)
    }

    pub fn peek_delayed(&mut self) -> ClientResult<Job> {
        self.job(Command::PeekDelayed)
    }

    pub fn peek_buried(&mut self) -> ClientResult<Job> {
        self.job(Command::PeekBuried)
    }

    /// Moves up to `bound` buried (or, if none, delayed) jobs in the used
    /// tube to ready. Returns how many were kicked.
    pub fn kick(&mut self, bound: u64) -> ClientResult<u64> {
        self.count(Command::Kick(bound))
    }

    pub fn kick_job(&mut self, id: u64) -> ClientResult<()> {
        self.ack(Command::KickJob(id))
    }

    /// Server-wide statistics.
    pub fn stats(&mut self) -> ClientResult<Stats> {
        self.stats_of(Command::Stats)
    }

    pub fn stats_job(&mut self, id: u64) -> ClientResult<Stats> {
        self.stats_of(Command::StatsJob(id))
    }

    pub fn stats_tube(&mut self, tube: &str) -> ClientResult<Stats> {
        self.stats_of(Command::StatsTube(tube))
    }

    /// Names of all existing tubes.
    pub fn list_tubes(&mut self) -> ClientResult<Vec<String>> {
        self.names(Command::ListTubes)
    }

    /// Tube in use; asks the server only when `refresh` is set.
    pub fn list_tube_used(&mut self, refresh: bool) -> ClientResult<String> {
        if refresh {
            match self.execute(&Command::ListTubeUsed)? {
                Outcome::Tube(tube) => self.tubes.set_using(&tube),
                _ => return Err(ClientError::UnexpectedResponse),
            }
        }
        Ok(self.tubes.using().to_string())
    }

    /// Watched tubes; asks the server only when `refresh` is set.
    pub fn list_tubes_watched(&mut self, refresh: bool) -> ClientResult<Vec<String>> {
        if refresh {
            let tubes = self.names(Command::ListTubesWatched)?;
            if !self.tubes.replace_watching(tubes) {
                tracing::warn!("server reported an empty watch list");
                return Err(ClientError::UnexpectedResponse);
            }
        }
        Ok(self.tubes.watching().map(str::to_string).collect())
    }

    /// Holds back reservations from `tube` for `delay`.
    pub fn pause_tube(&mut self, tube: &str, delay: Duration) -> ClientResult<()> {
        self.ack(Command::PauseTube {
            tube,
            delay: delay.as_secs(),
        })
    }

    fn ack(&mut self, command: Command<'_>) -> ClientResult<()> {
        match self.execute(&command)? {
            Outcome::Ack => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn count(&mut self, command: Command<'_>) -> ClientResult<u64> {
        match self.execute(&command)? {
            Outcome::Count(count) => Ok(count),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn job(&mut self, command: Command<'_>) -> ClientResult<Job> {
        match self.execute(&command)? {
            Outcome::Job(job) => Ok(job),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn stats_of(&mut self, command: Command<'_>) -> ClientResult<Stats> {
        match self.execute(&command)? {
            Outcome::Stats(stats) => Ok(stats),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn names(&mut self, command: Command<'_>) -> ClientResult<Vec<String>> {
        match self.execute(&command)? {
            Outcome::List(names) => Ok(names),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn execute(&mut self, command: &Command<'_>) -> ClientResult<Outcome> {
        self.execute_with(command, String::new)
    }

    /// Runs one command; a rejection is recorded with `message()` as context.
    fn execute_with(
        &mut self,
        command: &Command<'_>,
        message: impl FnOnce() -> String,
    ) -> ClientResult<Outcome> {
        match self.round_trip(command)? {
            Reply::Success(outcome) => Ok(outcome),
            Reply::Rejected(status) => Err(self.reject(status, message())),
        }
    }

    fn round_trip(&mut self, command: &Command<'_>) -> ClientResult<Reply> {
        if !self.transport.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let verb = command.verb();

        self.write_buf.clear();
        command.encode(&mut self.write_buf);
        tracing::trace!(verb, wire = %String::from_utf8_lossy(&self.write_buf), "send");
        self.transport.send(&self.write_buf)?;

        if !self.transport.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let raw = self.transport.recv()?;
        tracing::trace!(verb, wire = %String::from_utf8_lossy(&raw), "recv");

        let response = Response::parse(raw)?;
        tracing::debug!(verb, status = response.status(), "command complete");
        Ok(map_response(command.spec(), &response)?)
    }

    fn reject(&mut self, status: String, message: String) -> ClientError {
        tracing::debug!(%status, %message, "command rejected");
        let err = LastError { status, message };
        self.last_error = Some(err.clone());
        err.into()
    }
}
