//! # Tube State
//!
//! Purpose: Mirror the server-side "using" tube and watch list so that
//! redundant `use`/`watch` round trips can be skipped and both can be read
//! without asking the server.
//!
//! ## Invariants
//! - `using` is exactly one tube name.
//! - `watching` is never empty; the server refuses to watch zero tubes.
//!
//! Mutation goes through the methods below; [`Client`](crate::Client) calls
//! them only after the server has confirmed the change (or, for `ignore`,
//! reverts on rejection).

use indexmap::IndexSet;

use crate::error::{ClientError, ClientResult};

/// Tube every new connection starts with.
pub const DEFAULT_TUBE: &str = "default";

/// Client-side view of the connection's tube selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TubeState {
    using: String,
    watching: IndexSet<String>,
}

impl Default for TubeState {
    fn default() -> Self {
        let mut watching = IndexSet::new();
        watching.insert(DEFAULT_TUBE.to_string());
        TubeState {
            using: DEFAULT_TUBE.to_string(),
            watching,
        }
    }
}

impl TubeState {
    /// Tube that `put` writes into.
    pub fn using(&self) -> &str {
        &self.using
    }

    /// Watched tubes in the order they were added.
    pub fn watching(&self) -> impl Iterator<Item = &str> {
        self.watching.iter().map(String::as_str)
    }

    pub fn watch_count(&self) -> usize {
        self.watching.len()
    }

    pub fn is_using(&self, tube: &str) -> bool {
        self.using == tube
    }

    pub fn is_watching(&self, tube: &str) -> bool {
        self.watching.contains(tube)
    }

    pub(crate) fn set_using(&mut self, tube: &str) {
        self.using.clear();
        self.using.push_str(tube);
    }

    /// Adds `tube`; returns false when it was already watched.
    pub(crate) fn add_watch(&mut self, tube: &str) -> bool {
        self.watching.insert(tube.to_string())
    }

    /// Removes `tube` ahead of an `ignore` round trip.
    ///
    /// Fails without touching state when the tube is not watched or is the
    /// only watched tube. Returns the tube's position in the watch list.
    pub(crate) fn begin_ignore(&mut self, tube: &str) -> ClientResult<usize> {
        if !self.watching.contains(tube) {
            return Err(ClientError::NotWatching(tube.to_string()));
        }
        if self.watching.len() == 1 {
            return Err(ClientError::LastWatchedTube(tube.to_string()));
        }
        match self.watching.shift_remove_full(tube) {
            Some((index, _)) => Ok(index),
            None => Err(ClientError::NotWatching(tube.to_string())),
        }
    }

    /// Puts back a tube removed by [`begin_ignore`](Self::begin_ignore) at
    /// its old position.
    pub(crate) fn abort_ignore(&mut self, tube: &str, index: usize) {
        let index = index.min(self.watching.len());
        self.watching.shift_insert(index, tube.to_string());
    }

    /// Replaces the watch list with the server's; an empty list is refused.
    pub(crate) fn replace_watching<I>(&mut self, tubes: I) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        let watching: IndexSet<String> = tubes.into_iter().collect();
        if watching.is_empty() {
            return false;
        }
        self.watching = watching;
        true
    }

    pub(crate) fn reset(&mut self) {
        *self = TubeState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_default_tube() {
        let state = TubeState::default();
        assert_eq!(state.using(), "default");
        assert_eq!(state.watching().collect::<Vec<_>>(), ["default"]);
    }

    #[test]
    fn watch_is_idempotent() {
        let mut state = TubeState::default();
        assert!(state.add_watch("emails"));
        assert!(!state.add_watch("emails"));
        assert_eq!(state.watch_count(), 2);
    }

    #[test]
    fn ignore_guards_last_tube() {
        let mut state = TubeState::default();
        let err = state.begin_ignore("default").unwrap_err();
        assert!(matches!(err, ClientError::LastWatchedTube(tube) if tube == "default"));
        assert!(state.is_watching("default"));
    }

    #[test]
    fn ignore_requires_watched_tube() {
        let mut state = TubeState::default();
        let err = state.begin_ignore("emails").unwrap_err();
        assert!(matches!(err, ClientError::NotWatching(_)));
        assert_eq!(state.watch_count(), 1);
    }

    #[test]
    fn aborted_ignore_restores_tube() {
        let mut state = TubeState::default();
        state.add_watch("emails");
        state.add_watch("reports");
        let index = state.begin_ignore("emails").unwrap();
        assert_eq!(index, 1);
        assert_eq!(state.watching().collect::<Vec<_>>(), ["default", "reports"]);
        state.abort_ignore("emails", index);
        assert_eq!(
            state.watching().collect::<Vec<_>>(),
            ["default", "emails", "reports"]
        );
    }

    #[test]
    fn replace_refuses_empty_list() {
        let mut state = TubeState::default();
        assert!(!state.replace_watching(Vec::new()));
        assert!(state.is_watching("default"));
        assert!(state.replace_watching(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(state.watching().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut state = TubeState::default();
        state.set_using("emails");
        state.add_watch("emails");
        state.reset();
        assert_eq!(state, TubeState::default());
    }
}
