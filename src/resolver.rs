use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Diagnostic, SourceError};
use crate::snapshot_cache::{CachedSnapshot, SnapshotStore};
use crate::sources::StatSource;
use crate::stats::{StatFamily, StatTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    Cache,
    Live,
    Fallback,
    Empty,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub family: StatFamily,
    pub table: StatTable,
    pub from: ResolvedFrom,
    pub diagnostics: Vec<Diagnostic>,
}

enum State {
    CheckCache,
    LiveFetch,
    Fallback,
    Done(StatTable, ResolvedFrom),
}

/// Cache, then live source, then fallback source, for one statistic family.
/// Never fails: exhausting every source yields an empty table of the right shape.
pub struct Resolver {
    family: StatFamily,
    season: i32,
    store: Option<SnapshotStore>,
    freshness: Duration,
    primary: Option<Box<dyn StatSource>>,
    fallback: Option<Box<dyn StatSource>>,
    offline: bool,
}

impl Resolver {
    pub fn new(family: StatFamily, season: i32) -> Self {
        Self {
            family,
            season,
            store: None,
            freshness: Duration::ZERO,
            primary: None,
            fallback: None,
            offline: false,
        }
    }

    pub fn with_cache(mut self, store: SnapshotStore, freshness: Duration) -> Self {
        self.store = Some(store);
        self.freshness = freshness;
        self
    }

    pub fn with_primary(mut self, source: Box<dyn StatSource>) -> Self {
        self.primary = Some(source);
        self
    }

    pub fn with_fallback(mut self, source: Box<dyn StatSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn family(&self) -> StatFamily {
        self.family
    }

    pub fn resolve(&self) -> Resolution {
        let mut diagnostics = Vec::new();
        let mut state = State::CheckCache;
        loop {
            state = match state {
                State::CheckCache => self.check_cache(),
                State::LiveFetch => self.live_fetch(&mut diagnostics),
                State::Fallback => self.fallback(&mut diagnostics),
                State::Done(table, from) => {
                    info!(family = %self.family, from = ?from, rows = table.len(), "stat family resolved");
                    return Resolution {
                        family: self.family,
                        table,
                        from,
                        diagnostics,
                    };
                }
            };
        }
    }

    fn check_cache(&self) -> State {
        let Some(store) = &self.store else {
            return State::LiveFetch;
        };
        match store.load(self.family, self.freshness, self.season) {
            CachedSnapshot::Fresh(table) => State::Done(table, ResolvedFrom::Cache),
            CachedSnapshot::Stale { age } => {
                debug!(family = %self.family, age_secs = age.as_secs(), "snapshot stale");
                State::LiveFetch
            }
            CachedSnapshot::Missing => State::LiveFetch,
        }
    }

    fn live_fetch(&self, diagnostics: &mut Vec<Diagnostic>) -> State {
        if self.offline {
            debug!(family = %self.family, "offline, skipping live fetch");
            return State::Fallback;
        }
        let Some(source) = &self.primary else {
            return State::Fallback;
        };
        match self.attempt(source.as_ref()) {
            Ok(table) => {
                if let Some(store) = &self.store {
                    if let Err(err) = store.save(&table, self.season) {
                        warn!(family = %self.family, error = %err, "failed to write snapshot");
                    }
                }
                State::Done(table, ResolvedFrom::Live)
            }
            Err(err) => {
                diagnostics.push(Diagnostic::source_unavailable(source.label(), &err));
                State::Fallback
            }
        }
    }

    // Fallback tables are never written to the snapshot.
    fn fallback(&self, diagnostics: &mut Vec<Diagnostic>) -> State {
        let Some(source) = &self.fallback else {
            return State::Done(StatTable::empty(self.family), ResolvedFrom::Empty);
        };
        match self.attempt(source.as_ref()) {
            Ok(table) => State::Done(table, ResolvedFrom::Fallback),
            Err(err) => {
                diagnostics.push(Diagnostic::source_unavailable(source.label(), &err));
                State::Done(StatTable::empty(self.family), ResolvedFrom::Empty)
            }
        }
    }

    fn attempt(&self, source: &dyn StatSource) -> Result<StatTable, SourceError> {
        let table = source.load().inspect_err(|err| {
            warn!(source = %source.label(), error = %err, "stat source unavailable");
        })?;
        if table.family() != self.family {
            return Err(SourceError::Parse(format!(
                "expected {} table, got {}",
                self.family,
                table.family()
            )));
        }
        Ok(table)
    }
}
