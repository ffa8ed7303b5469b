use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::error::SourceError;
use crate::stats::{StatFamily, StatTable, Tabular};

#[derive(Debug)]
pub enum CachedSnapshot {
    Fresh(StatTable),
    Stale { age: Duration },
    Missing,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    // Endpoints are season-templated, so a snapshot only answers for its own season.
    pub fn path_for(&self, family: StatFamily, season: i32) -> PathBuf {
        self.dir.join(format!("{}_{season}.csv", family.key()))
    }

    pub fn load(&self, family: StatFamily, max_age: Duration, season: i32) -> CachedSnapshot {
        self.load_at(family, max_age, season, SystemTime::now())
    }

    pub fn load_at(
        &self,
        family: StatFamily,
        max_age: Duration,
        season: i32,
        now: SystemTime,
    ) -> CachedSnapshot {
        let path = self.path_for(family, season);
        let Ok(meta) = fs::metadata(&path) else {
            return CachedSnapshot::Missing;
        };
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        // A clock that moved backwards makes the file look brand new.
        let age = now.duration_since(modified).unwrap_or_default();
        if age >= max_age {
            return CachedSnapshot::Stale { age };
        }
        let Ok(raw) = fs::read_to_string(&path) else {
            return CachedSnapshot::Missing;
        };
        match Tabular::from_csv(&raw).and_then(|grid| StatTable::from_tabular(family, &grid, season)) {
            Ok(table) => CachedSnapshot::Fresh(table),
            Err(err) => {
                debug!(family = %family, error = %err, "discarding unreadable snapshot");
                CachedSnapshot::Missing
            }
        }
    }

    /// Writes to a sibling temp file, syncs it, then renames over the old
    /// snapshot so readers only ever see a complete file.
    pub fn save(&self, table: &StatTable, season: i32) -> Result<PathBuf, SourceError> {
        let family = table.family();
        let path = self.path_for(family, season);
        fs::create_dir_all(&self.dir).map_err(|source| SourceError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let body = table.to_csv()?;
        let tmp = self
            .dir
            .join(format!(".{}_{season}.{}.tmp", family.key(), std::process::id()));
        let io_err = |source: std::io::Error| SourceError::Io {
            path: tmp.clone(),
            source,
        };
        let mut file = File::create(&tmp).map_err(io_err)?;
        file.write_all(body.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        if let Err(source) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(SourceError::Io { path, source });
        }
        Ok(path)
    }
}
