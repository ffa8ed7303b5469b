use std::fs;
use std::path::PathBuf;

use reqwest::blocking::Client;

use crate::error::SourceError;
use crate::http_client::fetch_text;
use crate::stats::{StatFamily, StatTable, Tabular};

pub trait StatSource: Send + Sync {
    fn label(&self) -> String;
    fn load(&self) -> Result<StatTable, SourceError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Url(String),
    File(PathBuf),
}

impl Location {
    /// `http(s)://` strings are URLs; everything else is a local path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Location::Url(trimmed.to_string())
        } else {
            Location::File(PathBuf::from(trimmed))
        }
    }
}

pub struct TabularSource {
    family: StatFamily,
    location: Location,
    season: i32,
    client: Client,
}

impl TabularSource {
    pub fn new(family: StatFamily, location: Location, season: i32, client: Client) -> Self {
        Self {
            family,
            location,
            season,
            client,
        }
    }

    fn read_body(&self) -> Result<String, SourceError> {
        match &self.location {
            Location::Url(url) => fetch_text(&self.client, url),
            Location::File(path) => fs::read_to_string(path).map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            }),
        }
    }
}

impl StatSource for TabularSource {
    fn label(&self) -> String {
        match &self.location {
            Location::Url(url) => format!("{} <{url}>", self.family),
            Location::File(path) => format!("{} [{}]", self.family, path.display()),
        }
    }

    fn load(&self) -> Result<StatTable, SourceError> {
        let body = self.read_body()?;
        let grid = Tabular::sniff(&body)?;
        StatTable::from_tabular(self.family, &grid, self.season)
    }
}
