pub mod client;
pub mod rows;
pub mod snapshot;

pub use client::StoreClient;
pub use rows::{normalize_results, normalize_standings, MalformedRecord, Normalized};

use std::path::PathBuf;

use crate::config::SourceConfig;
use crate::error::{AuditError, Dataset};
use crate::standings::types::{EventResult, MaterializedStanding};
use rows::{ResultRow, StandingRow, RESULT_COLUMNS, STANDING_COLUMNS};

/// Where the two datasets come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// The live table store.
    Remote(SourceConfig),
    /// JSON exports on disk. `standings` is only needed for an audit.
    Snapshot {
        results: PathBuf,
        standings: Option<PathBuf>,
    },
}

impl Source {
    /// Raw results, normalized.
    pub async fn load_results(&self) -> Result<Normalized<EventResult>, AuditError> {
        let rows: Vec<ResultRow> = match self {
            Source::Remote(config) => {
                let client = remote_client(config)?;
                client
                    .fetch_table(&config.results_table, RESULT_COLUMNS)
                    .await
                    .map_err(|e| AuditError::unavailable(Dataset::Results, e))?
            }
            Source::Snapshot { results, .. } => snapshot::read_rows(results)
                .await
                .map_err(|e| AuditError::unavailable(Dataset::Results, e))?,
        };
        Ok(normalize_results(rows))
    }

    /// Materialized standings, normalized.
    pub async fn load_standings(&self) -> Result<Normalized<MaterializedStanding>, AuditError> {
        let rows: Vec<StandingRow> = match self {
            Source::Remote(config) => {
                let client = remote_client(config)?;
                client
                    .fetch_table(&config.standings_table, STANDING_COLUMNS)
                    .await
                    .map_err(|e| AuditError::unavailable(Dataset::Standings, e))?
            }
            Source::Snapshot {
                standings: Some(path),
                ..
            } => snapshot::read_rows(path)
                .await
                .map_err(|e| AuditError::unavailable(Dataset::Standings, e))?,
            Source::Snapshot {
                standings: None, ..
            } => {
                return Err(AuditError::invalid_config(
                    "a standings snapshot is required alongside the results snapshot",
                ))
            }
        };
        Ok(normalize_standings(rows))
    }

    /// Both datasets, fetched concurrently. The first failure aborts the load.
    pub async fn load_all(
        &self,
    ) -> Result<(Normalized<EventResult>, Normalized<MaterializedStanding>), AuditError> {
        tokio::try_join!(self.load_results(), self.load_standings())
    }
}

fn remote_client(config: &SourceConfig) -> Result<StoreClient, AuditError> {
    StoreClient::new(config).map_err(|e| AuditError::invalid_config(format!("{:#}", e)))
}
