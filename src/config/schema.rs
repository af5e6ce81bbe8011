use serde::{Deserialize, Serialize};

/// Config file contents. Every field is optional; see [`super::resolve_source`]
/// for how the environment fills in the rest.
///
/// Example YAML:
/// ```yaml
/// source:
///   url: https://abcd.supabase.co
///   results_table: tournament_results
///   standings_table: aoy_standings_view
///   page_size: 1000
///   timeout: 30s
/// scoring:
///   best_n: 4
/// report:
///   limit: 20
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub source: SourceSection,

    #[serde(default)]
    pub scoring: ScoringSection,

    #[serde(default)]
    pub report: ReportSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    /// Base URL of the table store
    #[serde(default)]
    pub url: Option<String>,

    /// Service key. Prefer the environment over writing it here.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Raw results table (default: tournament_results)
    #[serde(default)]
    pub results_table: Option<String>,

    /// Materialized standings view (default: aoy_standings_view)
    #[serde(default)]
    pub standings_table: Option<String>,

    /// Rows per request (default: 1000)
    #[serde(default)]
    pub page_size: Option<u64>,

    /// Per-request timeout, humantime format (default: "30s")
    #[serde(default)]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringSection {
    /// Events counted toward a season total (default: 4)
    #[serde(default)]
    pub best_n: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    /// Mismatch rows shown in the table (default: 20)
    #[serde(default)]
    pub limit: Option<usize>,
}
