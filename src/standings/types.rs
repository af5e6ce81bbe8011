use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque member identifier, as stored upstream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Four-digit calendar year of an event.
pub type SeasonYear = i32;

/// Aggregation and join key.
pub type SeasonKey = (MemberId, SeasonYear);

/// Recomputed season totals, one entry per key with at least one valid result.
pub type SeasonTotals = BTreeMap<SeasonKey, SeasonPointSet>;

/// One member's result at one tournament event, after field normalization.
///
/// `points` is the explicit point value; `raw_points` is the legacy
/// points-like column kept as text and only consulted when `points` is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventResult {
    pub member_id: MemberId,
    pub event_date: Option<String>,
    pub points: Option<i64>,
    pub raw_points: Option<String>,
}

impl EventResult {
    pub fn new(member_id: impl Into<String>, event_date: impl Into<String>, points: i64) -> Self {
        Self {
            member_id: MemberId::new(member_id),
            event_date: Some(event_date.into()),
            points: Some(points),
            raw_points: None,
        }
    }
}

/// All event points for one member in one season, sorted descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonPointSet {
    pub member_id: MemberId,
    pub season_year: SeasonYear,
    pub event_points: Vec<i64>,
    pub best_n_total: i64,
}

impl SeasonPointSet {
    pub fn key(&self) -> SeasonKey {
        (self.member_id.clone(), self.season_year)
    }

    pub fn event_count(&self) -> usize {
        self.event_points.len()
    }

    /// Sum of every event, counted or not.
    pub fn all_events_total(&self) -> i64 {
        self.event_points
            .iter()
            .fold(0i64, |total, p| total.saturating_add(*p))
    }
}

/// A row of the externally materialized standings view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializedStanding {
    pub member_id: MemberId,
    pub season_year: SeasonYear,
    pub total_points: i64,
}

impl MaterializedStanding {
    pub fn new(member_id: impl Into<String>, season_year: SeasonYear, total_points: i64) -> Self {
        Self {
            member_id: MemberId::new(member_id),
            season_year,
            total_points,
        }
    }

    pub fn key(&self) -> SeasonKey {
        (self.member_id.clone(), self.season_year)
    }
}

/// A materialized total that disagrees with the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub member_id: MemberId,
    pub season_year: SeasonYear,
    pub materialized_total: i64,
    pub recomputed_total: i64,
    /// `materialized_total - recomputed_total`
    pub delta: i64,
}

/// Outcome of comparing materialized standings to recomputed totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Every mismatch, untruncated, in materialized row order.
    pub mismatches: Vec<Mismatch>,
    pub passed: bool,
    /// Materialized rows that had a recomputed counterpart.
    pub compared: usize,
    /// Materialized rows skipped because nothing was recomputed for their key.
    pub orphaned_rows: usize,
    /// Recomputed sets with no materialized row. Informational only.
    pub unmaterialized_sets: usize,
}

/// A member's place on a season leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedMember {
    pub rank: usize,
    pub member_id: MemberId,
    pub season_year: SeasonYear,
    pub best_n_total: i64,
    pub events: usize,
}
