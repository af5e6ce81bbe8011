use serde::Deserialize;
use serde_json::Value;

use crate::standings::aggregate::parse_points;
use crate::standings::types::{EventResult, MaterializedStanding, MemberId};

/// Columns requested from the raw results table.
pub const RESULT_COLUMNS: &[&str] = &["member_id", "event_date", "aoy_points", "points"];

/// Columns requested from the materialized standings view.
pub const STANDING_COLUMNS: &[&str] = &["member_id", "season_year", "total_points"];

/// Raw results row as the store returns it. Every field is optional and
/// loosely typed; see [`normalize_results`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultRow {
    #[serde(default)]
    pub member_id: Option<Value>,
    #[serde(default)]
    pub event_date: Option<Value>,
    #[serde(default)]
    pub aoy_points: Option<Value>,
    #[serde(default)]
    pub points: Option<Value>,
}

/// Materialized standings row as the store returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandingRow {
    #[serde(default)]
    pub member_id: Option<Value>,
    #[serde(default)]
    pub season_year: Option<Value>,
    #[serde(default)]
    pub total_points: Option<Value>,
}

/// Why a record was dropped or coerced during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    MissingMemberId,
    UnreadablePoints(String),
    NegativePoints(i64),
    UnreadableSeason(String),
    UnreadableTotal(String),
}

/// Normalized records plus the issues found on the way.
#[derive(Debug, Clone, Default)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub issues: Vec<(usize, MalformedRecord)>,
}

impl<T> Normalized<T> {
    fn issue(&mut self, row: usize, issue: MalformedRecord) {
        tracing::warn!(row, ?issue, "malformed record");
        self.issues.push((row, issue));
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_points(s),
        _ => None,
    }
}

/// Integer value only if exact; fractional numbers are rejected.
fn value_exact_int(value: &Value) -> Option<i64> {
    let f = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(i);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

fn member_id(value: Option<&Value>) -> Option<MemberId> {
    value.and_then(value_text).map(MemberId::new)
}

/// Turn raw result rows into strict [`EventResult`] values.
///
/// `aoy_points` is the explicit value (number or numeric string); `points` is
/// carried as text for the aggregator's fallback. Rows without a member id are
/// dropped. Event dates are passed through untouched; the aggregator decides
/// whether they carry a season.
pub fn normalize_results(rows: Vec<ResultRow>) -> Normalized<EventResult> {
    let mut out = Normalized {
        records: Vec::with_capacity(rows.len()),
        issues: Vec::new(),
    };

    for (idx, row) in rows.into_iter().enumerate() {
        let Some(member_id) = member_id(row.member_id.as_ref()) else {
            out.issue(idx, MalformedRecord::MissingMemberId);
            continue;
        };

        let explicit = row.aoy_points.as_ref().filter(|v| !v.is_null());
        let mut points = explicit.and_then(value_int);
        if let (Some(v), None) = (explicit, points) {
            out.issue(idx, MalformedRecord::UnreadablePoints(v.to_string()));
        }

        let raw_points = row.points.as_ref().and_then(value_text);
        if points.is_none() {
            if let Some(raw) = raw_points.as_deref().filter(|raw| parse_points(raw).is_none()) {
                out.issue(idx, MalformedRecord::UnreadablePoints(raw.to_string()));
            }
        }

        let resolved = points.or_else(|| raw_points.as_deref().and_then(parse_points));
        if let Some(n) = resolved.filter(|n| *n < 0) {
            out.issue(idx, MalformedRecord::NegativePoints(n));
            points = Some(0);
        }

        out.records.push(EventResult {
            member_id,
            event_date: row.event_date.as_ref().and_then(value_text),
            points,
            raw_points,
        });
    }

    out
}

/// Turn raw standings rows into [`MaterializedStanding`] values.
///
/// A null or absent total reads as 0. Rows with no member, an unreadable
/// season, or a non-integer total are dropped.
pub fn normalize_standings(rows: Vec<StandingRow>) -> Normalized<MaterializedStanding> {
    let mut out = Normalized {
        records: Vec::with_capacity(rows.len()),
        issues: Vec::new(),
    };

    for (idx, row) in rows.into_iter().enumerate() {
        let Some(member_id) = member_id(row.member_id.as_ref()) else {
            out.issue(idx, MalformedRecord::MissingMemberId);
            continue;
        };

        let season_year = row
            .season_year
            .as_ref()
            .and_then(value_exact_int)
            .and_then(|y| i32::try_from(y).ok());
        let Some(season_year) = season_year else {
            let raw = row.season_year.map(|v| v.to_string()).unwrap_or_default();
            out.issue(idx, MalformedRecord::UnreadableSeason(raw));
            continue;
        };

        let total_points = match row.total_points {
            None | Some(Value::Null) => 0,
            Some(ref v) => match value_exact_int(v) {
                Some(total) => total,
                None => {
                    out.issue(idx, MalformedRecord::UnreadableTotal(v.to_string()));
                    continue;
                }
            },
        };

        out.records.push(MaterializedStanding {
            member_id,
            season_year,
            total_points,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::aggregate::resolve_points;
    use serde_json::json;

    fn result_rows(value: Value) -> Vec<ResultRow> {
        serde_json::from_value(value).unwrap()
    }

    fn standing_rows(value: Value) -> Vec<StandingRow> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_results_explicit_and_fallback_points() {
        let rows = result_rows(json!([
            { "member_id": "M1", "event_date": "2025-04-12", "aoy_points": 12 },
            { "member_id": "M2", "event_date": "2025-04-12", "points": "12" },
            { "member_id": "M3", "event_date": "2025-04-12", "aoy_points": null, "points": 12 },
            { "member_id": "M4", "event_date": "2025-04-12" },
            { "member_id": "M5", "event_date": "2025-04-12", "aoy_points": "7" }
        ]));

        let normalized = normalize_results(rows);
        let points: Vec<i64> = normalized.records.iter().map(resolve_points).collect();

        assert_eq!(points, vec![12, 12, 12, 0, 7]);
        assert!(normalized.issues.is_empty());
    }

    #[test]
    fn test_results_integer_member_id() {
        let rows = result_rows(json!([
            { "member_id": 42, "event_date": "2025-04-12", "aoy_points": 10 }
        ]));
        let normalized = normalize_results(rows);
        assert_eq!(normalized.records[0].member_id.as_str(), "42");
    }

    #[test]
    fn test_results_missing_member_dropped() {
        let rows = result_rows(json!([
            { "event_date": "2025-04-12", "aoy_points": 10 },
            { "member_id": "  ", "event_date": "2025-04-12", "aoy_points": 10 },
            { "member_id": "M1", "event_date": "2025-04-12", "aoy_points": 10 }
        ]));
        let normalized = normalize_results(rows);

        assert_eq!(normalized.records.len(), 1);
        assert_eq!(
            normalized.issues,
            vec![
                (0, MalformedRecord::MissingMemberId),
                (1, MalformedRecord::MissingMemberId)
            ]
        );
    }

    #[test]
    fn test_results_unreadable_points_coerce_to_zero() {
        let rows = result_rows(json!([
            { "member_id": "M1", "event_date": "2025-04-12", "points": "DNF" }
        ]));
        let normalized = normalize_results(rows);

        assert_eq!(resolve_points(&normalized.records[0]), 0);
        assert_eq!(
            normalized.issues,
            vec![(0, MalformedRecord::UnreadablePoints("DNF".to_string()))]
        );
    }

    #[test]
    fn test_results_negative_points_clamped() {
        let rows = result_rows(json!([
            { "member_id": "M1", "event_date": "2025-04-12", "aoy_points": -5 }
        ]));
        let normalized = normalize_results(rows);

        assert_eq!(normalized.records[0].points, Some(0));
        assert_eq!(normalized.issues, vec![(0, MalformedRecord::NegativePoints(-5))]);
    }

    #[test]
    fn test_results_undated_row_kept_for_aggregator() {
        let rows = result_rows(json!([
            { "member_id": "M1", "event_date": "no-date-here", "aoy_points": 99 },
            { "member_id": "M1", "event_date": null, "aoy_points": 99 }
        ]));
        let normalized = normalize_results(rows);

        assert_eq!(normalized.records.len(), 2);
        assert_eq!(normalized.records[0].event_date.as_deref(), Some("no-date-here"));
        assert_eq!(normalized.records[1].event_date, None);
    }

    #[test]
    fn test_standings_coercion() {
        let rows = standing_rows(json!([
            { "member_id": "M1", "season_year": 2025, "total_points": 340 },
            { "member_id": "M2", "season_year": "2025", "total_points": "95" },
            { "member_id": "M3", "season_year": 2024, "total_points": null },
            { "member_id": "M4", "season_year": 2024, "total_points": 120.0 }
        ]));
        let normalized = normalize_standings(rows);

        assert_eq!(
            normalized.records,
            vec![
                MaterializedStanding::new("M1", 2025, 340),
                MaterializedStanding::new("M2", 2025, 95),
                MaterializedStanding::new("M3", 2024, 0),
                MaterializedStanding::new("M4", 2024, 120),
            ]
        );
        assert!(normalized.issues.is_empty());
    }

    #[test]
    fn test_standings_bad_rows_dropped() {
        let rows = standing_rows(json!([
            { "member_id": "M1", "season_year": "next year", "total_points": 10 },
            { "member_id": "M2", "season_year": 2025, "total_points": "lots" },
            { "member_id": "M3", "season_year": 2025, "total_points": 10.5 },
            { "season_year": 2025, "total_points": 10 }
        ]));
        let normalized = normalize_standings(rows);

        assert!(normalized.records.is_empty());
        assert_eq!(normalized.issues.len(), 4);
        assert!(matches!(
            normalized.issues[0].1,
            MalformedRecord::UnreadableSeason(_)
        ));
        assert!(matches!(
            normalized.issues[2].1,
            MalformedRecord::UnreadableTotal(_)
        ));
    }
}
