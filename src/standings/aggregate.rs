use super::types::{EventResult, SeasonPointSet, SeasonTotals, SeasonYear};
use crate::error::AuditError;
use std::collections::BTreeMap;

/// Default number of best events counted toward a season total.
pub const DEFAULT_BEST_N: usize = 4;

/// Extract the season from an event date: the first run of four ASCII digits.
///
/// `"2025-03-14"`, `"03/14/2025"` and `"20250314"` all yield 2025.
pub fn extract_season_year(date: &str) -> Option<SeasonYear> {
    date.as_bytes()
        .windows(4)
        .find(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|w| std::str::from_utf8(w).ok())
        .and_then(|s| s.parse().ok())
}

/// Coerce a points-like text field to an integer.
///
/// Accepts integers and decimals (truncated toward zero). Anything else is
/// `None`.
pub fn parse_points(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

/// Explicit points win; otherwise the legacy field is coerced, defaulting to 0.
/// Negative values count as 0.
pub fn resolve_points(result: &EventResult) -> i64 {
    result
        .points
        .or_else(|| result.raw_points.as_deref().and_then(parse_points))
        .unwrap_or(0)
        .max(0)
}

/// Group results into one [`SeasonPointSet`] per (member, season) and total
/// each set's best `best_n` events.
///
/// Results whose date has no four-digit year are dropped, not zero-filled.
pub fn aggregate<'a, I>(results: I, best_n: usize) -> Result<SeasonTotals, AuditError>
where
    I: IntoIterator<Item = &'a EventResult>,
{
    if best_n == 0 {
        return Err(AuditError::invalid_config("best_n must be a positive integer"));
    }

    let mut buckets: BTreeMap<_, Vec<i64>> = BTreeMap::new();
    let mut dropped = 0usize;

    for result in results {
        let Some(season) = result.event_date.as_deref().and_then(extract_season_year) else {
            dropped += 1;
            tracing::debug!(
                member = %result.member_id,
                date = result.event_date.as_deref().unwrap_or("<none>"),
                "no season year in event date, result skipped"
            );
            continue;
        };

        buckets
            .entry((result.member_id.clone(), season))
            .or_default()
            .push(resolve_points(result));
    }

    if dropped > 0 {
        tracing::warn!(dropped, "results without a usable event date were excluded");
    }

    let totals = buckets
        .into_iter()
        .map(|((member_id, season_year), mut event_points)| {
            event_points.sort_unstable_by(|a, b| b.cmp(a));
            let best_n_total = event_points
                .iter()
                .take(best_n)
                .fold(0i64, |total, p| total.saturating_add(*p));
            let set = SeasonPointSet {
                member_id: member_id.clone(),
                season_year,
                event_points,
                best_n_total,
            };
            ((member_id, season_year), set)
        })
        .collect();

    Ok(totals)
}
