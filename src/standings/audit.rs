use super::types::{AuditReport, MaterializedStanding, Mismatch, SeasonTotals};
use std::collections::HashSet;

/// Compare each materialized row against the recomputed set for its key.
///
/// Rows without a recomputed counterpart are skipped rather than flagged:
/// an orphaned row cannot be told apart from a legitimately empty season.
pub fn audit<'a, I>(materialized: I, recomputed: &SeasonTotals) -> AuditReport
where
    I: IntoIterator<Item = &'a MaterializedStanding>,
{
    let mut mismatches = Vec::new();
    let mut seen = HashSet::new();
    let mut compared = 0usize;
    let mut orphaned_rows = 0usize;

    for row in materialized {
        let key = row.key();
        let Some(set) = recomputed.get(&key) else {
            orphaned_rows += 1;
            tracing::debug!(
                member = %row.member_id,
                season = row.season_year,
                total = row.total_points,
                "materialized row has no recomputed counterpart, skipped"
            );
            continue;
        };

        compared += 1;
        seen.insert(key);

        if row.total_points != set.best_n_total {
            mismatches.push(Mismatch {
                member_id: row.member_id.clone(),
                season_year: row.season_year,
                materialized_total: row.total_points,
                recomputed_total: set.best_n_total,
                delta: row.total_points.saturating_sub(set.best_n_total),
            });
        }
    }

    let unmaterialized_sets = recomputed.keys().filter(|k| !seen.contains(*k)).count();

    tracing::info!(
        compared,
        mismatched = mismatches.len(),
        orphaned_rows,
        unmaterialized_sets,
        "audit complete"
    );

    AuditReport {
        passed: mismatches.is_empty(),
        mismatches,
        compared,
        orphaned_rows,
        unmaterialized_sets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::aggregate::aggregate;
    use crate::standings::types::{EventResult, MemberId};

    fn recomputed() -> SeasonTotals {
        let mut input: Vec<EventResult> = [100, 90, 80, 70, 10]
            .iter()
            .map(|p| EventResult::new("M1", "2025-04-12", *p))
            .collect();
        input.push(EventResult::new("M2", "2025-04-12", 50));
        input.push(EventResult::new("M2", "2025-07-19", 40));
        aggregate(&input, 4).unwrap()
    }

    #[test]
    fn test_matching_and_mismatching_rows() {
        let materialized = vec![
            MaterializedStanding::new("M1", 2025, 340),
            MaterializedStanding::new("M2", 2025, 95),
        ];

        let report = audit(&materialized, &recomputed());

        assert!(!report.passed);
        assert_eq!(report.compared, 2);
        assert_eq!(
            report.mismatches,
            vec![Mismatch {
                member_id: MemberId::new("M2"),
                season_year: 2025,
                materialized_total: 95,
                recomputed_total: 90,
                delta: 5,
            }]
        );
    }

    #[test]
    fn test_all_rows_agree() {
        let materialized = vec![
            MaterializedStanding::new("M1", 2025, 340),
            MaterializedStanding::new("M2", 2025, 90),
        ];

        let report = audit(&materialized, &recomputed());

        assert!(report.passed);
        assert!(report.mismatches.is_empty());
        assert_eq!(report.unmaterialized_sets, 0);
    }

    #[test]
    fn test_negative_delta_when_view_undercounts() {
        let materialized = vec![MaterializedStanding::new("M1", 2025, 300)];
        let report = audit(&materialized, &recomputed());

        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].delta, -40);
    }

    #[test]
    fn test_orphaned_row_is_skipped() {
        let materialized = vec![
            MaterializedStanding::new("M1", 2025, 340),
            MaterializedStanding::new("M9", 2025, 500),
            MaterializedStanding::new("M1", 2019, 12),
        ];

        let report = audit(&materialized, &recomputed());

        assert!(report.passed);
        assert!(report.mismatches.is_empty());
        assert_eq!(report.compared, 1);
        assert_eq!(report.orphaned_rows, 2);
        assert_eq!(report.unmaterialized_sets, 1);
    }

    #[test]
    fn test_empty_inputs_pass() {
        let report = audit(&Vec::<MaterializedStanding>::new(), &SeasonTotals::new());
        assert!(report.passed);
        assert_eq!(report.compared, 0);
    }

    #[test]
    fn test_mismatches_keep_row_order() {
        let materialized = vec![
            MaterializedStanding::new("M2", 2025, 1),
            MaterializedStanding::new("M1", 2025, 2),
        ];
        let report = audit(&materialized, &recomputed());

        let members: Vec<_> = report
            .mismatches
            .iter()
            .map(|m| m.member_id.as_str())
            .collect();
        assert_eq!(members, vec!["M2", "M1"]);
    }

    #[test]
    fn test_extreme_materialized_total_saturates_delta() {
        let materialized = vec![MaterializedStanding::new("M1", 2025, i64::MIN)];
        let report = audit(&materialized, &recomputed());

        assert!(!report.passed);
        assert_eq!(report.mismatches[0].delta, i64::MIN);
    }
}
