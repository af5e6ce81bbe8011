use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;

use crate::standings::types::{AuditReport, Mismatch, RankedMember, SeasonYear};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Signed delta, always with a sign ("+5", "-40", "0")
pub fn format_delta(delta: i64) -> String {
    if delta > 0 {
        format!("+{}", delta)
    } else {
        delta.to_string()
    }
}

fn member_width<'a>(ids: impl Iterator<Item = &'a str>, header: &str) -> usize {
    ids.map(|id| id.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(header.len())
}

/// Format up to `limit` mismatches as an aligned table.
/// Columns: Member, Season, Materialized, Recomputed, Delta
pub fn format_mismatch_table(mismatches: &[Mismatch], limit: usize, use_colors: bool) -> String {
    if mismatches.is_empty() {
        return "No mismatches.".to_string();
    }

    let shown = &mismatches[..mismatches.len().min(limit)];
    let width = member_width(shown.iter().map(|m| m.member_id.as_str()), "Member");

    let header = format!(
        "{:<width$}  {:>6}  {:>12}  {:>10}  {:>7}",
        "Member",
        "Season",
        "Materialized",
        "Recomputed",
        "Delta",
        width = width
    );

    let mut lines = Vec::with_capacity(shown.len() + 2);
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    for m in shown {
        let delta = format!("{:>7}", format_delta(m.delta));
        let delta = if !use_colors {
            delta
        } else if m.delta > 0 {
            delta.yellow().to_string()
        } else {
            delta.red().to_string()
        };

        lines.push(format!(
            "{:<width$}  {:>6}  {:>12}  {:>10}  {}",
            m.member_id.as_str(),
            m.season_year,
            m.materialized_total,
            m.recomputed_total,
            delta,
            width = width
        ));
    }

    let hidden = mismatches.len() - shown.len();
    if hidden > 0 {
        lines.push(format!("... and {} more", hidden));
    }

    lines.join("\n")
}

/// One-line verdict with counts.
pub fn format_summary(report: &AuditReport, use_colors: bool) -> String {
    let mut extras = Vec::new();
    if report.orphaned_rows > 0 {
        extras.push(format!(
            "{} materialized rows without raw results skipped",
            report.orphaned_rows
        ));
    }
    if report.unmaterialized_sets > 0 {
        extras.push(format!(
            "{} recomputed totals missing from the view",
            report.unmaterialized_sets
        ));
    }
    let extras = if extras.is_empty() {
        String::new()
    } else {
        format!(" ({})", extras.join(", "))
    };

    if report.passed {
        let verdict = if use_colors {
            "PASS".green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        format!(
            "{}: all {} compared standings match{}",
            verdict, report.compared, extras
        )
    } else {
        let verdict = if use_colors {
            "FAIL".red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        format!(
            "{}: {} of {} compared standings differ{}",
            verdict,
            report.mismatches.len(),
            report.compared,
            extras
        )
    }
}

/// Format a season leaderboard.
/// Columns: Rank, Member, Total, Events
pub fn format_standings_table(
    ranked: &[RankedMember],
    season: SeasonYear,
    best_n: usize,
    use_colors: bool,
) -> String {
    let title = format!("{} Angler of the Year (best {} events)", season, best_n);
    let title = if use_colors {
        title.bold().to_string()
    } else {
        title
    };

    if ranked.is_empty() {
        return format!("{}\nNo results for this season.", title);
    }

    let width = member_width(ranked.iter().map(|r| r.member_id.as_str()), "Member");

    let mut lines = vec![
        title,
        format!(
            "{:>4}  {:<width$}  {:>7}  {:>6}",
            "Rank",
            "Member",
            "Total",
            "Events",
            width = width
        ),
    ];

    for r in ranked {
        let rank = format!("{:>3}.", r.rank);
        let rank = if use_colors {
            rank.dimmed().to_string()
        } else {
            rank
        };
        lines.push(format!(
            "{}  {:<width$}  {:>7}  {:>6}",
            rank,
            r.member_id.as_str(),
            r.best_n_total,
            r.events,
            width = width
        ));
    }

    lines.join("\n")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    checked_at: DateTime<Utc>,
    best_n: usize,
    season: Option<SeasonYear>,
    #[serde(flatten)]
    report: &'a AuditReport,
}

/// Full, untruncated report as pretty JSON.
pub fn format_json_report(
    report: &AuditReport,
    best_n: usize,
    season: Option<SeasonYear>,
    checked_at: DateTime<Utc>,
) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        checked_at,
        best_n,
        season,
        report,
    })
    .context("Failed to serialize audit report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::types::MemberId;
    use chrono::TimeZone;

    fn mismatch(member: &str, materialized: i64, recomputed: i64) -> Mismatch {
        Mismatch {
            member_id: MemberId::new(member),
            season_year: 2025,
            materialized_total: materialized,
            recomputed_total: recomputed,
            delta: materialized - recomputed,
        }
    }

    fn report(mismatches: Vec<Mismatch>) -> AuditReport {
        AuditReport {
            passed: mismatches.is_empty(),
            mismatches,
            compared: 12,
            orphaned_rows: 0,
            unmaterialized_sets: 0,
        }
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(5), "+5");
        assert_eq!(format_delta(-40), "-40");
        assert_eq!(format_delta(0), "0");
    }

    #[test]
    fn test_mismatch_table_empty() {
        assert_eq!(format_mismatch_table(&[], 20, false), "No mismatches.");
    }

    #[test]
    fn test_mismatch_table_rows() {
        let table = format_mismatch_table(&[mismatch("M2", 95, 90)], 20, false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Member"));
        assert!(lines[1].starts_with("M2"));
        assert!(lines[1].contains("2025"));
        assert!(lines[1].contains("95"));
        assert!(lines[1].contains("90"));
        assert!(lines[1].ends_with("+5"));
    }

    #[test]
    fn test_mismatch_table_truncates() {
        let mismatches: Vec<_> = (0..25).map(|i| mismatch(&format!("M{}", i), 10, i)).collect();
        let table = format_mismatch_table(&mismatches, 20, false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 22);
        assert_eq!(lines[21], "... and 5 more");
        assert!(!table.contains("M20 "));
    }

    #[test]
    fn test_summary_pass_and_fail() {
        assert_eq!(
            format_summary(&report(vec![]), false),
            "PASS: all 12 compared standings match"
        );
        assert_eq!(
            format_summary(&report(vec![mismatch("M2", 95, 90)]), false),
            "FAIL: 1 of 12 compared standings differ"
        );
    }

    #[test]
    fn test_summary_mentions_skipped_rows() {
        let mut r = report(vec![]);
        r.orphaned_rows = 2;
        r.unmaterialized_sets = 1;
        let summary = format_summary(&r, false);

        assert!(summary.starts_with("PASS"));
        assert!(summary.contains("2 materialized rows without raw results skipped"));
        assert!(summary.contains("1 recomputed totals missing from the view"));
    }

    #[test]
    fn test_standings_table() {
        let ranked = vec![
            RankedMember {
                rank: 1,
                member_id: MemberId::new("ben"),
                season_year: 2025,
                best_n_total: 150,
                events: 3,
            },
            RankedMember {
                rank: 2,
                member_id: MemberId::new("carla"),
                season_year: 2025,
                best_n_total: 120,
                events: 6,
            },
        ];
        let table = format_standings_table(&ranked, 2025, 4, false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "2025 Angler of the Year (best 4 events)");
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("  1.  ben"));
        assert!(lines[3].contains("carla"));
    }

    #[test]
    fn test_standings_table_empty() {
        let table = format_standings_table(&[], 2019, 4, false);
        assert!(table.ends_with("No results for this season."));
    }

    #[test]
    fn test_json_report_is_untruncated() {
        let mismatches: Vec<_> = (0..25).map(|i| mismatch(&format!("M{}", i), 10, i)).collect();
        let checked_at = Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap();

        let json = format_json_report(&report(mismatches), 4, Some(2025), checked_at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["mismatches"].as_array().unwrap().len(), 25);
        assert_eq!(value["passed"], false);
        assert_eq!(value["best_n"], 4);
        assert_eq!(value["season"], 2025);
        assert_eq!(value["mismatches"][0]["member_id"], "M0");
        assert_eq!(value["checked_at"], "2025-11-01T12:00:00Z");
    }
}
