use super::types::{RankedMember, SeasonTotals, SeasonYear};

/// Most recent season with any recomputed set.
pub fn latest_season(totals: &SeasonTotals) -> Option<SeasonYear> {
    totals.keys().map(|(_, season)| *season).max()
}

/// Leaderboard for one season, best total first.
///
/// Equal totals share a rank and the next rank skips (1, 2, 2, 4). Ties are
/// listed by member id.
pub fn rank_season(totals: &SeasonTotals, season: SeasonYear) -> Vec<RankedMember> {
    let mut sets: Vec<_> = totals
        .values()
        .filter(|set| set.season_year == season)
        .collect();

    sets.sort_by(|a, b| {
        b.best_n_total
            .cmp(&a.best_n_total)
            .then_with(|| a.member_id.cmp(&b.member_id))
    });

    let mut ranked = Vec::with_capacity(sets.len());
    let mut prev_total = None;
    let mut rank = 0;

    for (idx, set) in sets.into_iter().enumerate() {
        if prev_total != Some(set.best_n_total) {
            rank = idx + 1;
            prev_total = Some(set.best_n_total);
        }
        ranked.push(RankedMember {
            rank,
            member_id: set.member_id.clone(),
            season_year: set.season_year,
            best_n_total: set.best_n_total,
            events: set.event_count(),
        });
    }

    ranked
}
