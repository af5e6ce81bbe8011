pub mod aggregate;
pub mod audit;
pub mod ranking;
pub mod types;

pub use aggregate::{aggregate, extract_season_year, resolve_points, DEFAULT_BEST_N};
pub use audit::audit;
pub use ranking::{latest_season, rank_season};
pub use types::*;

/// Keep only the given season, when one is set.
pub fn retain_season(totals: &mut SeasonTotals, season: Option<SeasonYear>) {
    if let Some(season) = season {
        totals.retain(|(_, s), _| *s == season);
    }
}
