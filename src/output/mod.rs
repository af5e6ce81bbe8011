pub mod formatter;

pub use formatter::{
    format_delta, format_json_report, format_mismatch_table, format_standings_table,
    format_summary, should_use_colors,
};
