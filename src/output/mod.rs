pub mod formatter;

pub use formatter::{
    format_age, format_alert, format_breakdown, format_scored_table, format_status, format_tsv,
    should_use_colors, ScoredRow,
};
