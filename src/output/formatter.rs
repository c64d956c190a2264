use chrono::Duration;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scoring::{HealthStatus, ScoreBreakdown};
use crate::sync::HealthAlert;

/// A scored project or client, ready for display
pub struct ScoredRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub score: u8,
    pub status: HealthStatus,
    /// Short trailing note, e.g. "learning" or "idle 12d"
    pub note: Option<String>,
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Status badge, colored green/yellow/red when colors are on
pub fn format_status(status: HealthStatus, use_colors: bool) -> String {
    let label = format!("{:<8}", status.to_string());
    if !use_colors {
        return label;
    }
    match status {
        HealthStatus::Healthy => label.green().to_string(),
        HealthStatus::Warning => label.yellow().to_string(),
        HealthStatus::Critical => label.red().bold().to_string(),
    }
}

/// Format rows as a table with columns: Index, Score, Status, Name, Id, Note
/// No headers (minimal format)
pub fn format_scored_table(rows: &[ScoredRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "Nothing to score.".to_string();
    }

    let term_width = get_terminal_width();

    // Index 3 + space, score 3, status 8, separators
    let index_width = 3;
    let score_width = 3;
    let status_width = 8;
    let separator = "  ";

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_str = format!("{:>width$}", row.score, width = score_width);
            let note = row.note.as_deref().unwrap_or("");

            let fixed_width = index_width
                + 1
                + score_width
                + status_width
                + separator.len() * 4
                + row.id.len()
                + note.len();

            let name = if let Some(width) = term_width {
                if width > fixed_width + 10 {
                    truncate_name(row.name, width - fixed_width)
                } else {
                    truncate_name(row.name, 20)
                }
            } else {
                row.name.to_string()
            };

            let status = format_status(row.status, use_colors);
            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    score_str.bold(),
                    separator,
                    status,
                    separator,
                    name,
                    separator,
                    row.id.dimmed(),
                    separator,
                    note.dimmed()
                )
                .trim_end()
                .to_string()
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    index_str, score_str, separator, status, separator, name, separator, row.id,
                    separator, note
                )
                .trim_end()
                .to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format rows as tab-separated values for scripting
/// Columns: score, status, id, name (no headers, no colors)
pub fn format_tsv(rows: &[ScoredRow]) -> String {
    rows.iter()
        .map(|row| format!("{}\t{}\t{}\t{}", row.score, row.status, row.id, row.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the factors behind a score, one per line (for verbose mode)
pub fn format_breakdown(breakdown: &ScoreBreakdown, use_colors: bool) -> String {
    if breakdown.factors.is_empty() {
        return format!("  base {} (no factors fired)", breakdown.base_score);
    }

    breakdown
        .factors
        .iter()
        .map(|factor| {
            let delta = format!("{:+}", factor.delta());
            let delta = if !use_colors {
                delta
            } else if factor.delta() < 0.0 {
                delta.red().to_string()
            } else {
                delta.green().to_string()
            };
            format!(
                "  {:<28} {:>7}  {} -> {}  ({})",
                factor.label, delta, factor.before, factor.after, factor.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per health-drop alert
pub fn format_alert(alert: &HealthAlert, use_colors: bool) -> String {
    let line = format!(
        "Health alert: {} ({}) dropped {} -> {}",
        alert.project_title, alert.project_id, alert.previous, alert.score
    );
    if use_colors {
        line.red().to_string()
    } else {
        line
    }
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row<'a>(name: &'a str, score: u8, status: HealthStatus) -> ScoredRow<'a> {
        ScoredRow {
            id: "p1",
            name,
            score,
            status,
            note: Some("idle 3d".to_string()),
        }
    }

    #[test]
    fn test_format_table_empty() {
        assert_eq!(format_scored_table(&[], false), "Nothing to score.");
    }

    #[test]
    fn test_format_table_single() {
        let rows = vec![row("Brand refresh", 94, HealthStatus::Healthy)];
        let result = format_scored_table(&rows, false);
        assert!(result.starts_with(" 1.  94"));
        assert!(result.contains("healthy"));
        assert!(result.contains("Brand refresh"));
        assert!(result.contains("p1"));
        assert!(result.ends_with("idle 3d"));
    }

    #[test]
    fn test_format_tsv() {
        let rows = vec![
            row("Brand refresh", 94, HealthStatus::Healthy),
            row("Checkout", 41, HealthStatus::Critical),
        ];
        assert_eq!(
            format_tsv(&rows),
            "94\thealthy\tp1\tBrand refresh\n41\tcritical\tp1\tCheckout"
        );
    }

    #[test]
    fn test_format_breakdown() {
        let mut breakdown = ScoreBreakdown::new(100.0);
        breakdown.push("Inactivity", "10 days since last activity".to_string(), 100.0, 94.0);
        let result = format_breakdown(&breakdown, false);
        assert!(result.contains("Inactivity"));
        assert!(result.contains("-6"));
        assert!(result.contains("100 -> 94"));
    }

    #[test]
    fn test_format_breakdown_empty() {
        let breakdown = ScoreBreakdown::new(100.0);
        assert!(format_breakdown(&breakdown, false).contains("no factors fired"));
    }

    #[test]
    fn test_format_alert() {
        let alert = HealthAlert {
            project_id: "p1".to_string(),
            project_title: "Checkout".to_string(),
            previous: 70,
            score: 34,
        };
        assert_eq!(
            format_alert(&alert, false),
            "Health alert: Checkout (p1) dropped 70 -> 34"
        );
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short", 10), "short");
        assert_eq!(truncate_name("a very long project name", 10), "a very ...");
    }

    #[test]
    fn test_format_age_days() {
        assert_eq!(format_age(Duration::days(2)), "2d");
    }

    #[test]
    fn test_format_age_weeks() {
        assert_eq!(format_age(Duration::weeks(2)), "2w");
    }

    #[test]
    fn test_format_age_now() {
        assert_eq!(format_age(Duration::seconds(30)), "now");
    }
}
