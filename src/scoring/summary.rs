use crate::snapshot::ScoreSubject;

/// Average stored health over active projects.
///
/// Projects without a stored score count as 0. An empty workspace is 100.
pub fn average_health<'a, I>(projects: I) -> u8
where
    I: IntoIterator<Item = &'a ScoreSubject>,
{
    let (sum, count) = projects
        .into_iter()
        .filter(|p| p.is_active())
        .fold((0u32, 0u32), |(sum, count), p| {
            (sum + u32::from(p.health_score.unwrap_or(0)), count + 1)
        });

    if count == 0 {
        100
    } else {
        (f64::from(sum) / f64::from(count)).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn project(status: &str, score: Option<u8>) -> ScoreSubject {
        ScoreSubject {
            id: "p".to_string(),
            title: String::new(),
            status: status.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
            last_activity_at: None,
            expected_completion_date: None,
            health_score: score,
        }
    }

    #[test]
    fn test_empty_is_100() {
        let projects: Vec<ScoreSubject> = vec![];
        assert_eq!(average_health(&projects), 100);
    }

    #[test]
    fn test_skips_inactive_projects() {
        let projects = vec![
            project("active", Some(80)),
            project("active", Some(61)),
            project("archived", Some(0)),
            project("completed", Some(10)),
        ];
        // (80 + 61) / 2 = 70.5 -> 71
        assert_eq!(average_health(&projects), 71);
    }

    #[test]
    fn test_done_projects_still_count() {
        let projects = vec![project("active", Some(80)), project("done", Some(40))];
        assert_eq!(average_health(&projects), 60);
    }

    #[test]
    fn test_missing_score_counts_as_zero() {
        let projects = vec![project("active", Some(90)), project("active", None)];
        assert_eq!(average_health(&projects), 45);
    }

    #[test]
    fn test_only_inactive_projects_is_100() {
        let projects = vec![project("archived", Some(20))];
        assert_eq!(average_health(&projects), 100);
    }
}
