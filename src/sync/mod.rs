//! Fetch, score and persist project health.
//!
//! Storage sits behind [`HealthStore`]. Each project is synced independently;
//! read-score-write is not atomic and concurrent syncs of one project resolve
//! as last write wins, which is fine because scoring is idempotent.

pub mod settings;

pub use settings::{settings_require_resync, validate_settings, WorkspaceSettings};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ScoreError;
use crate::scoring::{score_project, HealthConfig, Thresholds};
use crate::snapshot::ProjectSnapshot;

/// Projects scored at once during a workspace sync when no limit is given.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Storage the sync layer reads snapshots from and writes scores to.
#[allow(async_fn_in_trait)]
pub trait HealthStore {
    async fn workspace_settings(&self, workspace_id: &str) -> Result<WorkspaceSettings, ScoreError>;

    async fn list_projects(&self, workspace_id: &str) -> Result<Vec<String>, ScoreError>;

    /// `Ok(None)` when the project does not exist (e.g. deleted mid-sync).
    async fn load_project(&self, project_id: &str) -> Result<Option<ProjectSnapshot>, ScoreError>;

    async fn save_project_score(&self, project_id: &str, score: u8) -> Result<(), ScoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthAlert {
    pub project_id: String,
    pub project_title: String,
    pub previous: u8,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub project_id: String,
    pub previous: Option<u8>,
    pub score: u8,
    pub alert: Option<HealthAlert>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub outcomes: Vec<SyncOutcome>,
    /// Projects whose sync failed, with the error message.
    pub failures: Vec<(String, String)>,
}

impl SyncReport {
    pub fn alerts(&self) -> impl Iterator<Item = &HealthAlert> {
        self.outcomes.iter().filter_map(|o| o.alert.as_ref())
    }
}

/// A project that was at or above the alert line and is now below it.
/// Projects never scored before count as having been at 100.
pub fn health_dropped(previous: Option<u8>, score: u8, thresholds: &Thresholds) -> bool {
    previous.unwrap_or(100) >= thresholds.alert_drop_score && score < thresholds.alert_drop_score
}

async fn sync_with<S: HealthStore>(
    store: &S,
    project_id: &str,
    config: &HealthConfig,
    settings: &WorkspaceSettings,
    now: DateTime<Utc>,
) -> Result<Option<SyncOutcome>, ScoreError> {
    let Some(snapshot) = store.load_project(project_id).await? else {
        debug!(project_id, "project not found, skipping");
        return Ok(None);
    };

    let result = score_project(&snapshot, config, now);
    for factor in &result.breakdown.factors {
        debug!(
            project_id,
            factor = %factor.label,
            delta = factor.delta(),
            "{}",
            factor.description
        );
    }

    store.save_project_score(project_id, result.score).await?;

    let previous = snapshot.subject.health_score;
    let alert = if settings.notify_on_health_drop
        && health_dropped(previous, result.score, &config.thresholds)
    {
        Some(HealthAlert {
            project_id: project_id.to_string(),
            project_title: snapshot.subject.title.clone(),
            previous: previous.unwrap_or(100),
            score: result.score,
        })
    } else {
        None
    };

    info!(project_id, score = result.score, status = %result.status, "project health updated");

    Ok(Some(SyncOutcome {
        project_id: project_id.to_string(),
        previous,
        score: result.score,
        alert,
    }))
}

/// Recompute and persist one project's score using its workspace settings
/// layered over `base`.
pub async fn sync_project_health<S: HealthStore>(
    store: &S,
    workspace_id: &str,
    project_id: &str,
    base: &HealthConfig,
    now: DateTime<Utc>,
) -> Result<Option<SyncOutcome>, ScoreError> {
    let settings = store.workspace_settings(workspace_id).await?;
    let config = settings.apply(base);
    sync_with(store, project_id, &config, &settings, now).await
}

/// Recompute every project of a workspace, at most `concurrency` at a time.
///
/// A failing project is logged and reported; the others still sync.
pub async fn sync_workspace_health<S: HealthStore>(
    store: &S,
    workspace_id: &str,
    base: &HealthConfig,
    now: DateTime<Utc>,
    concurrency: usize,
) -> Result<SyncReport, ScoreError> {
    let settings = store.workspace_settings(workspace_id).await?;
    let config = settings.apply(base);
    let project_ids = store.list_projects(workspace_id).await?;

    info!(
        workspace_id,
        projects = project_ids.len(),
        "starting workspace health sync"
    );

    let config = &config;
    let settings = &settings;
    let results: Vec<(String, Result<Option<SyncOutcome>, ScoreError>)> =
        stream::iter(project_ids)
            .map(|project_id| async move {
                let result = sync_with(store, &project_id, config, settings, now).await;
                (project_id, result)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    let mut report = SyncReport::default();
    for (project_id, result) in results {
        match result {
            Ok(Some(outcome)) => report.outcomes.push(outcome),
            Ok(None) => {}
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "project health sync failed");
                report.failures.push((project_id, e.to_string()));
            }
        }
    }
    report.outcomes.sort_by(|a, b| a.project_id.cmp(&b.project_id));
    report.failures.sort();

    info!(
        workspace_id,
        updated = report.outcomes.len(),
        failed = report.failures.len(),
        "workspace health sync finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::WeightOverrides;
    use crate::snapshot::{Milestone, ScoreSubject};
    use crate::store::{MemoryStore, WorkspaceData};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn project(id: &str, days_idle: i64, previous: Option<u8>) -> ProjectSnapshot {
        ProjectSnapshot {
            subject: ScoreSubject {
                id: id.to_string(),
                title: format!("Project {}", id),
                status: "active".to_string(),
                created_at: now() - Duration::days(120),
                updated_at: None,
                last_activity_at: Some(now() - Duration::days(days_idle)),
                expected_completion_date: None,
                health_score: previous,
            },
            milestones: vec![],
        }
    }

    fn workspace(projects: Vec<ProjectSnapshot>) -> WorkspaceData {
        WorkspaceData {
            version: 1,
            id: "ws-1".to_string(),
            settings: WorkspaceSettings::default(),
            projects,
            clients: vec![],
        }
    }

    /// Fails every write for one project id.
    struct FailingStore {
        inner: MemoryStore,
        broken: String,
    }

    impl HealthStore for FailingStore {
        async fn workspace_settings(&self, workspace_id: &str) -> Result<WorkspaceSettings, ScoreError> {
            self.inner.workspace_settings(workspace_id).await
        }

        async fn list_projects(&self, workspace_id: &str) -> Result<Vec<String>, ScoreError> {
            self.inner.list_projects(workspace_id).await
        }

        async fn load_project(&self, project_id: &str) -> Result<Option<ProjectSnapshot>, ScoreError> {
            self.inner.load_project(project_id).await
        }

        async fn save_project_score(&self, project_id: &str, score: u8) -> Result<(), ScoreError> {
            if project_id == self.broken {
                return Err(ScoreError::Store("connection reset".to_string()));
            }
            self.inner.save_project_score(project_id, score).await
        }
    }

    #[test]
    fn test_health_dropped() {
        let thresholds = Thresholds::default();
        assert!(health_dropped(Some(50), 49, &thresholds));
        assert!(health_dropped(None, 30, &thresholds));
        assert!(!health_dropped(Some(49), 20, &thresholds));
        assert!(!health_dropped(Some(90), 50, &thresholds));
    }

    #[tokio::test]
    async fn test_sync_project_persists_score() {
        let store = MemoryStore::new(workspace(vec![project("p1", 10, None)]));
        let outcome = sync_project_health(&store, "ws-1", "p1", &HealthConfig::default(), now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.score, 94);
        assert!(outcome.alert.is_none());

        let saved = store.load_project("p1").await.unwrap().unwrap();
        assert_eq!(saved.subject.health_score, Some(94));
    }

    #[tokio::test]
    async fn test_sync_missing_project_is_none() {
        let store = MemoryStore::new(workspace(vec![]));
        let outcome = sync_project_health(&store, "ws-1", "nope", &HealthConfig::default(), now())
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_sync_uses_workspace_settings() {
        let mut data = workspace(vec![project("p1", 10, None)]);
        data.settings.stale_alert_days = Some(14);
        let store = MemoryStore::new(data);
        let outcome = sync_project_health(&store, "ws-1", "p1", &HealthConfig::default(), now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.score, 100);
    }

    #[tokio::test]
    async fn test_sync_raises_drop_alert() {
        // 100 - (40 - 7) * 2 = 34
        let store = MemoryStore::new(workspace(vec![project("p1", 40, Some(70))]));
        let outcome = sync_project_health(&store, "ws-1", "p1", &HealthConfig::default(), now())
            .await
            .unwrap()
            .unwrap();
        let alert = outcome.alert.unwrap();
        assert_eq!(alert.previous, 70);
        assert_eq!(alert.score, 34);
        assert_eq!(alert.project_title, "Project p1");
    }

    #[tokio::test]
    async fn test_sync_alert_respects_notification_setting() {
        let mut data = workspace(vec![project("p1", 40, Some(70))]);
        data.settings.notify_on_health_drop = false;
        let store = MemoryStore::new(data);
        let outcome = sync_project_health(&store, "ws-1", "p1", &HealthConfig::default(), now())
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.alert.is_none());
    }

    #[tokio::test]
    async fn test_no_alert_when_already_below_line() {
        let store = MemoryStore::new(workspace(vec![project("p1", 40, Some(45))]));
        let outcome = sync_project_health(&store, "ws-1", "p1", &HealthConfig::default(), now())
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.alert.is_none());
    }

    #[tokio::test]
    async fn test_workspace_sync_updates_every_project() {
        let projects = (0..10)
            .map(|i| project(&format!("p{:02}", i), i * 2, None))
            .collect();
        let store = MemoryStore::new(workspace(projects));
        let report = sync_workspace_health(&store, "ws-1", &HealthConfig::default(), now(), 3)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 10);
        assert!(report.failures.is_empty());
        assert_eq!(report.outcomes[0].project_id, "p00");

        let data = store.snapshot().unwrap();
        assert!(data.projects.iter().all(|p| p.subject.health_score.is_some()));
        // p09 idle 18 days: 100 - 11 * 2
        let p09 = data.projects.iter().find(|p| p.subject.id == "p09").unwrap();
        assert_eq!(p09.subject.health_score, Some(78));
    }

    #[tokio::test]
    async fn test_workspace_sync_survives_failing_project() {
        let store = FailingStore {
            inner: MemoryStore::new(workspace(vec![
                project("p1", 1, None),
                project("p2", 1, None),
                project("p3", 1, None),
            ])),
            broken: "p2".to_string(),
        };
        let report = sync_workspace_health(&store, "ws-1", &HealthConfig::default(), now(), 2)
            .await
            .unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "p2");
        assert!(report.failures[0].1.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_workspace_sync_unknown_workspace_fails() {
        let store = MemoryStore::new(workspace(vec![]));
        let result =
            sync_workspace_health(&store, "other", &HealthConfig::default(), now(), 2).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_workspace_sync_is_idempotent() {
        let mut data = workspace(vec![project("p1", 12, None), project("p2", 3, None)]);
        data.projects[0].milestones = vec![Milestone::new("in_progress")];
        data.settings.health_weights = Some(WeightOverrides {
            stagnation: Some(20.0),
            ..Default::default()
        });
        let store = MemoryStore::new(data);

        let first = sync_workspace_health(&store, "ws-1", &HealthConfig::default(), now(), 1)
            .await
            .unwrap();
        let second = sync_workspace_health(&store, "ws-1", &HealthConfig::default(), now(), 4)
            .await
            .unwrap();
        let scores = |r: &SyncReport| r.outcomes.iter().map(|o| o.score).collect::<Vec<_>>();
        assert_eq!(scores(&first), scores(&second));
        // 100 - 5 * 2 - 20
        assert_eq!(first.outcomes[0].score, 70);
    }
}
