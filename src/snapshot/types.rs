use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project statuses that take a project out of the active set.
const INACTIVE_PROJECT_STATUSES: &[&str] = &["completed", "archived"];

/// Invoice statuses that never count as overdue.
const SETTLED_INVOICE_STATUSES: &[&str] = &["paid", "void", "draft", "cancelled"];

/// Payment statuses that count as money received.
const SETTLED_PAYMENT_STATUSES: &[&str] = &["paid", "succeeded"];

/// Lowercase and fold spaces and dashes into underscores so that
/// "In Progress", "in-progress" and "in_progress" compare equal.
pub(crate) fn normalize_status(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn status_in(status: &str, set: &[&str]) -> bool {
    let normalized = normalize_status(status);
    set.iter().any(|s| *s == normalized)
}

/// The entity being scored: a project snapshot as read from storage.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScoreSubject {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub status: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub expected_completion_date: Option<DateTime<Utc>>,

    /// Last persisted score, written back by the sync layer.
    #[serde(default)]
    pub health_score: Option<u8>,
}

impl ScoreSubject {
    /// Most recent activity. Falls back to `updated_at`, then to `now`
    /// so a subject without timestamps is never penalized on first read.
    pub fn last_activity(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_activity_at.or(self.updated_at).unwrap_or(now)
    }

    pub fn is_done(&self) -> bool {
        normalize_status(&self.status) == "done"
    }

    /// Active projects are the ones counted in workspace averages.
    pub fn is_active(&self) -> bool {
        !status_in(&self.status, INACTIVE_PROJECT_STATUSES)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum MilestoneStatus {
    InProgress,
    Done,
    Other(String),
}

impl From<String> for MilestoneStatus {
    fn from(s: String) -> Self {
        match normalize_status(&s).as_str() {
            "in_progress" => MilestoneStatus::InProgress,
            "done" => MilestoneStatus::Done,
            _ => MilestoneStatus::Other(s),
        }
    }
}

impl From<&str> for MilestoneStatus {
    fn from(s: &str) -> Self {
        MilestoneStatus::from(s.to_string())
    }
}

impl From<MilestoneStatus> for String {
    fn from(status: MilestoneStatus) -> Self {
        match status {
            MilestoneStatus::InProgress => "in_progress".to_string(),
            MilestoneStatus::Done => "done".to_string(),
            MilestoneStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilestoneStatus::InProgress => f.write_str("in_progress"),
            MilestoneStatus::Done => f.write_str("done"),
            MilestoneStatus::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Milestone {
    #[serde(default)]
    pub title: String,

    pub status: MilestoneStatus,

    /// Display order only.
    #[serde(default)]
    pub order_index: i32,
}

impl Milestone {
    pub fn new(status: impl Into<MilestoneStatus>) -> Self {
        Self {
            title: String::new(),
            status: status.into(),
            order_index: 0,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == MilestoneStatus::InProgress
    }

    pub fn is_done(&self) -> bool {
        self.status == MilestoneStatus::Done
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Invoice {
    pub id: String,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    pub status: String,
}

impl Invoice {
    pub fn is_unpaid(&self) -> bool {
        !status_in(&self.status, SETTLED_INVOICE_STATUSES)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PaymentEvent {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    pub status: String,
}

impl PaymentEvent {
    pub fn is_settled(&self) -> bool {
        status_in(&self.status, SETTLED_PAYMENT_STATUSES)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Interaction {
    #[serde(default)]
    pub id: String,
    pub occurred_at: DateTime<Utc>,
}

/// A project as seen from its client: only its existence matters for scoring.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProjectRef {
    pub id: String,

    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Client {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,

    /// Last persisted client score.
    #[serde(default)]
    pub health_score: Option<u8>,
}

/// Financial and engagement signals gathered for a client.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ClientActivity {
    #[serde(default)]
    pub invoices: Vec<Invoice>,

    #[serde(default)]
    pub projects: Vec<ProjectRef>,

    #[serde(default)]
    pub interactions: Vec<Interaction>,

    #[serde(default)]
    pub recent_payments: Vec<PaymentEvent>,
}

impl ClientActivity {
    /// No invoices, projects or interactions recorded yet.
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty() && self.projects.is_empty() && self.interactions.is_empty()
    }

    pub fn latest_interaction(&self) -> Option<DateTime<Utc>> {
        self.interactions.iter().map(|i| i.occurred_at).max()
    }
}
