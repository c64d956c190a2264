pub mod types;

pub use types::{
    Client, ClientActivity, Interaction, Invoice, Milestone, MilestoneStatus, PaymentEvent,
    ProjectRef, ScoreSubject,
};

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// A project with its milestones, as fetched for one scoring pass.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProjectSnapshot {
    #[serde(flatten)]
    pub subject: ScoreSubject,

    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl ProjectSnapshot {
    /// Parse an untrusted JSON document into a snapshot.
    ///
    /// Structurally wrong input (e.g. `milestones` that is not an array)
    /// fails with [`ScoreError::InvalidInput`] instead of being scored.
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        serde_json::from_str(json).map_err(|e| ScoreError::invalid_input("project", e))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ScoreError> {
        serde_json::from_value(value).map_err(|e| ScoreError::invalid_input("project", e))
    }
}

/// A client with the activity gathered for it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClientSnapshot {
    #[serde(flatten)]
    pub client: Client,

    #[serde(flatten)]
    pub activity: ClientActivity,
}

impl ClientSnapshot {
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        serde_json::from_str(json).map_err(|e| ScoreError::invalid_input("client", e))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ScoreError> {
        serde_json::from_value(value).map_err(|e| ScoreError::invalid_input("client", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_snapshot() {
        let json = r#"{
            "id": "p1",
            "title": "Brand refresh",
            "status": "active",
            "created_at": "2025-01-01T00:00:00Z",
            "last_activity_at": "2025-02-20T09:30:00Z",
            "milestones": [
                {"title": "Discovery", "status": "Done", "order_index": 0},
                {"title": "Design", "status": "In Progress", "order_index": 1}
            ]
        }"#;
        let snapshot = ProjectSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.subject.id, "p1");
        assert_eq!(snapshot.milestones.len(), 2);
        assert!(snapshot.milestones[0].is_done());
        assert!(snapshot.milestones[1].is_in_progress());
        assert!(snapshot.subject.expected_completion_date.is_none());
    }

    #[test]
    fn test_missing_milestones_is_empty() {
        let json = r#"{"id": "p1", "created_at": "2025-01-01T00:00:00Z"}"#;
        let snapshot = ProjectSnapshot::from_json(json).unwrap();
        assert!(snapshot.milestones.is_empty());
    }

    #[test]
    fn test_milestones_not_a_collection_is_invalid_input() {
        let json = r#"{
            "id": "p1",
            "created_at": "2025-01-01T00:00:00Z",
            "milestones": "three of them"
        }"#;
        let err = ProjectSnapshot::from_json(json).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("project"));
    }

    #[test]
    fn test_parse_client_snapshot() {
        let value = serde_json::json!({
            "id": "c1",
            "name": "Acme",
            "created_at": "2024-11-01T00:00:00Z",
            "last_sign_in_at": "2025-02-27T00:00:00Z",
            "invoices": [{"id": "inv-1", "due_date": "2025-02-20T00:00:00Z", "status": "sent"}],
            "recent_payments": [{"id": "pay-1", "updated_at": "2025-02-27T00:00:00Z", "status": "paid"}]
        });
        let snapshot = ClientSnapshot::from_value(value).unwrap();
        assert_eq!(snapshot.client.name, "Acme");
        assert_eq!(snapshot.activity.invoices.len(), 1);
        assert_eq!(snapshot.activity.recent_payments.len(), 1);
        assert!(snapshot.activity.projects.is_empty());
    }

    #[test]
    fn test_client_invoices_wrong_shape_is_invalid_input() {
        let value = serde_json::json!({
            "id": "c1",
            "created_at": "2024-11-01T00:00:00Z",
            "invoices": {"id": "inv-1"}
        });
        let err = ClientSnapshot::from_value(value).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
