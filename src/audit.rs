/// Audit trail for account events
///
/// Each entry is emitted as one structured `tracing` event on the `audit`
/// target so it can be routed separately from request logs. Entries never
/// carry passwords or tokens.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S>(dt: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ser.serialize_str(&dt.to_rfc3339())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Register,
    Login,
    ForgotPassword,
    ResetPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub log_id: String,
    #[serde(with = "datetime_format")]
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub status: AuditStatus,
    /// User id when known
    pub resource_id: Option<String>,
    pub message: String,
}

impl AuditLog {
    pub fn new(action: AuditAction, status: AuditStatus, message: impl Into<String>) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            status,
            resource_id: None,
            message: message.into(),
        }
    }

    pub fn success(action: AuditAction, message: impl Into<String>) -> Self {
        Self::new(action, AuditStatus::Success, message)
    }

    pub fn failure(action: AuditAction, message: impl Into<String>) -> Self {
        Self::new(action, AuditStatus::Failure, message)
    }

    pub fn with_resource_id(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn record(&self) {
        let entry = serde_json::to_string(self).unwrap_or_default();
        match self.status {
            AuditStatus::Success => tracing::info!(target: "audit", entry = %entry, "audit"),
            AuditStatus::Failure => tracing::warn!(target: "audit", entry = %entry, "audit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_serialization() {
        let log = AuditLog::failure(AuditAction::ForgotPassword, "Unknown email").with_resource_id(42);
        let json = serde_json::to_value(&log).unwrap();

        assert_eq!(json["action"], "FORGOT_PASSWORD");
        assert_eq!(json["status"], "FAILURE");
        assert_eq!(json["resource_id"], "42");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_audit_log_defaults() {
        let log = AuditLog::success(AuditAction::Login, "ok");
        assert!(log.resource_id.is_none());
        assert_eq!(log.status, AuditStatus::Success);
        assert!(!log.log_id.is_empty());
    }
}
