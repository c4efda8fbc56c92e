use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "todo" | "open" => Ok(TaskStatus::Pending),
            "completed" | "complete" | "done" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "unknown status '{other}' (expected pending or completed)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "unknown priority '{other}' (expected low, medium or high)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Task {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default, with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "due_date_format::serialize"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Body of `PATCH /tasks/{id}`. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize, Eq, PartialEq)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// `Some(None)` clears the due date; it is sent as `null`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "due_date_format::serialize_change"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn placement(status: TaskStatus, order: i64) -> Self {
        Self {
            status: Some(status),
            order: Some(order),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct TaskPage {
    pub total: u64,
    pub data: Vec<Task>,
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A filter dimension that either selects everything or one value.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Choice<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(expected) => expected == value,
        }
    }
}

impl<T: FromStr<Err = String>> FromStr for Choice<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Choice::All);
        }
        T::from_str(s).map(Choice::Only)
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TaskFilters {
    pub status: Choice<TaskStatus>,
    pub priority: Choice<Priority>,
    pub search: String,
}

/// Accepts `YYYY-MM-DD` or a full ISO datetime, keeping only the date.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn format_due_date(date: Option<NaiveDate>) -> String {
    date.map(|value| value.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

mod due_date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn serialize_change<S>(
        value: &Option<Option<NaiveDate>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize(&value.flatten(), serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => super::parse_due_date(&value)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid due date '{value}'"))),
        }
    }
}

// Older API revisions used integer ids.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Number(value) => Ok(value.to_string()),
        other => Err(D::Error::custom(format!("invalid id: {other}"))),
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(value) => Ok(Some(value)),
        serde_json::Value::Number(value) => Ok(Some(value.to_string())),
        other => Err(D::Error::custom(format!("invalid id: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_status_from_str_accepts_aliases() {
        assert_eq!("pending".parse::<TaskStatus>(), Ok(TaskStatus::Pending));
        assert_eq!("  DONE ".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert_eq!("COMPLETED".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_status_toggled() {
        assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Pending);
    }

    #[test]
    fn test_choice_parses_all_and_values() {
        assert_eq!("all".parse::<Choice<Priority>>(), Ok(Choice::All));
        assert_eq!(
            "high".parse::<Choice<Priority>>(),
            Ok(Choice::Only(Priority::High))
        );
        assert!("urgent".parse::<Choice<Priority>>().is_err());
    }

    #[test]
    fn test_task_deserializes_datetime_due_date_and_numeric_ids() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "title": "Write report",
            "description": null,
            "status": "PENDING",
            "priority": "HIGH",
            "due_date": "2025-03-14T00:00:00",
            "created_at": "2025-03-01T10:00:00",
            "updated_at": "2025-03-01T10:00:00",
            "user_id": 3
        }))
        .expect("task should deserialize");

        assert_eq!(task.id, "7");
        assert_eq!(task.user_id.as_deref(), Some("3"));
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(task.order, 0);
    }

    #[test]
    fn test_task_patch_skips_absent_fields() {
        let patch = TaskPatch::placement(TaskStatus::Completed, 2);
        let value = serde_json::to_value(&patch).expect("patch should serialize");
        assert_eq!(value, json!({ "status": "COMPLETED", "order": 2 }));
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_task_patch_sends_null_for_cleared_due_date() {
        let cleared = TaskPatch {
            due_date: Some(None),
            ..TaskPatch::default()
        };
        let value = serde_json::to_value(&cleared).expect("patch should serialize");
        assert_eq!(value, json!({ "due_date": null }));

        let set = TaskPatch {
            due_date: Some(NaiveDate::from_ymd_opt(2025, 3, 14)),
            ..TaskPatch::default()
        };
        let value = serde_json::to_value(&set).expect("patch should serialize");
        assert_eq!(value, json!({ "due_date": "2025-03-14" }));
    }

    #[test]
    fn test_new_task_serializes_date_only() {
        let new_task = NewTask {
            title: "Buy milk".to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: Priority::Low,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 2),
            order: None,
        };
        let value = serde_json::to_value(&new_task).expect("new task should serialize");
        assert_eq!(
            value,
            json!({
                "title": "Buy milk",
                "status": "PENDING",
                "priority": "LOW",
                "due_date": "2025-01-02"
            })
        );
    }

    #[test]
    fn test_parse_due_date_rejects_garbage() {
        assert_eq!(parse_due_date("2025-02-30"), None);
        assert_eq!(parse_due_date("tomorrow"), None);
        assert_eq!(
            parse_due_date("2025-02-03"),
            NaiveDate::from_ymd_opt(2025, 2, 3)
        );
    }
}
