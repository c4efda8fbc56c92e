//! Task, login and registration forms. Each form keeps the raw text the user
//! typed so a failed submit can be shown again unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::api::{ApiError, Transport};
use crate::tasks::TaskService;
use crate::types::{NewTask, Priority, Task, TaskPatch, TaskStatus, parse_due_date};

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

pub const MIN_REGISTER_PASSWORD_LEN: usize = 6;

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(FormErrors),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
}

/// Validated task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFormData {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<chrono::NaiveDate>,
}

impl TaskFormData {
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            order: None,
        }
    }

    pub fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title),
            description: Some(self.description.unwrap_or_default()),
            status: Some(self.status),
            priority: Some(self.priority),
            due_date: Some(self.due_date),
            order: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub due_date: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::create()
    }
}

impl TaskForm {
    pub fn create() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            status: TaskStatus::Pending.as_str().to_string(),
            priority: Priority::Medium.as_str().to_string(),
            due_date: String::new(),
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            due_date: task
                .due_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn validate(&self) -> Result<TaskFormData, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Title is required");
        }

        let status = self
            .status
            .parse::<TaskStatus>()
            .map_err(|message| errors.add("status", message))
            .ok();
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|message| errors.add("priority", message))
            .ok();

        let due_date = if self.due_date.trim().is_empty() {
            None
        } else {
            let parsed = parse_due_date(&self.due_date);
            if parsed.is_none() {
                errors.add("due_date", "Due date must be a valid YYYY-MM-DD date");
            }
            parsed
        };

        let description = Some(self.description.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        match (status, priority) {
            (Some(status), Some(priority)) => errors.into_result(|| TaskFormData {
                title: title.to_string(),
                description,
                status,
                priority,
                due_date,
            }),
            _ => Err(errors),
        }
    }

    /// Creates or updates the task. The form itself is left untouched so the
    /// caller can show it again on failure.
    pub async fn submit<T: Transport>(
        &self,
        service: &TaskService<'_, T>,
    ) -> Result<Task, SubmitError> {
        let data = self.validate().map_err(SubmitError::Invalid)?;
        let task = match &self.id {
            Some(id) => service.update(id, &data.into_patch()).await?,
            None => service.create(&data.into_new_task()).await?,
        };
        Ok(task)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result(|| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }
        check_email(&self.email, &mut errors);
        if self.password.chars().count() < MIN_REGISTER_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {MIN_REGISTER_PASSWORD_LEN} characters"),
            );
        }
        errors.into_result(|| ())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email.trim()))
}

fn check_email(email: &str, errors: &mut FormErrors) {
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.add("email", "Invalid email address");
    }
}
