use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DashError, Result};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Project stage. Variant order is the workflow order, so `Ord` compares
/// stages by progress.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Status {
    #[default]
    Planning,
    Development,
    Testing,
    Deployment,
    Completed,
}

impl Status {
    pub fn all() -> &'static [Status] {
        &[
            Status::Planning,
            Status::Development,
            Status::Testing,
            Status::Deployment,
            Status::Completed,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Status> {
        Status::all().get(self.index() + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Planning => "Planning",
            Status::Development => "Development",
            Status::Testing => "Testing",
            Status::Deployment => "Deployment",
            Status::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = DashError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Status::all()
            .iter()
            .copied()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashError::InvalidStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => f.write_str("You"),
            Sender::Ai => f.write_str("AI"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub sender: Sender,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl Project {
    /// A freshly created project: `Planning`, no chat, no logs.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: Status::Planning,
            chat_history: Vec::new(),
            logs: Vec::new(),
        }
    }
}

/// Trim and check a project name. Empty or whitespace-only names are
/// rejected before anything is persisted.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DashError::Validation("project name is required".into()));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// ProjectPatch
// ---------------------------------------------------------------------------

/// Partial update payload. Supplied fields replace the stored ones wholesale;
/// omitted fields are left alone. A supplied `id` is accepted on the wire
/// and ignored, ids never change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_history: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
}

impl ProjectPatch {
    /// Full-state payload sent by the sync client.
    pub fn snapshot(project: &Project) -> Self {
        Self {
            id: Some(project.id.clone()),
            name: None,
            status: Some(project.status),
            chat_history: Some(project.chat_history.clone()),
            logs: Some(project.logs.clone()),
        }
    }

    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Parse an untyped JSON body. Any shape error, including an unknown
    /// status label, is a validation error rather than a server fault.
    pub fn from_json(mut value: serde_json::Value) -> Result<Self> {
        let Some(fields) = value.as_object_mut() else {
            return Err(DashError::Validation(
                "update body must be a JSON object".into(),
            ));
        };
        if let Some(raw) = fields.get("status").and_then(|s| s.as_str()) {
            let status = raw.parse::<Status>()?;
            fields.insert("status".into(), status.as_str().into());
        }
        serde_json::from_value(value).map_err(|e| DashError::Validation(e.to_string()))
    }

    /// Check field values before any store is touched. Returns the patch
    /// with a trimmed name.
    pub fn validated(mut self) -> Result<Self> {
        if let Some(name) = self.name.take() {
            self.name = Some(validate_name(&name)?);
        }
        Ok(self)
    }

    /// Shallow merge over `project`.
    pub fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(chat) = self.chat_history {
            project.chat_history = chat;
        }
        if let Some(logs) = self.logs {
            project.logs = logs;
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator payloads
// ---------------------------------------------------------------------------

/// One CLI step returned by a decomposition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliCommand {
    pub command: String,
    pub description: String,
}

/// Outcome of a build-verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}
