use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// Opaque bearer token. Debug output is redacted so it never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// Backends hand out either numeric or string user ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(id) => write!(f, "{id}"),
            UserId::Text(id) => f.write_str(id),
        }
    }
}

// The signed-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(
        default,
        alias = "last_login",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login_at: Option<String>,
}

impl Identity {
    /// Last login, falling back to the account creation time.
    pub fn last_seen(&self) -> Option<&str> {
        self.last_login_at
            .as_deref()
            .or(self.created_at.as_deref())
    }
}

// Credential and identity always travel together; a signed-out client holds
// no Session at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: Credential,
    pub identity: Identity,
}

// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

// One transcript entry on the ask page.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
    pub is_error: bool,
}

impl Message {
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

// Server-side file as listed by the upload endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(default)]
    pub upload_date: String,
}

impl UploadedFile {
    pub fn size_label(&self) -> String {
        format_file_size(self.size_bytes)
    }

    /// Calendar date of the upload, or the raw value when it cannot be parsed.
    pub fn upload_day(&self) -> String {
        parse_date(&self.upload_date)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| self.upload_date.clone())
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Some(stamp.date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(stamp.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Human-readable size in base 1024 with at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
