use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Feedback as submitted. Name and message are required; the email is
/// informational only and is kept exactly as given.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl NewFeedback {
    pub fn parse(name: String, email: String, message: String) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Feedback requires a name.".into());
        }
        if message.trim().is_empty() {
            return Err("Feedback requires a message.".into());
        }
        Ok(Self {
            name: name.to_owned(),
            email,
            message,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(feedback: NewFeedback) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: feedback.name,
            email: feedback.email,
            message: feedback.message,
            created_at: Utc::now(),
        }
    }
}
