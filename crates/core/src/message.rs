use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, UserId};
use crate::validate::{self, ValidationError};

/// A contact-form message in the owner's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub sender: Option<UserId>,
    pub unread: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
}

impl MessageInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: validate::required_text("name", &self.name, 200)?,
            email: validate::email("email", &self.email)?,
            subject: validate::optional_text("subject", &self.subject, 200)?,
            body: validate::required_text("body", &self.body, 5000)?,
        })
    }
}
