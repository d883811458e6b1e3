//! Storage shape for [`MailToken`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MailToken, MailTokenType, TokenValue};
use crate::domain::{Email, MailTokenId, RecordError, UserId};

/// Flat, serialisable representation of a mail token row.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailTokenRecord {
    pub id: Uuid,
    pub email: String,
    pub user_id: Uuid,
    pub token: String,
    pub token_type: MailTokenType,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl fmt::Debug for MailTokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailTokenRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("user_id", &self.user_id)
            .field("token_type", &self.token_type)
            .field("is_used", &self.is_used)
            .field("expires_at", &self.expires_at)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl From<&MailToken> for MailTokenRecord {
    fn from(token: &MailToken) -> Self {
        Self {
            id: *token.id.as_uuid(),
            email: token.email.as_ref().to_owned(),
            user_id: *token.user_id.as_uuid(),
            token: token.token.expose().to_owned(),
            token_type: token.token_type,
            is_used: token.is_used(),
            used_at: token.used_at,
            expires_at: token.expires_at,
            created_at: token.created_at,
            version: token.version,
        }
    }
}

impl TryFrom<MailTokenRecord> for MailToken {
    type Error = RecordError;

    fn try_from(record: MailTokenRecord) -> Result<Self, Self::Error> {
        if record.is_used != record.used_at.is_some() {
            return Err(RecordError::Inconsistent(
                "token usage flag disagrees with usage timestamp",
            ));
        }

        Ok(Self {
            id: MailTokenId::from_uuid(record.id),
            email: Email::new(record.email)
                .map_err(|err| RecordError::invalid_field("email", err))?,
            user_id: UserId::from_uuid(record.user_id),
            token: TokenValue::new(record.token)
                .map_err(|err| RecordError::invalid_field("token", err))?,
            token_type: record.token_type,
            used_at: record.used_at,
            expires_at: record.expires_at,
            created_at: record.created_at,
            version: record.version,
        })
    }
}
