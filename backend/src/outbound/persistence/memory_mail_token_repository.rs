//! In-memory `MailTokenRepository`.

use async_trait::async_trait;
use tracing::debug;

use super::table::{Table, WriteConflict, WritePlan, decode, plan_write};
use crate::domain::ports::{MailTokenRepository, MailTokenRepositoryError};
use crate::domain::{Email, MailToken, MailTokenRecord, TokenValue};

/// Mail token store holding [`MailTokenRecord`] rows behind a mutex.
#[derive(Debug, Default)]
pub struct InMemoryMailTokenRepository {
    table: Table<MailTokenRecord>,
}

impl InMemoryMailTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn decode_token(record: MailTokenRecord) -> Result<MailToken, MailTokenRepositoryError> {
    decode(record, MailTokenRepositoryError::query)
}

#[async_trait]
impl MailTokenRepository for InMemoryMailTokenRepository {
    async fn save(&self, token: &MailToken) -> Result<MailToken, MailTokenRepositoryError> {
        let mut rows = self.table.lock(MailTokenRepositoryError::query)?;
        let mut record = MailTokenRecord::from(token);
        let stored = rows.get(&record.id).map(|row| row.version);
        match plan_write(stored, record.version) {
            Ok(WritePlan::Insert) => {}
            Ok(WritePlan::Update { next }) => record.version = next,
            Err(WriteConflict::Missing) => {
                return Err(MailTokenRepositoryError::not_found(token.id().to_string()));
            }
            Err(WriteConflict::Stale { expected, actual }) => {
                return Err(MailTokenRepositoryError::version_mismatch(expected, actual));
            }
        }

        debug!(
            token_id = %token.id(),
            token_type = %token.token_type(),
            version = record.version,
            "mail token written"
        );
        rows.insert(record.id, record.clone());
        decode_token(record)
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Vec<MailToken>, MailTokenRepositoryError> {
        let rows = self.table.lock(MailTokenRepositoryError::query)?;
        let mut matching: Vec<MailTokenRecord> = rows
            .values()
            .filter(|row| row.email == email.as_ref())
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        matching.into_iter().map(decode_token).collect()
    }

    async fn find_by_token(
        &self,
        token: &TokenValue,
    ) -> Result<Option<MailToken>, MailTokenRepositoryError> {
        let rows = self.table.lock(MailTokenRepositoryError::query)?;
        rows.values()
            .find(|row| row.token == token.expose())
            .cloned()
            .map(decode_token)
            .transpose()
    }

    async fn delete_by_token(&self, token: &TokenValue) -> Result<(), MailTokenRepositoryError> {
        let mut rows = self.table.lock(MailTokenRepositoryError::query)?;
        let before = rows.len();
        rows.retain(|_, row| row.token != token.expose());
        debug!(removed = before - rows.len(), "mail tokens deleted");
        Ok(())
    }
}
