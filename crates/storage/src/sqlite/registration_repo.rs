use quiz_core::model::{Registration, RegistrationId};

use super::SqliteRepository;
use super::mapping::{conn, registration_id_from_i64};
use crate::repository::{RegistrationSink, StorageError};

#[async_trait::async_trait]
impl RegistrationSink for SqliteRepository {
    async fn record(&self, registration: &Registration) -> Result<RegistrationId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO registrations (
                    registered_at, name, phone, experience, company, notice_period
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(registration.registered_at())
        .bind(registration.name())
        .bind(registration.phone())
        .bind(registration.experience())
        .bind(registration.company())
        .bind(registration.notice_period())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        registration_id_from_i64(res.last_insert_rowid())
    }
}
