use quiz_core::model::{QuizSession, RegistrationId, SessionId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn session_key(id: SessionId) -> String {
    id.value().hyphenated().to_string()
}

pub(crate) fn encode_session(session: &QuizSession) -> Result<String, StorageError> {
    serde_json::to_string(session).map_err(ser)
}

pub(crate) fn decode_session(raw: &str) -> Result<QuizSession, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn registration_id_from_i64(v: i64) -> Result<RegistrationId, StorageError> {
    u64::try_from(v)
        .map(RegistrationId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid registration id: {v}")))
}
