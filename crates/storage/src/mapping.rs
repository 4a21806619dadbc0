//! JSON codecs shared by the storage backends.
//!
//! The answer payload is the wire format the engine promises its storage
//! collaborator: a single JSON array, one entry per question in original
//! order, each `null` or a one-letter string.

use fold_core::model::{OptionLetter, QuestionOutcome, SessionId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Encode the answer slots into the wire array (`["A",null,...]`).
pub(crate) fn encode_answers(answers: &[Option<OptionLetter>]) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

/// Decode the wire array back into answer slots.
pub(crate) fn decode_answers(payload: &str) -> Result<Vec<Option<OptionLetter>>, StorageError> {
    serde_json::from_str(payload).map_err(ser)
}

/// Encode per-question outcomes for the report detail column.
pub(crate) fn encode_outcomes(outcomes: &[QuestionOutcome]) -> Result<String, StorageError> {
    serde_json::to_string(outcomes).map_err(ser)
}

pub(crate) fn decode_outcomes(detail: &str) -> Result<Vec<QuestionOutcome>, StorageError> {
    serde_json::from_str(detail).map_err(ser)
}

pub(crate) fn session_id_from_str(raw: &str) -> Result<SessionId, StorageError> {
    raw.parse::<SessionId>().map_err(ser)
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_payload_is_the_wire_array() {
        let answers = vec![Some(OptionLetter::A), None, Some(OptionLetter::D)];
        let payload = encode_answers(&answers).unwrap();
        assert_eq!(payload, r#"["A",null,"D"]"#);
        assert_eq!(decode_answers(&payload).unwrap(), answers);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_answers("not json").is_err());
        assert!(decode_answers(r#"["E"]"#).is_err());
    }
}
