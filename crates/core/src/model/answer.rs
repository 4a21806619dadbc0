use thiserror::Error;

use crate::model::question::OptionLetter;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerSheetError {
    #[error("persisted sheet has {actual} entries but the set has {expected} questions")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("question index {index} is out of bounds for {len} questions")]
    OutOfBounds { index: usize, len: usize },
}

/// Per-question answers for one session, one slot per question in original
/// set order.
///
/// Slots are `None` until the user selects an option. Answers are always
/// keyed by a question's index in the original set, never by its position in
/// a filtered view, so switching filters cannot lose or misattribute them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSheet {
    slots: Vec<Option<OptionLetter>>,
}

impl AnswerSheet {
    /// A fresh sheet with every question unanswered.
    #[must_use]
    pub fn new(question_count: usize) -> Self {
        Self {
            slots: vec![None; question_count],
        }
    }

    /// Restore a sheet from persisted slots.
    ///
    /// # Errors
    ///
    /// Returns `AnswerSheetError::LengthMismatch` unless the persisted slots
    /// cover exactly the current question count.
    pub fn from_persisted(
        slots: Vec<Option<OptionLetter>>,
        expected: usize,
    ) -> Result<Self, AnswerSheetError> {
        if slots.len() != expected {
            return Err(AnswerSheetError::LengthMismatch {
                expected,
                actual: slots.len(),
            });
        }
        Ok(Self { slots })
    }

    /// Record an answer, returning the previous one for that slot.
    ///
    /// # Errors
    ///
    /// Returns `AnswerSheetError::OutOfBounds` when `index` does not name a
    /// question.
    pub fn record(
        &mut self,
        index: usize,
        letter: OptionLetter,
    ) -> Result<Option<OptionLetter>, AnswerSheetError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(AnswerSheetError::OutOfBounds { index, len })?;
        Ok(slot.replace(letter))
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<OptionLetter> {
        self.slots.get(index).copied().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of questions with a recorded answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True when every question in the original set has an answer.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Forget every recorded answer.
    pub fn clear_all(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// The raw slots, in original question order.
    #[must_use]
    pub fn slots(&self) -> &[Option<OptionLetter>] {
        &self.slots
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
