use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::filter::StepFilter;
use crate::model::image::ImageRef;
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has no stem images")]
    EmptyStem { id: QuestionId },

    #[error("question {id} offers no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} marks {letter} correct but offers no such option")]
    CorrectOptionMissing { id: QuestionId, letter: OptionLetter },

    #[error("a question set cannot be empty")]
    EmptySet,
}

//
// ─── OPTION LETTER ─────────────────────────────────────────────────────────────
//

/// One of the four candidate answers presented with every question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    /// Every letter, in presentation order.
    pub const ALL: [OptionLetter; 4] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionLetter::A => "A",
            OptionLetter::B => "B",
            OptionLetter::C => "C",
            OptionLetter::D => "D",
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for parsing an option letter from a string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("not an option letter: {raw}")]
pub struct ParseLetterError {
    raw: String,
}

impl FromStr for OptionLetter {
    type Err = ParseLetterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(OptionLetter::A),
            "B" | "b" => Ok(OptionLetter::B),
            "C" | "c" => Ok(OptionLetter::C),
            "D" | "d" => Ok(OptionLetter::D),
            other => Err(ParseLetterError {
                raw: other.to_string(),
            }),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single paper-folding question.
///
/// The stem is an ordered sequence of fold-step images; each option letter
/// maps to a candidate result image, exactly one of which is correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    stem_images: Vec<ImageRef>,
    options: BTreeMap<OptionLetter, ImageRef>,
    correct: OptionLetter,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyStem` if no stem images are given,
    /// `QuestionError::NoOptions` if the option mapping is empty, and
    /// `QuestionError::CorrectOptionMissing` if the correct letter is not
    /// among the option keys.
    pub fn new(
        id: QuestionId,
        stem_images: Vec<ImageRef>,
        options: BTreeMap<OptionLetter, ImageRef>,
        correct: OptionLetter,
    ) -> Result<Self, QuestionError> {
        if stem_images.is_empty() {
            return Err(QuestionError::EmptyStem { id });
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions { id });
        }
        if !options.contains_key(&correct) {
            return Err(QuestionError::CorrectOptionMissing {
                id,
                letter: correct,
            });
        }

        Ok(Self {
            id,
            stem_images,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn stem_images(&self) -> &[ImageRef] {
        &self.stem_images
    }

    /// Number of fold steps shown in the stem.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.stem_images.len()
    }

    #[must_use]
    pub fn options(&self) -> &BTreeMap<OptionLetter, ImageRef> {
        &self.options
    }

    #[must_use]
    pub fn option(&self, letter: OptionLetter) -> Option<&ImageRef> {
        self.options.get(&letter)
    }

    #[must_use]
    pub fn correct_answer(&self) -> OptionLetter {
        self.correct
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

/// The ordered question collection for one test, immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Wrap a loaded question list.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySet` for an empty list.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::EmptySet);
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Keeps only the first `max` questions (the demo rendition cap).
    ///
    /// A cap of zero is treated as one so the set stays non-empty.
    #[must_use]
    pub fn limited(mut self, max: usize) -> Self {
        self.questions.truncate(max.max(1));
        self
    }

    /// Original indices of the questions matching `filter`, in original order.
    #[must_use]
    pub fn indices_matching(&self, filter: &StepFilter) -> Vec<usize> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, question)| filter.matches(question))
            .map(|(index, _)| index)
            .collect()
    }

    /// Distinct fold-step counts present in the set, ascending.
    #[must_use]
    pub fn step_counts(&self) -> BTreeSet<usize> {
        self.questions
            .iter()
            .map(Question::step_count)
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> ImageRef {
        ImageRef::parse(name).unwrap()
    }

    fn options() -> BTreeMap<OptionLetter, ImageRef> {
        OptionLetter::ALL
            .into_iter()
            .map(|letter| (letter, image(&format!("opt_{letter}.png"))))
            .collect()
    }

    fn build_question(id: u64, steps: usize, correct: OptionLetter) -> Question {
        let stems = (0..steps)
            .map(|step| image(&format!("fold_{id}_{step}.png")))
            .collect();
        Question::new(QuestionId::from_position(id as usize), stems, options(), correct).unwrap()
    }

    #[test]
    fn question_requires_stem_images() {
        let err = Question::new(
            QuestionId::new("q_1"),
            Vec::new(),
            options(),
            OptionLetter::A,
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::EmptyStem { .. }));
    }

    #[test]
    fn question_requires_correct_among_options() {
        let mut opts = options();
        opts.remove(&OptionLetter::D);
        let err = Question::new(
            QuestionId::new("q_1"),
            vec![image("s.png")],
            opts,
            OptionLetter::D,
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::CorrectOptionMissing { .. }));
    }

    #[test]
    fn set_rejects_empty_list() {
        let err = QuestionSet::new(Vec::new()).unwrap_err();
        assert_eq!(err, QuestionError::EmptySet);
    }

    #[test]
    fn indices_matching_preserves_original_order() {
        let set = QuestionSet::new(vec![
            build_question(0, 3, OptionLetter::A),
            build_question(1, 4, OptionLetter::B),
            build_question(2, 3, OptionLetter::C),
        ])
        .unwrap();

        assert_eq!(set.indices_matching(&StepFilter::All), vec![0, 1, 2]);
        assert_eq!(set.indices_matching(&StepFilter::Steps(3)), vec![0, 2]);
        assert!(set.indices_matching(&StepFilter::Steps(5)).is_empty());
    }

    #[test]
    fn limited_caps_but_keeps_one() {
        let set = QuestionSet::new(vec![
            build_question(0, 3, OptionLetter::A),
            build_question(1, 4, OptionLetter::B),
        ])
        .unwrap();
        assert_eq!(set.clone().limited(1).len(), 1);
        assert_eq!(set.limited(0).len(), 1);
    }

    #[test]
    fn letter_parse_is_case_insensitive() {
        assert_eq!("a".parse::<OptionLetter>().unwrap(), OptionLetter::A);
        assert_eq!("D".parse::<OptionLetter>().unwrap(), OptionLetter::D);
        assert!("E".parse::<OptionLetter>().is_err());
    }
}
