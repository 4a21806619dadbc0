use std::fmt;

/// Which rendition of the test the user is taking.
///
/// The demo rendition presents a short prefix of the question set; the full
/// rendition presents everything. Each rendition keeps its answer sheet under
/// its own durable-storage namespace, so switching never clobbers the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QuizVariant {
    Demo,
    #[default]
    Full,
}

impl QuizVariant {
    /// Maximum number of questions this rendition presents.
    #[must_use]
    pub fn question_cap(&self) -> Option<usize> {
        match self {
            QuizVariant::Demo => Some(50),
            QuizVariant::Full => None,
        }
    }

    /// Durable-storage namespace for this rendition's answer sheet.
    #[must_use]
    pub fn storage_namespace(&self) -> &'static str {
        match self {
            QuizVariant::Demo => "paperfolding_answers_demo",
            QuizVariant::Full => "paperfolding_answers_full",
        }
    }
}

impl fmt::Display for QuizVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizVariant::Demo => write!(f, "demo"),
            QuizVariant::Full => write!(f, "full"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_distinct() {
        assert_ne!(
            QuizVariant::Demo.storage_namespace(),
            QuizVariant::Full.storage_namespace()
        );
    }

    #[test]
    fn only_demo_is_capped() {
        assert_eq!(QuizVariant::Demo.question_cap(), Some(50));
        assert_eq!(QuizVariant::Full.question_cap(), None);
    }
}
