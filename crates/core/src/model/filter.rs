use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::question::Question;

/// Error type for parsing a filter tag from a string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("not a filter tag: {raw}")]
pub struct FilterParseError {
    raw: String,
}

/// Narrows the active question view by fold-step count.
///
/// `All` keeps the entire set; `Steps(n)` keeps the questions whose stem
/// shows exactly `n` fold steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StepFilter {
    #[default]
    All,
    Steps(u8),
}

impl StepFilter {
    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            StepFilter::All => true,
            StepFilter::Steps(steps) => question.step_count() == usize::from(*steps),
        }
    }
}

impl fmt::Display for StepFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFilter::All => write!(f, "all"),
            StepFilter::Steps(steps) => write!(f, "{steps}"),
        }
    }
}

impl FromStr for StepFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(StepFilter::All);
        }
        trimmed
            .parse::<u8>()
            .map(StepFilter::Steps)
            .map_err(|_| FilterParseError {
                raw: trimmed.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        assert_eq!("all".parse::<StepFilter>().unwrap(), StepFilter::All);
        assert_eq!("3".parse::<StepFilter>().unwrap(), StepFilter::Steps(3));
        assert_eq!(StepFilter::Steps(4).to_string(), "4");
        assert!("three".parse::<StepFilter>().is_err());
    }
}
