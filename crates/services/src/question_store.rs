use std::collections::BTreeMap;
use std::path::PathBuf;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use fold_core::model::{ImageRef, OptionLetter, Question, QuestionId, QuestionSet};

use crate::error::LoadError;

/// Where the question document lives.
#[derive(Debug, Clone)]
pub enum QuestionSource {
    File(PathBuf),
    Http(Url),
}

/// Loads and validates the question resource.
///
/// Loading is the only asynchronous boundary of the engine: everything after
/// the returned [`QuestionSet`] runs synchronously. A failed load surfaces to
/// the caller unretried.
#[derive(Debug, Clone)]
pub struct QuestionStore {
    source: QuestionSource,
    client: Client,
}

impl QuestionStore {
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: QuestionSource::File(path.into()),
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn from_url(url: Url) -> Self {
        Self {
            source: QuestionSource::Http(url),
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &QuestionSource {
        &self.source
    }

    /// Fetch and validate the question set.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` when the resource is unreachable (I/O or HTTP),
    /// the document is malformed, any question fails validation, or the
    /// question list is empty.
    pub async fn load(&self) -> Result<QuestionSet, LoadError> {
        let bytes = match &self.source {
            QuestionSource::File(path) => std::fs::read(path)?,
            QuestionSource::Http(url) => {
                let response = self.client.get(url.clone()).send().await?;
                if !response.status().is_success() {
                    return Err(LoadError::HttpStatus(response.status()));
                }
                response.bytes().await?.to_vec()
            }
        };
        parse_document(&bytes)
    }
}

/// Parse a raw question document into a validated set.
///
/// The document shape matches the shipped `questions.json`: a `questions`
/// array whose entries carry ordered `stemImages`, an `options` letter map,
/// a `correctAnswer` letter, and an optional explicit `id`.
///
/// # Errors
///
/// Returns `LoadError` for malformed JSON, invalid entries, or an empty list.
pub fn parse_document(bytes: &[u8]) -> Result<QuestionSet, LoadError> {
    let doc: QuestionDocument = serde_json::from_slice(bytes)?;
    if doc.questions.is_empty() {
        return Err(LoadError::Empty);
    }

    let mut questions = Vec::with_capacity(doc.questions.len());
    for (position, raw) in doc.questions.into_iter().enumerate() {
        questions.push(raw.into_question(position)?);
    }
    Ok(QuestionSet::new(questions)?)
}

#[derive(Debug, Deserialize)]
struct QuestionDocument {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    id: Option<String>,
    stem_images: Vec<String>,
    options: BTreeMap<String, String>,
    correct_answer: String,
}

impl RawQuestion {
    fn into_question(self, position: usize) -> Result<Question, LoadError> {
        let id = self
            .id
            .map_or_else(|| QuestionId::from_position(position), QuestionId::new);

        let correct = parse_letter(&id, &self.correct_answer)?;

        let mut options = BTreeMap::new();
        for (letter, image) in &self.options {
            options.insert(parse_letter(&id, letter)?, ImageRef::parse(image)?);
        }

        let mut stems = Vec::with_capacity(self.stem_images.len());
        for raw in &self.stem_images {
            stems.push(ImageRef::parse(raw)?);
        }

        Ok(Question::new(id, stems, options, correct)?)
    }
}

fn parse_letter(id: &QuestionId, raw: &str) -> Result<OptionLetter, LoadError> {
    raw.parse().map_err(|_| LoadError::InvalidLetter {
        id: id.to_string(),
        raw: raw.to_string(),
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
