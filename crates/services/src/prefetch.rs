use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use reqwest::Client;

use fold_core::model::ImageRef;

use crate::error::LoadError;
use crate::session::TestSession;

/// Images kept warm around the current question, on each side.
pub const DEFAULT_PRELOAD_RANGE: usize = 5;

//
// ─── IMAGE CACHE ───────────────────────────────────────────────────────────────
//

/// Bounded LRU cache for stem and option image bytes, keyed by the image
/// reference string.
///
/// Reads refresh an entry's recency; inserting into a full cache evicts the
/// least-recently-used entry.
#[derive(Debug)]
pub struct ImageCache {
    max_entries: usize,
    entries: HashMap<String, Vec<u8>>,
    access_order: Vec<String>,
}

impl ImageCache {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: HashMap::new(),
            access_order: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Fetch a cached image, refreshing its recency.
    pub fn get(&mut self, key: &str) -> Option<&[u8]> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Insert an image, evicting the least-recently-used entry when full.
    pub fn insert(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_least_used();
        }
        self.entries.insert(key.clone(), bytes);
        self.touch(&key);
    }

    fn touch(&mut self, key: &str) {
        if let Some(index) = self.access_order.iter().position(|entry| entry == key) {
            self.access_order.remove(index);
        }
        self.access_order.push(key.to_string());
    }

    fn evict_least_used(&mut self) {
        if self.access_order.is_empty() {
            return;
        }
        let least_used = self.access_order.remove(0);
        self.entries.remove(&least_used);
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ENTRIES)
    }
}

//
// ─── WINDOW PLANNING ───────────────────────────────────────────────────────────
//

/// Image references worth warming around the session's current position.
///
/// Covers the current question first, then the questions up to `range`
/// positions on each side of it within the filtered view, stems before
/// options, deduplicated in first-seen order.
#[must_use]
pub fn preload_window(session: &TestSession, range: usize) -> Vec<ImageRef> {
    let view = session.view_indices();
    if view.is_empty() {
        return Vec::new();
    }

    let position = session.position().min(view.len() - 1);
    let start = position.saturating_sub(range);
    let end = (position + range + 1).min(view.len());

    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    let mut push = |image: &ImageRef| {
        if seen.insert(image.to_string()) {
            refs.push(image.clone());
        }
    };

    let mut positions: Vec<usize> = Vec::with_capacity(end - start);
    positions.push(position);
    positions.extend((start..end).filter(|p| *p != position));

    for view_position in positions {
        let Some(question) = session.question_set().get(view[view_position]) else {
            continue;
        };
        for image in question.stem_images() {
            push(image);
        }
        for image in question.options().values() {
            push(image);
        }
    }

    refs
}

//
// ─── FETCHER ───────────────────────────────────────────────────────────────────
//

/// Resolves image references to bytes, from disk or over HTTP.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    base_dir: PathBuf,
    client: Client,
}

impl ImageFetcher {
    /// `base_dir` anchors relative file references.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            client: Client::new(),
        }
    }

    /// Fetch one image.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` for I/O failures or non-success HTTP statuses.
    pub async fn fetch(&self, image: &ImageRef) -> Result<Vec<u8>, LoadError> {
        match image {
            ImageRef::FilePath(path) => Ok(std::fs::read(self.base_dir.join(path))?),
            ImageRef::Url(url) => {
                let response = self.client.get(url.clone()).send().await?;
                if !response.status().is_success() {
                    return Err(LoadError::HttpStatus(response.status()));
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }

    /// Warm `cache` with every reference in `refs` that is not already
    /// cached. Failed fetches are logged and skipped; returns how many
    /// images were newly loaded.
    pub async fn warm(&self, cache: &mut ImageCache, refs: &[ImageRef]) -> usize {
        let mut loaded = 0;
        for image in refs {
            let key = image.to_string();
            if cache.contains(&key) {
                continue;
            }
            match self.fetch(image).await {
                Ok(bytes) => {
                    cache.insert(key, bytes);
                    loaded += 1;
                }
                Err(err) => {
                    tracing::warn!(image = %key, error = %err, "failed to prefetch image");
                }
            }
        }
        loaded
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use fold_core::hooks::HookBus;
    use fold_core::model::{OptionLetter, Question, QuestionId, QuestionSet, StepFilter};
    use fold_core::time::fixed_now;
    use std::collections::BTreeMap;

    #[test]
    fn evicts_least_recently_used_entry() {
        let mut cache = ImageCache::new(2);
        cache.insert("a.png", vec![1]);
        cache.insert("b.png", vec![2]);

        // touch a so b becomes the eviction candidate
        assert!(cache.get("a.png").is_some());
        cache.insert("c.png", vec![3]);

        assert!(cache.contains("a.png"));
        assert!(!cache.contains("b.png"));
        assert!(cache.contains("c.png"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinserting_an_existing_key_does_not_evict() {
        let mut cache = ImageCache::new(2);
        cache.insert("a.png", vec![1]);
        cache.insert("b.png", vec![2]);
        cache.insert("a.png", vec![9]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a.png"), Some(&[9_u8][..]));
        assert!(cache.contains("b.png"));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut cache = ImageCache::new(0);
        cache.insert("a.png", vec![1]);
        cache.insert("b.png", vec![2]);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b.png"));
    }

    fn build_question(position: usize, steps: usize) -> Question {
        let stems = (0..steps)
            .map(|step| ImageRef::parse(&format!("fold_{position}_{step}.png")).unwrap())
            .collect();
        let options: BTreeMap<_, _> = OptionLetter::ALL
            .into_iter()
            .map(|letter| {
                (
                    letter,
                    ImageRef::parse(&format!("opt_{position}_{letter}.png")).unwrap(),
                )
            })
            .collect();
        Question::new(
            QuestionId::from_position(position),
            stems,
            options,
            OptionLetter::A,
        )
        .unwrap()
    }

    fn build_session(count: usize) -> TestSession {
        let questions = (0..count).map(|p| build_question(p, 3)).collect();
        TestSession::new(
            QuestionSet::new(questions).unwrap(),
            HookBus::new(),
            fixed_now(),
        )
    }

    #[test]
    fn window_starts_with_the_current_question() {
        let session = build_session(4);
        let refs = preload_window(&session, 1);

        // current question's first stem leads the plan
        assert_eq!(refs[0].to_string(), "fold_0_0.png");
        // 2 questions in the window, 3 stems + 4 options each
        assert_eq!(refs.len(), 14);
    }

    #[test]
    fn window_is_clamped_to_the_view() {
        let mut session = build_session(12);
        for _ in 0..11 {
            session.go_next();
        }
        let refs = preload_window(&session, 5);
        // positions 6..=11 fit, nothing past the end
        assert_eq!(refs.len(), 6 * 7);
    }

    #[test]
    fn empty_filtered_view_plans_nothing() {
        let mut session = build_session(3);
        session.apply_filter(StepFilter::Steps(9));
        assert!(preload_window(&session, 5).is_empty());
    }

    #[tokio::test]
    async fn warm_loads_files_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.png"), b"png-bytes").unwrap();

        let fetcher = ImageFetcher::new(dir.path());
        let mut cache = ImageCache::default();
        let refs = vec![
            ImageRef::parse("present.png").unwrap(),
            ImageRef::parse("missing.png").unwrap(),
        ];

        let loaded = fetcher.warm(&mut cache, &refs).await;

        assert_eq!(loaded, 1);
        assert!(cache.contains("present.png"));
        assert!(!cache.contains("missing.png"));

        // already-cached entries are not fetched again
        let loaded = fetcher.warm(&mut cache, &refs).await;
        assert_eq!(loaded, 0);
    }
}
