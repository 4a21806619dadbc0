use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

use fold_core::model::{Question, QuestionError, QuestionSet};

//
// ─── DRAW PLAN ─────────────────────────────────────────────────────────────────
//

/// Balanced draw over a question pool.
///
/// Takes up to `per_step` questions for each requested fold-step count
/// (keeping original order within each group), then shuffles the combined
/// draw. Seed the shuffle for a reproducible paper, or leave it unseeded for
/// a fresh one.
#[derive(Debug, Clone)]
pub struct DrawPlan {
    per_step: usize,
    steps: Vec<usize>,
    seed: Option<u64>,
}

/// Outcome of a draw, with the per-step contribution counts.
#[derive(Debug, Clone)]
pub struct Draw {
    pub questions: Vec<Question>,
    pub picked_per_step: BTreeMap<usize, usize>,
}

impl Draw {
    /// Total number of drawn questions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Turn the draw into a question set for a new session.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySet` when nothing was drawn.
    pub fn into_set(self) -> Result<QuestionSet, QuestionError> {
        QuestionSet::new(self.questions)
    }
}

impl DrawPlan {
    #[must_use]
    pub fn new(per_step: usize) -> Self {
        Self {
            per_step,
            steps: Vec::new(),
            seed: None,
        }
    }

    /// Restrict the draw to the given fold-step counts.
    ///
    /// By default every step count present in the pool contributes.
    #[must_use]
    pub fn with_steps(mut self, steps: impl Into<Vec<usize>>) -> Self {
        self.steps = steps.into();
        self
    }

    /// Fix the shuffle seed for a reproducible draw.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw from `pool` according to this plan.
    #[must_use]
    pub fn draw(&self, pool: &QuestionSet) -> Draw {
        let steps: Vec<usize> = if self.steps.is_empty() {
            pool.step_counts().into_iter().collect()
        } else {
            self.steps.clone()
        };

        let mut questions = Vec::new();
        let mut picked_per_step = BTreeMap::new();
        for step in steps {
            let mut count = 0;
            for question in pool.questions() {
                if count >= self.per_step {
                    break;
                }
                if question.step_count() == step {
                    questions.push(question.clone());
                    count += 1;
                }
            }
            picked_per_step.insert(step, count);
        }

        match self.seed {
            Some(seed) => questions.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => questions.shuffle(&mut rand::rng()),
        }

        Draw {
            questions,
            picked_per_step,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
