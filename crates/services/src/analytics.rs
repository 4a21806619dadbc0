use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use fold_core::hooks::{Hook, HookBus, SessionEvent};
use fold_core::model::OptionLetter;

/// One recorded answer change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSample {
    pub question_index: usize,
    pub previous: Option<OptionLetter>,
    pub selected: OptionLetter,
}

/// Aggregated session activity as seen through the hook bus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsSummary {
    /// Events observed, per hook.
    pub events: BTreeMap<Hook, usize>,
    /// Answer changes in the order they happened.
    pub selections: Vec<SelectionSample>,
    /// Accuracy of the submitted report, once one exists.
    pub final_accuracy: Option<f64>,
}

impl AnalyticsSummary {
    #[must_use]
    pub fn event_count(&self, hook: Hook) -> usize {
        self.events.get(&hook).copied().unwrap_or(0)
    }

    fn record(&mut self, event: &SessionEvent) {
        *self.events.entry(event.hook()).or_insert(0) += 1;
        match event {
            SessionEvent::AfterAnswerSelect {
                question_index,
                selected,
                ..
            } => {
                let previous = self
                    .selections
                    .iter()
                    .rev()
                    .find(|sample| sample.question_index == *question_index)
                    .map(|sample| sample.selected);
                self.selections.push(SelectionSample {
                    question_index: *question_index,
                    previous,
                    selected: *selected,
                });
            }
            SessionEvent::AfterSubmit { report } => {
                self.final_accuracy = Some(report.accuracy());
            }
            _ => {}
        }
    }
}

/// Reference hook-bus subscriber that aggregates session activity.
///
/// Demonstrates the observer contract: it works purely from event payloads,
/// shares its state behind a mutex, and never touches the session itself.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsObserver {
    inner: Arc<Mutex<AnalyticsSummary>>,
}

impl AnalyticsObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe this observer to every hook on the bus.
    pub fn attach(&self, bus: &mut HookBus) {
        for hook in Hook::ALL {
            let inner = Arc::clone(&self.inner);
            bus.subscribe(hook, move |event| {
                let mut summary = inner
                    .lock()
                    .map_err(|e| format!("analytics state poisoned: {e}"))?;
                summary.record(event);
                Ok(())
            });
        }
    }

    /// A snapshot of everything observed so far.
    #[must_use]
    pub fn summary(&self) -> AnalyticsSummary {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TestSession;
    use fold_core::model::{ImageRef, Question, QuestionId, QuestionSet, StepFilter};
    use fold_core::time::fixed_now;
    use std::collections::BTreeMap;

    fn build_question(position: usize, correct: OptionLetter) -> Question {
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
            vec![ImageRef::parse(&format!("stem_{position}.png")).unwrap()],
            options,
            correct,
        )
        .unwrap()
    }

    fn observed_session() -> (TestSession, AnalyticsObserver) {
        let observer = AnalyticsObserver::new();
        let mut bus = HookBus::new();
        observer.attach(&mut bus);
        let set = QuestionSet::new(vec![
            build_question(0, OptionLetter::A),
            build_question(1, OptionLetter::B),
        ])
        .unwrap();
        (TestSession::new(set, bus, fixed_now()), observer)
    }

    #[test]
    fn observes_the_whole_lifecycle() {
        let (mut session, observer) = observed_session();

        session.display_current().unwrap();
        session.select_option(OptionLetter::A);
        session.select_option(OptionLetter::C);
        session.go_next();
        session.select_option(OptionLetter::B);
        session.apply_filter(StepFilter::All);
        session.submit(fixed_now()).unwrap();

        let summary = observer.summary();
        assert_eq!(summary.event_count(Hook::AfterInit), 1);
        assert_eq!(summary.event_count(Hook::BeforeQuestionDisplay), 1);
        assert_eq!(summary.event_count(Hook::BeforeAnswerSelect), 3);
        assert_eq!(summary.event_count(Hook::AfterAnswerSelect), 3);
        assert_eq!(summary.event_count(Hook::AfterFilterApply), 1);
        assert_eq!(summary.event_count(Hook::BeforeSubmit), 1);
        assert_eq!(summary.event_count(Hook::AfterSubmit), 1);

        // q_1 went A -> C, so the final report has one wrong answer
        assert_eq!(summary.selections.len(), 3);
        assert_eq!(
            summary.selections[1],
            SelectionSample {
                question_index: 0,
                previous: Some(OptionLetter::A),
                selected: OptionLetter::C,
            }
        );
        assert_eq!(summary.final_accuracy, Some(50.0));
    }

    #[test]
    fn summary_is_empty_before_any_activity() {
        let observer = AnalyticsObserver::new();
        let summary = observer.summary();
        assert_eq!(summary.event_count(Hook::AfterInit), 0);
        assert!(summary.selections.is_empty());
        assert_eq!(summary.final_accuracy, None);
    }
}
