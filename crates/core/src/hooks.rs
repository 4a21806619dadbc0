//! Session lifecycle hooks.
//!
//! The session emits a fixed, closed set of named hooks so collaborators
//! (analytics, plugins) can observe lifecycle transitions without touching
//! session state. Dispatch is synchronous and runs callbacks in registration
//! order; a failing callback is logged and isolated, never aborting the
//! transition it observes.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::{OptionLetter, Question, ScoreReport, StepFilter};

/// The closed set of lifecycle extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hook {
    AfterInit,
    BeforeQuestionDisplay,
    BeforeAnswerSelect,
    AfterAnswerSelect,
    AfterFilterApply,
    BeforeSubmit,
    AfterSubmit,
}

impl Hook {
    /// Every hook, in lifecycle order.
    pub const ALL: [Hook; 7] = [
        Hook::AfterInit,
        Hook::BeforeQuestionDisplay,
        Hook::BeforeAnswerSelect,
        Hook::AfterAnswerSelect,
        Hook::AfterFilterApply,
        Hook::BeforeSubmit,
        Hook::AfterSubmit,
    ];

    /// Wire name of the hook, as used by the original web build.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::AfterInit => "after_init",
            Hook::BeforeQuestionDisplay => "before_question_display",
            Hook::BeforeAnswerSelect => "before_answer_select",
            Hook::AfterAnswerSelect => "after_answer_select",
            Hook::AfterFilterApply => "after_filter_apply",
            Hook::BeforeSubmit => "before_submit",
            Hook::AfterSubmit => "after_submit",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload delivered to hook subscribers.
///
/// Every variant carries an owned snapshot of the relevant state, so a
/// subscriber can never reach back into the live session through its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AfterInit {
        question_count: usize,
    },
    BeforeQuestionDisplay {
        /// Position within the filtered view.
        position: usize,
        /// Index of the question in the original set.
        original_index: usize,
        question: Question,
    },
    BeforeAnswerSelect {
        question_index: usize,
        previous: Option<OptionLetter>,
        candidate: OptionLetter,
    },
    AfterAnswerSelect {
        question_index: usize,
        selected: OptionLetter,
        answered_count: usize,
    },
    AfterFilterApply {
        filter: StepFilter,
        before: usize,
        after: usize,
    },
    BeforeSubmit {
        answered: usize,
        total: usize,
    },
    AfterSubmit {
        report: ScoreReport,
    },
}

impl SessionEvent {
    /// The hook this event fires on.
    #[must_use]
    pub fn hook(&self) -> Hook {
        match self {
            SessionEvent::AfterInit { .. } => Hook::AfterInit,
            SessionEvent::BeforeQuestionDisplay { .. } => Hook::BeforeQuestionDisplay,
            SessionEvent::BeforeAnswerSelect { .. } => Hook::BeforeAnswerSelect,
            SessionEvent::AfterAnswerSelect { .. } => Hook::AfterAnswerSelect,
            SessionEvent::AfterFilterApply { .. } => Hook::AfterFilterApply,
            SessionEvent::BeforeSubmit { .. } => Hook::BeforeSubmit,
            SessionEvent::AfterSubmit { .. } => Hook::AfterSubmit,
        }
    }
}

/// Error a subscriber may surface; the bus logs it and moves on.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

type HookCallback = Box<dyn Fn(&SessionEvent) -> Result<(), ObserverError> + Send>;

/// Synchronous publish/subscribe dispatcher for session lifecycle hooks.
///
/// Callbacks registered for a hook run in registration order, all with the
/// same payload, before `emit` returns. The bus never propagates a callback
/// failure to the emitter.
#[derive(Default)]
pub struct HookBus {
    listeners: BTreeMap<Hook, Vec<HookCallback>>,
}

impl HookBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one hook.
    pub fn subscribe<F>(&mut self, hook: Hook, callback: F)
    where
        F: Fn(&SessionEvent) -> Result<(), ObserverError> + Send + 'static,
    {
        self.listeners
            .entry(hook)
            .or_default()
            .push(Box::new(callback));
    }

    /// Number of callbacks registered for `hook`.
    #[must_use]
    pub fn listener_count(&self, hook: Hook) -> usize {
        self.listeners.get(&hook).map_or(0, Vec::len)
    }

    /// Deliver `event` to every callback registered for its hook.
    pub fn emit(&self, event: &SessionEvent) {
        let hook = event.hook();
        let Some(callbacks) = self.listeners.get(&hook) else {
            return;
        };
        for callback in callbacks {
            if let Err(err) = callback(event) {
                tracing::warn!(hook = %hook, error = %err, "hook callback failed");
            }
        }
    }
}

impl fmt::Debug for HookBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<&'static str, usize> = self
            .listeners
            .iter()
            .map(|(hook, callbacks)| (hook.as_str(), callbacks.len()))
            .collect();
        f.debug_struct("HookBus").field("listeners", &counts).finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
