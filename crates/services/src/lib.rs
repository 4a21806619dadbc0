#![forbid(unsafe_code)]

pub mod analytics;
pub mod draw;
pub mod error;
pub mod prefetch;
pub mod question_store;
pub mod session;

pub use fold_core::Clock;

pub use analytics::{AnalyticsObserver, AnalyticsSummary};
pub use draw::{Draw, DrawPlan};
pub use error::{LoadError, SessionError};
pub use prefetch::{ImageCache, ImageFetcher, preload_window};
pub use question_store::{QuestionSource, QuestionStore};
pub use session::{QuizFlowService, SelectionResult, SessionProgress, TestSession};
