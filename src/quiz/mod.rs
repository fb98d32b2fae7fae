//! Question normalization, the question bank, play sessions and authoring.
//!
//! Nothing in here knows about Telegram; the chat handlers drive these types
//! and render whatever they return.

pub mod authoring;
pub mod bank;
pub mod question;
pub mod session;

pub use authoring::{parse_choice, BankEditor, QuestionForm, Saved};
pub use bank::{LoadedFrom, QuestionBank};
pub use question::{normalize, normalize_all, Question, CHOICE_COUNT, OPTION_COUNT, SKIP_LABEL};
pub use session::{AnswerOutcome, QuizSession, SessionState, SessionSummary};
