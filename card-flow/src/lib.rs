//! Conversational intake flow for credit-card recommendations.
//!
//! A fixed list of questions is asked one message at a time. Each answer is validated
//! against the kind attached to its question; once every answer is in, the card catalog
//! is filtered by income and credit score and ranked by the stated reward preference.

pub mod catalog;
pub mod error;
pub mod flow;
pub mod parse;
pub mod question;
pub mod recommend;
pub mod runner;
pub mod storage;

// Re-export commonly used types
pub use catalog::{Card, Catalog};
pub use error::{FlowError, Result};
pub use flow::{FlowController, FlowReply, NO_MATCH_REPLY, StepOutcome};
pub use parse::{ParseError, parse_credit_score, parse_income};
pub use question::{AnswerKind, QUESTIONS, Question, question_keys};
pub use recommend::{MAX_RECOMMENDATIONS, Preference, recommend};
pub use runner::FlowRunner;
pub use storage::{Answers, InMemorySessionStorage, Session, SessionStorage};
