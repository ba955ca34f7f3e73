use tracing::debug;

use crate::catalog::{Card, Catalog};
use crate::question::{QUESTIONS, Question};
use crate::recommend::recommend;
use crate::storage::Session;

/// Reply sent when no card survives the eligibility filter.
pub const NO_MATCH_REPLY: &str = "Sorry, no cards match your profile.";

/// Result of applying one message to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Ask (or, when `repeated`, re-ask) a question. The session is still in progress.
    Prompt { text: &'static str, repeated: bool },
    /// All questions answered; the session is finished and the ranked cards are attached.
    Completed(Vec<Card>),
}

/// What the user gets back for a message: either text or a non-empty list of cards.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowReply {
    Reply(String),
    Recommendations(Vec<Card>),
}

impl From<StepOutcome> for FlowReply {
    fn from(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::Prompt { text, .. } => FlowReply::Reply(text.to_string()),
            StepOutcome::Completed(cards) if cards.is_empty() => {
                FlowReply::Reply(NO_MATCH_REPLY.to_string())
            }
            StepOutcome::Completed(cards) => FlowReply::Recommendations(cards),
        }
    }
}

/// The question-answer state machine. Holds the immutable question list and catalog;
/// all per-conversation state lives in the [`Session`] passed to [`FlowController::step`].
#[derive(Debug, Clone)]
pub struct FlowController {
    questions: &'static [Question],
    catalog: Catalog,
}

impl FlowController {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_questions(&QUESTIONS, catalog)
    }

    pub fn with_questions(questions: &'static [Question], catalog: Catalog) -> Self {
        Self { questions, catalog }
    }

    pub fn questions(&self) -> &'static [Question] {
        self.questions
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fresh session state for `id`.
    pub fn new_session(&self, id: impl Into<String>) -> Session {
        Session::new(id, self.questions)
    }

    /// Apply one inbound message to `session`.
    ///
    /// When a question is pending, `message` answers it: an invalid answer re-asks the
    /// same question and leaves the session untouched. Once every question is answered
    /// the recommendation engine runs and the outcome is [`StepOutcome::Completed`];
    /// the caller is expected to discard the session at that point.
    pub fn step(&self, session: &mut Session, message: &str) -> StepOutcome {
        let idx = session.current_question;

        if idx > 0 {
            if let Some(pending) = self.questions.get(idx - 1) {
                let answer = message.trim();
                if !pending.kind.accepts(answer) {
                    debug!(
                        session_id = %session.id,
                        question = pending.key,
                        "Answer rejected, asking again"
                    );
                    return StepOutcome::Prompt {
                        text: pending.prompt,
                        repeated: true,
                    };
                }
                if let Err(e) = session.answers.record(pending.key, answer) {
                    debug!(session_id = %session.id, error = %e, "Answer not recorded");
                }
            }
        }

        session.touch();

        if let Some(next) = self.questions.get(idx) {
            session.current_question += 1;
            return StepOutcome::Prompt {
                text: next.prompt,
                repeated: false,
            };
        }

        StepOutcome::Completed(recommend(&session.answers, &self.catalog))
    }
}
