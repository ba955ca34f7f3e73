use serde::Serialize;

use crate::parse::is_valid_score;

/// Question keys, in presentation order.
pub mod question_keys {
    pub const INCOME: &str = "income";
    pub const FUEL_PCT: &str = "fuel_pct";
    pub const GROCERY_PCT: &str = "grocery_pct";
    pub const DINING_PCT: &str = "dining_pct";
    pub const TRAVEL_PCT: &str = "travel_pct";
    pub const PREFERENCE: &str = "preference";
    pub const EXISTING: &str = "existing";
    pub const CREDIT_SCORE: &str = "credit_score";
}

/// Accepted spellings for the reward preference question.
pub const PREFERENCE_CHOICES: &[&str] = &["cashback", "miles", "lounges", "lounge"];

/// How an answer to a question is validated before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Any text, including the empty string.
    FreeText,
    /// One of a fixed set of words, compared case-insensitively.
    Choice(&'static [&'static str]),
    /// `yes` or `no`, case-insensitive.
    YesNo,
    /// `unknown`, empty, a range such as `650-700`, or a plain number.
    ScorePattern,
}

impl AnswerKind {
    /// Returns true if `text` is an acceptable answer. Surrounding whitespace is ignored.
    pub fn accepts(&self, text: &str) -> bool {
        let answer = text.trim();
        match self {
            AnswerKind::FreeText => true,
            AnswerKind::Choice(choices) => choices
                .iter()
                .any(|choice| choice.eq_ignore_ascii_case(answer)),
            AnswerKind::YesNo => {
                answer.eq_ignore_ascii_case("yes") || answer.eq_ignore_ascii_case("no")
            }
            AnswerKind::ScorePattern => is_valid_score(answer),
        }
    }
}

/// A single step of the intake conversation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub key: &'static str,
    pub prompt: &'static str,
    #[serde(skip)]
    pub kind: AnswerKind,
}

/// The fixed question sequence. Order is both presentation and validation order.
pub static QUESTIONS: [Question; 8] = [
    Question {
        key: question_keys::INCOME,
        prompt: "What's your monthly income in ₹? (e.g. 50000 or 60k)",
        kind: AnswerKind::FreeText,
    },
    Question {
        key: question_keys::FUEL_PCT,
        prompt: "What % of your spending goes on fuel?",
        kind: AnswerKind::FreeText,
    },
    Question {
        key: question_keys::GROCERY_PCT,
        prompt: "And what % goes to groceries?",
        kind: AnswerKind::FreeText,
    },
    Question {
        key: question_keys::DINING_PCT,
        prompt: "Dining & entertainment %?",
        kind: AnswerKind::FreeText,
    },
    Question {
        key: question_keys::TRAVEL_PCT,
        prompt: "Travel (flights, hotels) %?",
        kind: AnswerKind::FreeText,
    },
    Question {
        key: question_keys::PREFERENCE,
        prompt: "Which benefit matters most—cashback, miles, or lounges?",
        kind: AnswerKind::Choice(PREFERENCE_CHOICES),
    },
    Question {
        key: question_keys::EXISTING,
        prompt: "Do you already hold any credit cards? (yes/no)",
        kind: AnswerKind::YesNo,
    },
    Question {
        key: question_keys::CREDIT_SCORE,
        prompt: "Your credit-score range? (e.g. 650-700). If unknown, reply 'unknown'.",
        kind: AnswerKind::ScorePattern,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_presentation_order() {
        let keys: Vec<&str> = QUESTIONS.iter().map(|q| q.key).collect();
        assert_eq!(
            keys,
            vec![
                "income",
                "fuel_pct",
                "grocery_pct",
                "dining_pct",
                "travel_pct",
                "preference",
                "existing",
                "credit_score"
            ]
        );
    }

    #[test]
    fn preference_choice_is_case_insensitive() {
        let kind = AnswerKind::Choice(PREFERENCE_CHOICES);
        assert!(kind.accepts("Cashback"));
        assert!(kind.accepts("  LOUNGE "));
        assert!(kind.accepts("miles"));
        assert!(!kind.accepts("points"));
        assert!(!kind.accepts(""));
    }

    #[test]
    fn yes_no_rejects_anything_else() {
        assert!(AnswerKind::YesNo.accepts("YES"));
        assert!(AnswerKind::YesNo.accepts("no"));
        assert!(!AnswerKind::YesNo.accepts("maybe"));
        assert!(!AnswerKind::YesNo.accepts("y"));
    }

    #[test]
    fn free_text_accepts_empty_answers() {
        assert!(AnswerKind::FreeText.accepts(""));
        assert!(AnswerKind::FreeText.accepts("about 10"));
    }

    #[test]
    fn score_pattern_delegates_to_score_validation() {
        assert!(AnswerKind::ScorePattern.accepts("650 - 700"));
        assert!(AnswerKind::ScorePattern.accepts("Unknown"));
        assert!(!AnswerKind::ScorePattern.accepts("good"));
    }
}
