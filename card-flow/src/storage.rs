use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{FlowError, Result};
use crate::question::Question;

/// Raw answers keyed by question key. Every question key is present from the start;
/// `None` marks a question that has not been answered yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, Option<String>>);

impl Answers {
    pub fn for_questions(questions: &[Question]) -> Self {
        Self(questions.iter().map(|q| (q.key.to_string(), None)).collect())
    }

    /// Store the answer for `key`. Keys outside the question list are refused.
    pub fn record(&mut self, key: &str, answer: impl Into<String>) -> Result<()> {
        match self.0.get_mut(key) {
            Some(slot) => {
                *slot = Some(answer.into());
                Ok(())
            }
            None => Err(FlowError::UnknownQuestion(key.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// One user's in-progress conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Index of the next question to ask; the previous one is awaiting an answer.
    pub current_question: usize,
    pub answers: Answers,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, questions: &[Question]) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            current_question: 0,
            answers: Answers::for_questions(questions),
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;

    /// Expiry hook: drop sessions idle since before `cutoff` and return how many went.
    /// Stores that cannot enumerate their sessions keep everything.
    async fn purge_idle(&self, _cutoff: DateTime<Utc>) -> Result<usize> {
        Ok(0)
    }
}

/// In-memory implementation of SessionStorage
#[derive(Clone, Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn purge_idle(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_active >= cutoff);
        Ok(before.saturating_sub(self.sessions.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::QUESTIONS;
    use chrono::Duration;

    #[test]
    fn answers_are_prepopulated_with_every_key() {
        let answers = Answers::for_questions(&QUESTIONS);
        assert_eq!(answers.len(), QUESTIONS.len());
        for question in &QUESTIONS {
            assert!(answers.keys().any(|k| k == question.key));
            assert_eq!(answers.get(question.key), None);
        }
    }

    #[test]
    fn recording_unknown_key_is_refused() {
        let mut answers = Answers::for_questions(&QUESTIONS);
        answers.record("income", "60k").unwrap();
        assert_eq!(answers.get("income"), Some("60k"));

        let err = answers.record("favourite_colour", "blue").unwrap_err();
        assert!(matches!(err, FlowError::UnknownQuestion(_)));
        assert_eq!(answers.len(), QUESTIONS.len());
    }

    #[tokio::test]
    async fn test_storage() {
        let storage = InMemorySessionStorage::new();
        storage
            .save(Session::new("session1", &QUESTIONS))
            .await
            .unwrap();

        let retrieved = storage.get("session1").await.unwrap();
        assert_eq!(retrieved.map(|s| s.current_question), Some(0));

        storage.delete("session1").await.unwrap();
        assert!(storage.get("session1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_idle_drops_only_stale_sessions() {
        let storage = InMemorySessionStorage::new();
        let mut stale = Session::new("stale", &QUESTIONS);
        stale.last_active = Utc::now() - Duration::hours(2);
        storage.save(stale).await.unwrap();
        storage.save(Session::new("fresh", &QUESTIONS)).await.unwrap();

        let purged = storage
            .purge_idle(Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(purged, 1);
        assert!(storage.get("stale").await.unwrap().is_none());
        assert!(storage.get("fresh").await.unwrap().is_some());
    }
}
