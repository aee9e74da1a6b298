//! Per-message feedback tracking
//!
//! Feedback is keyed by message position. An entry is only written after the
//! backend acknowledged it, is never removed, and cannot flip between
//! positive and negative.

use std::collections::HashMap;

use crate::backend::FeedbackRequest;
use crate::error::ClientError;
use crate::events::{Message, Role, Sentiment};

#[derive(Debug, Clone, Default)]
pub struct FeedbackTracker {
    entries: HashMap<usize, Sentiment>,
}

/// What the caller should do with a feedback action
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackPlan {
    /// Same sentiment already recorded, nothing to send
    AlreadyRecorded,
    /// Send this request, then call `confirm`
    Send(FeedbackRequest),
}

impl FeedbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, position: usize) -> Option<Sentiment> {
        self.entries.get(&position).copied()
    }

    /// Validate a feedback action against the message list and build the
    /// request carrying the adjacent question/answer pair
    pub fn plan(
        &self,
        messages: &[Message],
        position: usize,
        sentiment: Sentiment,
    ) -> Result<FeedbackPlan, ClientError> {
        let target = messages
            .get(position)
            .ok_or_else(|| ClientError::validation(format!("No message at position {position}")))?;
        if target.role != Role::Bot {
            return Err(ClientError::validation("Feedback can only be given on bot answers"));
        }

        let question = position
            .checked_sub(1)
            .and_then(|i| messages.get(i))
            .filter(|m| m.role == Role::User)
            .ok_or_else(|| ClientError::validation("Answer has no preceding question"))?;

        match self.get(position) {
            Some(existing) if existing == sentiment => Ok(FeedbackPlan::AlreadyRecorded),
            Some(existing) => Err(ClientError::validation(format!(
                "Feedback already recorded as {existing}"
            ))),
            None => Ok(FeedbackPlan::Send(FeedbackRequest::new(
                question.content.clone(),
                target.content.clone(),
                sentiment,
            ))),
        }
    }

    /// Store acknowledged feedback. An existing entry is never overwritten.
    pub fn confirm(&mut self, position: usize, sentiment: Sentiment) -> bool {
        if self.entries.contains_key(&position) {
            return false;
        }
        self.entries.insert(position, sentiment);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Utc;

    fn message(role: Role, content: &str, position: usize) -> Message {
        Message {
            role,
            content: content.to_string(),
            html: None,
            position,
            timestamp: Utc::now(),
        }
    }

    fn exchange() -> Vec<Message> {
        vec![
            message(Role::User, "how do I rebase?", 0),
            message(Role::Bot, "use git rebase", 1),
        ]
    }

    #[test]
    fn test_plan_builds_adjacent_pair() {
        let tracker = FeedbackTracker::new();
        let plan = tracker.plan(&exchange(), 1, Sentiment::Positive).unwrap();

        assert_eq!(
            plan,
            FeedbackPlan::Send(FeedbackRequest::new("how do I rebase?", "use git rebase", Sentiment::Positive))
        );
    }

    #[test]
    fn test_positive_blocks_negative() {
        let mut tracker = FeedbackTracker::new();
        assert!(tracker.confirm(1, Sentiment::Positive));

        assert_eq!(
            tracker.plan(&exchange(), 1, Sentiment::Positive).unwrap(),
            FeedbackPlan::AlreadyRecorded
        );

        let err = tracker.plan(&exchange(), 1, Sentiment::Negative).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!tracker.confirm(1, Sentiment::Negative));
        assert_eq!(tracker.get(1), Some(Sentiment::Positive));
    }

    #[test]
    fn test_same_sentiment_is_noop() {
        let mut tracker = FeedbackTracker::new();
        tracker.confirm(1, Sentiment::Negative);
        let plan = tracker.plan(&exchange(), 1, Sentiment::Negative).unwrap();
        assert_eq!(plan, FeedbackPlan::AlreadyRecorded);
    }

    #[test]
    fn test_rejects_non_bot_target() {
        let tracker = FeedbackTracker::new();
        let err = tracker.plan(&exchange(), 0, Sentiment::Positive).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_rejects_bot_without_question() {
        let tracker = FeedbackTracker::new();
        let messages = vec![
            message(Role::Error, "Sorry", 0),
            message(Role::Bot, "answer", 1),
        ];
        assert!(tracker.plan(&messages, 1, Sentiment::Positive).is_err());
        assert!(tracker.plan(&messages, 7, Sentiment::Positive).is_err());
    }
}
