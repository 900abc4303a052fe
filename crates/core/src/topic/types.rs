use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catch-all topic, always listed last.
pub const OTHER_TOPIC: &str = "Other / Reason not listed";

/// Longest topic label, in characters.
pub const TOPIC_MAX_LENGTH: usize = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    #[error("Topic label is required")]
    LabelRequired,
    #[error("Topic label is limited to {TOPIC_MAX_LENGTH} characters")]
    LabelTooLong,
    #[error("Topic must be available in notes, appointments or both")]
    NotAvailableAnywhere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,
    pub topic: String,
    pub available_in_notes: bool,
    pub available_in_appointments: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Topic {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A validated topic definition, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub topic: String,
    pub available_in_notes: bool,
    pub available_in_appointments: bool,
}

impl NewTopic {
    pub fn new(
        topic: &str,
        available_in_notes: bool,
        available_in_appointments: bool,
    ) -> Result<Self, TopicError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(TopicError::LabelRequired);
        }
        if topic.chars().count() > TOPIC_MAX_LENGTH {
            return Err(TopicError::LabelTooLong);
        }
        if !available_in_notes && !available_in_appointments {
            return Err(TopicError::NotAvailableAnywhere);
        }
        Ok(Self {
            topic: topic.to_string(),
            available_in_notes,
            available_in_appointments,
        })
    }

    pub fn into_topic(self, id: i64, now: DateTime<Utc>) -> Topic {
        Topic {
            id,
            topic: self.topic,
            available_in_notes: self.available_in_notes,
            available_in_appointments: self.available_in_appointments,
            created_at: now,
            deleted_at: None,
        }
    }
}

/// Case-insensitive alphabetical, with [`OTHER_TOPIC`] last.
pub fn sort_topics(topics: &mut [Topic]) {
    topics.sort_by_cached_key(|t| (t.topic == OTHER_TOPIC, t.topic.to_lowercase(), t.id));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: i64, label: &str) -> Topic {
        NewTopic::new(label, true, false)
            .unwrap()
            .into_topic(id, Utc::now())
    }

    #[test]
    fn test_other_topic_sorts_last() {
        let mut topics = vec![
            topic(1, OTHER_TOPIC),
            topic(2, "topic for notes, 2"),
            topic(3, "Academic Progress"),
            topic(4, "Topic for all, 1"),
        ];
        sort_topics(&mut topics);

        let labels: Vec<&str> = topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Academic Progress",
                "Topic for all, 1",
                "topic for notes, 2",
                OTHER_TOPIC
            ]
        );
    }

    #[test]
    fn test_new_topic_validation() {
        assert_eq!(NewTopic::new("  ", true, true), Err(TopicError::LabelRequired));
        assert_eq!(
            NewTopic::new("A valid topic", false, false),
            Err(TopicError::NotAvailableAnywhere)
        );
        assert_eq!(
            NewTopic::new(" A valid topic ", false, true).unwrap().topic,
            "A valid topic"
        );
    }

    #[test]
    fn test_label_length_limit() {
        let longest = "é".repeat(TOPIC_MAX_LENGTH);
        assert!(NewTopic::new(&longest, true, false).is_ok());
        assert_eq!(
            NewTopic::new(&format!("{longest}e"), true, false),
            Err(TopicError::LabelTooLong)
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(topic(9, "Study Skills")).unwrap();
        assert_eq!(json["topic"], "Study Skills");
        assert_eq!(json["availableInNotes"], true);
        assert_eq!(json["availableInAppointments"], false);
        assert!(json["deletedAt"].is_null());
    }
}
