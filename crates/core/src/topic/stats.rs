use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::Topic;

/// Per-topic usage counts over non-deleted appointments and notes.
/// Topics with no usage are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicUsage {
    pub appointments: BTreeMap<i64, usize>,
    pub notes: BTreeMap<i64, usize>,
}

impl TopicUsage {
    /// Builds usage from raw counts. Notes record topic labels, so
    /// `note_label_counts` is keyed by lowercased label and matched against
    /// each topic case-insensitively; appointments record topic ids.
    pub fn from_counts(
        topics: &[Topic],
        note_label_counts: &HashMap<String, usize>,
        appointment_counts: &HashMap<i64, usize>,
    ) -> Self {
        let mut usage = TopicUsage::default();
        for topic in topics {
            if let Some(&count) = appointment_counts.get(&topic.id).filter(|c| **c > 0) {
                usage.appointments.insert(topic.id, count);
            }
            if let Some(&count) = note_label_counts
                .get(&topic.topic.to_lowercase())
                .filter(|c| **c > 0)
            {
                usage.notes.insert(topic.id, count);
            }
        }
        usage
    }
}
