//! Topics: the controlled vocabulary attached to notes and appointments.

mod requests;
mod stats;
mod types;

pub use requests::{CreateTopicRequest, TopicIdRequest, UpdateTopicRequest};
pub use stats::TopicUsage;
pub use types::{sort_topics, NewTopic, Topic, TopicError, OTHER_TOPIC, TOPIC_MAX_LENGTH};
