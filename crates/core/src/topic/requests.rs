use serde::Deserialize;

use crate::serde::{deserialize_form_bool, deserialize_form_id};

use super::{NewTopic, TopicError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default, deserialize_with = "deserialize_form_bool")]
    pub available_in_appointments: bool,
    #[serde(default, deserialize_with = "deserialize_form_bool")]
    pub available_in_notes: bool,
}

impl CreateTopicRequest {
    pub fn validate(&self) -> Result<NewTopic, TopicError> {
        NewTopic::new(
            &self.topic,
            self.available_in_notes,
            self.available_in_appointments,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTopicRequest {
    #[serde(deserialize_with = "deserialize_form_id")]
    pub id: i64,
    #[serde(flatten)]
    pub topic: CreateTopicRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicIdRequest {
    #[serde(deserialize_with = "deserialize_form_id")]
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_flattens_topic_fields() {
        let request: UpdateTopicRequest = serde_json::from_value(json!({
            "id": 3,
            "topic": "It feels good to be a gangster.",
            "availableInAppointments": false,
            "availableInNotes": true,
        }))
        .unwrap();

        assert_eq!(request.id, 3);
        let topic = request.topic.validate().unwrap();
        assert!(topic.available_in_notes);
        assert!(!topic.available_in_appointments);
    }
}
