//! Drop-in appointments. Stored for topic statistics only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub sid: String,
    pub dept_code: String,
    pub details: String,
    pub topic_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub sid: String,
    pub dept_code: String,
    pub details: String,
    pub topic_ids: Vec<i64>,
}

impl NewAppointment {
    pub fn new(sid: &str, dept_code: &str, details: &str, topic_ids: Vec<i64>) -> Self {
        Self {
            sid: sid.to_string(),
            dept_code: dept_code.to_string(),
            details: details.to_string(),
            topic_ids,
        }
    }

    pub fn into_appointment(self, id: i64, now: DateTime<Utc>) -> Appointment {
        Appointment {
            id,
            sid: self.sid,
            dept_code: self.dept_code,
            details: self.details,
            topic_ids: self.topic_ids,
            created_at: now,
            deleted_at: None,
        }
    }
}
