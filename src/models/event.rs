use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One concrete intake occurrence, materialized from a prescription.
///
/// `reminder_sent` is the claim flag shared by all delivery mechanisms:
/// whichever path flips it first owns the notification for this event.
/// `is_completed` and `completed_at_millis` are always set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEvent {
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_time_millis: i64,
    pub end_time_millis: i64,
    pub is_completed: bool,
    pub completed_at_millis: Option<i64>,
    pub reminder_sent: bool,
    pub calendar_event_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at_millis: i64,
}

impl MedicationEvent {
    pub fn new(
        prescription_id: Uuid,
        title: &str,
        description: &str,
        start_time_millis: i64,
        end_time_millis: i64,
        now_millis: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prescription_id,
            title: title.to_string(),
            description: description.to_string(),
            start_time_millis,
            end_time_millis,
            is_completed: false,
            completed_at_millis: None,
            reminder_sent: false,
            calendar_event_id: None,
            notes: None,
            created_at_millis: now_millis,
        }
    }
}
