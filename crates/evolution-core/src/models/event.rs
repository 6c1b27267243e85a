use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub subject: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,
}

impl Event {
    /// Start date in the local timezone
    pub fn start_date(&self) -> NaiveDate {
        self.start_time.with_timezone(&Local).date_naive()
    }

    /// Compact local time range for list view: "Mar 04 09:00-10:30"
    pub fn formatted_range(&self) -> String {
        let start = self.start_time.with_timezone(&Local);
        let end = self.end_time.with_timezone(&Local);
        if start.date_naive() == end.date_naive() {
            format!("{} {}-{}", start.format("%b %d"), start.format("%H:%M"), end.format("%H:%M"))
        } else {
            format!("{} - {}", start.format("%b %d %H:%M"), end.format("%b %d %H:%M"))
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDraft {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_color: Option<String>,
}

/// Events starting on or after `today`, earliest first
pub fn upcoming_events(events: &[Event], today: NaiveDate) -> Vec<&Event> {
    let mut upcoming: Vec<&Event> = events
        .iter()
        .filter(|e| e.start_date() >= today)
        .collect();
    upcoming.sort_by_key(|e| e.start_time);
    upcoming
}
