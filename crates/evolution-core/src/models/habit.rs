use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub habit_name: String,
    #[serde(default)]
    pub habit_description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitDraft {
    pub habit_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub habit_description: Option<String>,
}

/// One habit's completion entry for a single day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitTracker {
    pub id: i64,
    pub habit: i64,
    pub habit_name: String,
    #[serde(default)]
    pub habit_description: Option<String>,
    pub tracking_date: NaiveDate,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub completion_percentage: f64,
}

/// The backend sends decimals as strings ("66.67"); accept numbers too
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(n) => Ok(n),
        Decimal::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Percentage of trackers marked complete, 0 when there are none
pub fn completion_rate(trackers: &[HabitTracker]) -> f64 {
    if trackers.is_empty() {
        return 0.0;
    }
    let done = trackers.iter().filter(|t| t.is_completed).count();
    done as f64 / trackers.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(id: i64, done: bool) -> HabitTracker {
        HabitTracker {
            id,
            habit: id,
            habit_name: format!("habit {}", id),
            habit_description: None,
            tracking_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_completed: done,
            completion_percentage: 0.0,
        }
    }

    #[test]
    fn test_parse_tracker_with_string_decimal() {
        let json = r#"{"id": 3, "habit": 1, "habit_name": "Stretch", "habit_description": "",
            "tracking_date": "2024-02-10", "is_completed": true,
            "completion_percentage": "66.67"}"#;
        let t: HabitTracker = serde_json::from_str(json).unwrap();
        assert!(t.is_completed);
        assert!((t.completion_percentage - 66.67).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_tracker_with_numeric_decimal() {
        let json = r#"{"id": 3, "habit": 1, "habit_name": "Stretch",
            "tracking_date": "2024-02-10", "completion_percentage": 50}"#;
        let t: HabitTracker = serde_json::from_str(json).unwrap();
        assert!(!t.is_completed);
        assert_eq!(t.completion_percentage, 50.0);
    }

    #[test]
    fn test_parse_habit() {
        let json = r#"{"id": 1, "habit_name": "Read", "habit_description": null,
            "created_at": "2024-02-10T08:00:00Z", "updated_at": "2024-02-10T08:00:00.123456Z"}"#;
        let h: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(h.habit_name, "Read");
        assert!(h.created_at.is_some());
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(&[]), 0.0);
        let trackers = vec![
            tracker(1, true),
            tracker(2, false),
            tracker(3, true),
            tracker(4, true),
        ];
        assert_eq!(completion_rate(&trackers), 75.0);
    }
}
