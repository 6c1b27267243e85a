use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::strip_html;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub journal_entry_id: i64,
    #[serde(default)]
    pub title: String,
    /// Rich-text HTML as produced by the editor
    #[serde(default)]
    pub content: String,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl JournalEntry {
    pub fn plain_text(&self) -> String {
        strip_html(&self.content)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalDraft {
    pub title: String,
    pub content: String,
}

impl JournalDraft {
    /// Wrap plain text lines into paragraphs for the rich-text editor
    pub fn from_plain_text(title: &str, text: &str) -> Self {
        let content = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("<p>{}</p>", escape_html(line.trim())))
            .collect::<Vec<_>>()
            .join("");
        Self {
            title: title.to_string(),
            content,
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_and_plain_text() {
        let json = r#"{"journal_entry_id": 12, "title": "Monday",
            "content": "<p>Hello</p><p>world</p>",
            "date_created": "2024-03-04T20:15:00Z", "user_id": 1}"#;
        let entry: JournalEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.journal_entry_id, 12);
        assert_eq!(entry.plain_text(), "Hello world");
    }

    #[test]
    fn test_draft_from_plain_text() {
        let draft = JournalDraft::from_plain_text("Day", "first line\n\n a < b \n");
        assert_eq!(draft.content, "<p>first line</p><p>a &lt; b</p>");
    }
}
