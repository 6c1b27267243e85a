use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body returned by the login and registration endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Absolute URL of the uploaded image
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Fields for a new account. Sent as multipart form data.
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
    pub country: String,
    pub bio: String,
    pub profile_image: Option<PathBuf>,
}

/// Profile changes; unset fields are left alone on the server
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub current_password: Option<String>,
    pub password: Option<String>,
    pub profile_image: Option<PathBuf>,
    /// Clear the stored picture. Ignored when `profile_image` is set.
    pub remove_image: bool,
}

impl ProfileUpdate {
    /// True when nothing would change. The current password alone is not a change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.country.is_none()
            && self.bio.is_none()
            && self.password.is_none()
            && self.profile_image.is_none()
            && !self.remove_image
    }

    /// The server rejects any update without the current password
    pub fn has_current_password(&self) -> bool {
        self.current_password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Text fields that are set, as form name/value pairs.
    ///
    /// Removing the picture is sent as an empty `profile_image` text part.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = [
            ("current_password", &self.current_password),
            ("name", &self.name),
            ("email", &self.email),
            ("country", &self.country),
            ("bio", &self.bio),
            ("password", &self.password),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.clone().map(|v| (field, v)))
        .collect();

        if self.remove_image && self.profile_image.is_none() {
            fields.push(("profile_image", String::new()));
        }
        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub badge_type: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBadge {
    pub id: i64,
    pub badge: Badge,
    #[serde(default)]
    pub earned_date: Option<DateTime<Utc>>,
}
