//! User profile, skin classification and sun session history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location label recorded with every session.
pub const DEFAULT_SESSION_LOCATION: &str = "My spot";

/// Fitzpatrick skin photosensitivity classes, ordered from most to least
/// sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum SkinType {
    #[serde(rename = "type_1")]
    TypeI,
    #[serde(rename = "type_2")]
    TypeII,
    #[default]
    #[serde(rename = "type_3")]
    TypeIII,
    #[serde(rename = "type_4")]
    TypeIV,
    #[serde(rename = "type_5")]
    TypeV,
    #[serde(rename = "type_6")]
    TypeVI,
}

impl SkinType {
    pub const ALL: [SkinType; 6] = [
        SkinType::TypeI,
        SkinType::TypeII,
        SkinType::TypeIII,
        SkinType::TypeIV,
        SkinType::TypeV,
        SkinType::TypeVI,
    ];

    /// Roman numeral of the class
    pub fn numeral(&self) -> &'static str {
        match self {
            Self::TypeI => "I",
            Self::TypeII => "II",
            Self::TypeIII => "III",
            Self::TypeIV => "IV",
            Self::TypeV => "V",
            Self::TypeVI => "VI",
        }
    }

    /// Human-readable label, also used when prompting the advisor
    pub fn label(&self) -> &'static str {
        match self {
            Self::TypeI => "I - Always burns",
            Self::TypeII => "II - Usually burns",
            Self::TypeIII => "III - Sometimes burns",
            Self::TypeIV => "IV - Rarely burns",
            Self::TypeV => "V - Very rarely burns",
            Self::TypeVI => "VI - Never burns",
        }
    }

    /// 1-based position in the sensitivity ordering
    pub fn index(&self) -> u8 {
        match self {
            Self::TypeI => 1,
            Self::TypeII => 2,
            Self::TypeIII => 3,
            Self::TypeIV => 4,
            Self::TypeV => 5,
            Self::TypeVI => 6,
        }
    }
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a skin type string can't be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown skin type: {0} (expected 1-6 or I-VI)")]
pub struct ParseSkinTypeError(pub String);

impl FromStr for SkinType {
    type Err = ParseSkinTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let found = SkinType::ALL.into_iter().find(|skin| {
            normalized == skin.numeral()
                || normalized == skin.index().to_string()
                || normalized == format!("TYPE_{}", skin.index())
        });
        found.ok_or_else(|| ParseSkinTypeError(s.to_string()))
    }
}

/// Inputs to an advice request. A change of either field calls for fresh advice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureProfile {
    pub uv_index: f64,
    pub skin_type: SkinType,
}

impl ExposureProfile {
    /// Negative or NaN UV readings are clamped to 0.
    pub fn new(uv_index: f64, skin_type: SkinType) -> Self {
        let uv_index = if uv_index.is_nan() { 0.0 } else { uv_index.max(0.0) };
        Self { uv_index, skin_type }
    }
}

/// A completed countdown, appended to the user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunSession {
    pub id: String,
    pub date: DateTime<Utc>,
    pub duration_minutes: u32,
    pub uv_index: f64,
    #[serde(default = "default_session_location")]
    pub location: String,
}

fn default_session_location() -> String {
    DEFAULT_SESSION_LOCATION.to_string()
}

impl SunSession {
    pub fn new(date: DateTime<Utc>, duration_minutes: u32, uv_index: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            duration_minutes,
            uv_index,
            location: default_session_location(),
        }
    }
}

/// The locally stored user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub skin_type: SkinType,
    #[serde(default)]
    pub history: Vec<SunSession>,
}

impl User {
    /// Create a profile from the onboarding answers.
    pub fn onboard(name: &str, skin_type: SkinType) -> Self {
        let name = name.trim();
        let email_local = name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(".");

        Self {
            id: new_user_id(),
            name: name.to_string(),
            email: format!("{}@gmail.com", email_local),
            avatar_url: Some(format!(
                "https://ui-avatars.com/api/?name={}&background=random&color=fff",
                urlencoding::encode(name)
            )),
            skin_type,
            history: Vec::new(),
        }
    }

    /// Default profile used when onboarding is skipped.
    pub fn skip_onboarding() -> Self {
        Self {
            id: new_user_id(),
            name: "Sunbather".to_string(),
            email: "user@example.com".to_string(),
            avatar_url: None,
            skin_type: SkinType::TypeIII,
            history: Vec::new(),
        }
    }

    pub fn record_session(&mut self, session: SunSession) {
        self.history.push(session);
    }

    /// History for display, newest first.
    pub fn history_newest_first(&self) -> impl Iterator<Item = &SunSession> {
        self.history.iter().rev()
    }

    pub fn session_count(&self) -> usize {
        self.history.len()
    }

    pub fn total_minutes(&self) -> u64 {
        self.history
            .iter()
            .map(|s| u64::from(s.duration_minutes))
            .sum()
    }
}

fn new_user_id() -> String {
    format!("user_{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_skin_types_are_ordered() {
        assert!(SkinType::TypeI < SkinType::TypeII);
        assert!(SkinType::TypeV < SkinType::TypeVI);
        let mut sorted = SkinType::ALL;
        sorted.sort();
        assert_eq!(sorted, SkinType::ALL);
    }

    #[test]
    fn test_parse_skin_type() {
        assert_eq!("1".parse::<SkinType>().unwrap(), SkinType::TypeI);
        assert_eq!("iv".parse::<SkinType>().unwrap(), SkinType::TypeIV);
        assert_eq!("type_6".parse::<SkinType>().unwrap(), SkinType::TypeVI);
        assert!("7".parse::<SkinType>().is_err());
        assert!("VII".parse::<SkinType>().is_err());
    }

    #[test]
    fn test_skin_type_serde_names() {
        let json = serde_json::to_string(&SkinType::TypeII).unwrap();
        assert_eq!(json, "\"type_2\"");
        let parsed: SkinType = serde_json::from_str("\"type_5\"").unwrap();
        assert_eq!(parsed, SkinType::TypeV);
    }

    #[test]
    fn test_exposure_profile_clamps_negative_uv() {
        assert_eq!(ExposureProfile::new(-2.0, SkinType::TypeI).uv_index, 0.0);
        assert_eq!(ExposureProfile::new(f64::NAN, SkinType::TypeI).uv_index, 0.0);
        assert_eq!(ExposureProfile::new(7.5, SkinType::TypeI).uv_index, 7.5);
    }

    #[test]
    fn test_onboard_derives_email_and_avatar() {
        let user = User::onboard("Anna Lind", SkinType::TypeII);
        assert_eq!(user.email, "anna.lind@gmail.com");
        assert!(user.id.starts_with("user_"));
        let avatar = user.avatar_url.unwrap();
        assert!(avatar.contains("name=Anna%20Lind"));
        assert!(user.history.is_empty());
    }

    #[test]
    fn test_skip_onboarding_defaults() {
        let user = User::skip_onboarding();
        assert_eq!(user.name, "Sunbather");
        assert_eq!(user.skin_type, SkinType::TypeIII);
    }

    #[test]
    fn test_history_is_displayed_newest_first() {
        let mut user = User::skip_onboarding();
        let first = SunSession::new(Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(), 20, 7.0);
        let second = SunSession::new(Utc.with_ymd_and_hms(2026, 6, 2, 12, 0, 0).unwrap(), 15, 5.0);
        user.record_session(first.clone());
        user.record_session(second.clone());

        assert_eq!(user.history, vec![first.clone(), second.clone()]);
        let newest: Vec<_> = user.history_newest_first().cloned().collect();
        assert_eq!(newest, vec![second, first]);
        assert_eq!(user.session_count(), 2);
        assert_eq!(user.total_minutes(), 35);
    }

    #[test]
    fn test_user_json_shape() {
        let user = User::skip_onboarding();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["skinType"], "type_3");
        assert!(json.get("avatarUrl").is_none());
        assert!(json["history"].as_array().unwrap().is_empty());
    }
}
