use serde::{Deserialize, Serialize};

/// A playlist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub vibe: String,
}

/// A real, public place to sunbathe near the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeachLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub description: String,
}

// Wire types for the generateContent endpoint.

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Part {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, with all its text parts joined.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text() {
        let resp: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "[{\"title\":" }, { "text": "\"x\"}]" }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(resp.text().as_deref(), Some("[{\"title\":\"x\"}]"));
    }

    #[test]
    fn test_no_candidates() {
        let resp: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({ "promptFeedback": {} })).unwrap();
        assert!(resp.text().is_none());
    }

    #[test]
    fn test_blank_text_is_none() {
        let resp: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "  " }] } }]
        }))
        .unwrap();
        assert!(resp.text().is_none());
    }
}
