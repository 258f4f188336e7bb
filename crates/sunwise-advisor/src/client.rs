//! Gemini `generateContent` client with JSON-schema constrained output.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sunwise_core::{
    AdviceProvider, AdvisorConfig, AdvisorError, ExposureProfile, SkinType, SunAdvice,
};
use tracing::instrument;

use crate::retry::{with_retry, RetryConfig};
use crate::types::{BeachLocation, GenerateContentResponse, Song};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl GeminiClient {
    /// No request timeout is applied; a stalled call simply stays pending.
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            retry: RetryConfig::default(),
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(&config.base_url, &config.model, config.api_key.clone())
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Safe exposure advice for a UV reading and skin type.
    #[instrument(skip(self), level = "info")]
    pub async fn sun_advice(
        &self,
        uv_index: f64,
        skin_type: SkinType,
    ) -> Result<SunAdvice, AdvisorError> {
        let prompt = format!(
            "Context: the sun safety app \"Sunwise\".\n\
             Data: UV index {}, skin type {}.\n\
             Task: give sunbathing safety advice. Be cautious.\n\
             Keep the advice short and friendly (max 15 words).",
            uv_index,
            skin_type.label()
        );

        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "safeMinutes": { "type": "INTEGER", "description": "Maximum safe sun exposure time in minutes" },
                "spfRecommendation": { "type": "INTEGER", "description": "Recommended SPF value" },
                "advice": { "type": "STRING", "description": "Short, friendly advice (max 15 words)" }
            },
            "required": ["safeMinutes", "spfRecommendation", "advice"]
        });

        let advice: SunAdvice = self.generate_json(&prompt, schema).await?;
        advice.validate()
    }

    /// Advice for `profile`, or [`SunAdvice::fallback`] on any failure.
    pub async fn advice_or_fallback(&self, profile: &ExposureProfile) -> SunAdvice {
        match self.sun_advice(profile.uv_index, profile.skin_type).await {
            Ok(advice) => advice,
            Err(e) => {
                tracing::warn!("Advice request failed, using fallback: {}", e);
                SunAdvice::fallback()
            }
        }
    }

    /// Five real songs matching the user's vibe.
    #[instrument(skip(self), level = "info")]
    pub async fn playlist(&self, vibe: &str) -> Result<Vec<Song>, AdvisorError> {
        let vibe = vibe.trim();
        if vibe.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = format!(
            "Create a curated list of 5 real songs based on the user's vibe: \"{}\".\n\
             Focus on popular songs that are available on Spotify.\n\
             Reply with JSON only.",
            vibe
        );

        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "artist": { "type": "STRING" },
                    "vibe": { "type": "STRING" }
                },
                "required": ["title", "artist", "vibe"]
            }
        });

        self.generate_json(&prompt, schema).await
    }

    pub async fn playlist_or_empty(&self, vibe: &str) -> Vec<Song> {
        self.playlist(vibe).await.unwrap_or_else(|e| {
            tracing::warn!("Playlist request failed: {}", e);
            Vec::new()
        })
    }

    /// Three real public beaches or parks suitable for sunbathing near a coordinate.
    #[instrument(skip(self), level = "info")]
    pub async fn nearby_beaches(&self, lat: f64, lon: f64) -> Result<Vec<BeachLocation>, AdvisorError> {
        let prompt = format!(
            "Find 3 ACTUAL, REAL public bathing spots, beaches or parks suitable for \
             sunbathing near latitude {}, longitude {}.\n\
             IMPORTANT:\n\
             1. Do NOT invent places.\n\
             2. The places must be real geographic locations that exist on a map.\n\
             3. Return their exact coordinates if you know them. If unsure, pick a \
             well-known place nearby.\n\
             4. In a city without beaches, pick popular parks where people sunbathe.\n\
             Reply with JSON only, following the schema.",
            lat, lon
        );

        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "name": { "type": "STRING" },
                    "lat": { "type": "NUMBER" },
                    "lon": { "type": "NUMBER" },
                    "description": { "type": "STRING", "description": "Short description" }
                },
                "required": ["name", "lat", "lon", "description"]
            }
        });

        self.generate_json(&prompt, schema).await
    }

    pub async fn beaches_or_empty(&self, lat: f64, lon: f64) -> Vec<BeachLocation> {
        self.nearby_beaches(lat, lon).await.unwrap_or_else(|e| {
            tracing::warn!("Beach lookup failed: {}", e);
            Vec::new()
        })
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: Value,
    ) -> Result<T, AdvisorError> {
        let api_key = self.api_key.as_deref().ok_or(AdvisorError::MissingApiKey)?;

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });

        let text = with_retry(&self.retry, || self.generate_once(api_key, &body)).await?;

        serde_json::from_str(&text).map_err(|e| AdvisorError::Parse(e.to_string()))
    }

    async fn generate_once(&self, api_key: &str, body: &Value) -> Result<String, AdvisorError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Parse(e.to_string()))?;

        parsed.text().ok_or(AdvisorError::EmptyResponse)
    }
}

#[async_trait]
impl AdviceProvider for GeminiClient {
    async fn advice(&self, profile: &ExposureProfile) -> Result<SunAdvice, AdvisorError> {
        self.sun_advice(profile.uv_index, profile.skin_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADVICE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn model_reply(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(&server.uri(), DEFAULT_MODEL, Some("test-key".to_string()))
            .with_retry_config(RetryConfig::new(2, 1, 5))
    }

    #[tokio::test]
    async fn test_sun_advice_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                r#"{"safeMinutes": 20, "spfRecommendation": 30, "advice": "Seek shade at noon."}"#,
            )))
            .mount(&server)
            .await;

        let advice = client(&server).sun_advice(7.0, SkinType::TypeIII).await.unwrap();
        assert_eq!(advice.safe_minutes, 20);
        assert_eq!(advice.spf_recommendation, 30);
        assert_eq!(advice.advice, "Seek shade at noon.");
    }

    #[tokio::test]
    async fn test_missing_api_key_never_calls_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri(), DEFAULT_MODEL, Some("  ".to_string()));
        let result = client.sun_advice(5.0, SkinType::TypeI).await;
        assert!(matches!(result, Err(AdvisorError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_advice_fallback_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .expect(1)
            .mount(&server)
            .await;

        let profile = ExposureProfile::new(9.0, SkinType::TypeI);
        let advice = client(&server).advice_or_fallback(&profile).await;
        assert_eq!(advice, SunAdvice::fallback());
    }

    #[tokio::test]
    async fn test_advice_fallback_on_malformed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("Sure! Stay safe.")))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(matches!(
            client.sun_advice(4.0, SkinType::TypeII).await,
            Err(AdvisorError::Parse(_))
        ));
        let profile = ExposureProfile::new(4.0, SkinType::TypeII);
        assert_eq!(client.advice_or_fallback(&profile).await, SunAdvice::fallback());
    }

    #[tokio::test]
    async fn test_zero_safe_minutes_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                r#"{"safeMinutes": 0, "spfRecommendation": 50, "advice": "Stay inside."}"#,
            )))
            .mount(&server)
            .await;

        let result = client(&server).sun_advice(11.0, SkinType::TypeI).await;
        assert!(matches!(result, Err(AdvisorError::InvalidAdvice(_))));
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let result = client(&server).sun_advice(3.0, SkinType::TypeIV).await;
        assert!(matches!(result, Err(AdvisorError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                r#"{"safeMinutes": 25, "spfRecommendation": 15, "advice": "Enjoy, but reapply."}"#,
            )))
            .mount(&server)
            .await;

        let advice = client(&server).sun_advice(5.0, SkinType::TypeIV).await.unwrap();
        assert_eq!(advice.safe_minutes, 25);
    }

    #[tokio::test]
    async fn test_advice_provider_impl() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                r#"{"safeMinutes": 10, "spfRecommendation": 50, "advice": "Short session only."}"#,
            )))
            .mount(&server)
            .await;

        let provider: &dyn AdviceProvider = &client(&server);
        let advice = provider
            .advice(&ExposureProfile::new(8.0, SkinType::TypeI))
            .await
            .unwrap();
        assert_eq!(advice.safe_seconds(), 600);
    }

    #[tokio::test]
    async fn test_playlist_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                r#"[
                    {"title": "Walking on Sunshine", "artist": "Katrina and the Waves", "vibe": "upbeat"},
                    {"title": "Here Comes the Sun", "artist": "The Beatles", "vibe": "mellow"}
                ]"#,
            )))
            .mount(&server)
            .await;

        let songs = client(&server).playlist("summer morning").await.unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[1].artist, "The Beatles");
    }

    #[tokio::test]
    async fn test_blank_vibe_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(client(&server).playlist("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_playlist_failure_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        assert!(client(&server).playlist_or_empty("beach party").await.is_empty());
    }

    #[tokio::test]
    async fn test_nearby_beaches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                r#"[{"name": "Långholmen", "lat": 59.3208, "lon": 18.0297, "description": "Rocky shore with sunny cliffs."}]"#,
            )))
            .mount(&server)
            .await;

        let beaches = client(&server).nearby_beaches(59.3293, 18.0686).await.unwrap();
        assert_eq!(beaches.len(), 1);
        assert_eq!(beaches[0].name, "Långholmen");
        assert_eq!(beaches[0].lat, 59.3208);
    }

    #[tokio::test]
    async fn test_beaches_failure_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("not json")))
            .mount(&server)
            .await;

        assert!(client(&server).beaches_or_empty(0.0, 0.0).await.is_empty());
    }
}
