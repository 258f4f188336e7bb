//! Sun exposure advice and the ports the countdown talks through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;
use crate::profile::{ExposureProfile, SunSession};

pub const FALLBACK_SAFE_MINUTES: u32 = 15;
pub const FALLBACK_SPF: u32 = 30;
pub const FALLBACK_MESSAGE: &str = "Technical error. Play it safe and use a high SPF!";

/// Recommendation bundle produced by an [`AdviceProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunAdvice {
    pub safe_minutes: u32,
    pub spf_recommendation: u32,
    pub advice: String,
}

impl SunAdvice {
    /// Conservative advice used whenever the provider fails.
    pub fn fallback() -> Self {
        Self {
            safe_minutes: FALLBACK_SAFE_MINUTES,
            spf_recommendation: FALLBACK_SPF,
            advice: FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn safe_seconds(&self) -> u32 {
        self.safe_minutes.saturating_mul(60)
    }

    /// Reject advice that can't size a countdown.
    pub fn validate(self) -> Result<Self, AdvisorError> {
        if self.safe_minutes == 0 {
            return Err(AdvisorError::InvalidAdvice(
                "safeMinutes must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Source of exposure advice for a UV reading and skin type.
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    async fn advice(&self, profile: &ExposureProfile) -> Result<SunAdvice, AdvisorError>;
}

/// Receiver of completed sessions. Persistence failures are the
/// implementation's concern; callers never see them.
pub trait SessionRecorder: Send + Sync {
    fn record(&self, session: SunSession);
}
