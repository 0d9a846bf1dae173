use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.80;
pub const DEFAULT_MIN_AGE: u32 = 14;
pub const DEFAULT_MAX_AGE: u32 = 25;
pub const DEFAULT_INCOME_CEILING: u64 = 500_000;

/// Program eligibility thresholds applied by the guard chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    pub confidence_threshold: f64,
    pub min_age: u32,
    pub max_age: u32,
    pub income_ceiling: u64,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_age: DEFAULT_MIN_AGE,
            max_age: DEFAULT_MAX_AGE,
            income_ceiling: DEFAULT_INCOME_CEILING,
        }
    }
}

/// Service-level switches layered on top of the eligibility thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingSettings {
    pub eligibility: EligibilityConfig,
    /// Allow synthetic extraction results when every real extraction came back empty.
    pub demo_mode: bool,
    /// Bypass the guard chain entirely. Demonstrations and tests only.
    pub skip_rules: bool,
}
