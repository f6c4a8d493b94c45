//! Objective-specific weight profiles used to re-score placements at
//! activation time.

use super::campaign::Objective;

/// Flat bonus added for channels that publish without manual approval.
pub const AUTO_PUBLISH_BONUS: f64 = 0.05;

/// Scoring weights for one campaign objective. Weights sum to at most 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightProfile {
    pub match_score: f64,
    pub subscribers: f64,
    pub rating: f64,
    pub fraud: f64,
    pub engagement: f64,
    /// Maximum placements activated per ad in one pass.
    pub max_channels: usize,
}

const BRAND_AWARENESS: WeightProfile = WeightProfile {
    match_score: 0.4,
    subscribers: 0.4,
    rating: 0.0,
    fraud: 0.1,
    engagement: 0.1,
    max_channels: 20,
};

const ENGAGEMENT: WeightProfile = WeightProfile {
    match_score: 0.2,
    subscribers: 0.0,
    rating: 0.3,
    fraud: 0.0,
    engagement: 0.5,
    max_channels: 5,
};

const CONVERSION: WeightProfile = WeightProfile {
    match_score: 0.2,
    subscribers: 0.0,
    rating: 0.4,
    fraud: 0.4,
    engagement: 0.0,
    max_channels: 3,
};

const TRAFFIC: WeightProfile = WeightProfile {
    match_score: 0.3,
    subscribers: 0.3,
    rating: 0.2,
    fraud: 0.0,
    engagement: 0.2,
    max_channels: 10,
};

/// Inputs to [`WeightProfile::score`], one per weighted signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Raw preference score from matching.
    pub match_score: f64,
    pub subscribers: u64,
    /// 0..=5
    pub rating: f64,
    /// 0..=1
    pub fraud_score: f64,
    pub engagement_rate: f64,
    pub auto_publish: bool,
}

impl WeightProfile {
    /// Profile for `objective`.
    #[must_use]
    pub const fn for_objective(objective: Objective) -> &'static Self {
        match objective {
            Objective::BrandAwareness => &BRAND_AWARENESS,
            Objective::Engagement => &ENGAGEMENT,
            Objective::Conversion => &CONVERSION,
            Objective::Traffic => &TRAFFIC,
        }
    }

    /// Weighted activation score, rounded to two places.
    #[must_use]
    pub fn score(&self, inputs: &ScoreInputs) -> f64 {
        let mut score = self.match_score * inputs.match_score
            + self.subscribers * (inputs.subscribers as f64 / 1_000_000.0)
            + self.rating * (inputs.rating / 5.0)
            + self.fraud * (1.0 - inputs.fraud_score)
            + self.engagement * inputs.engagement_rate;
        if inputs.auto_publish {
            score += AUTO_PUBLISH_BONUS;
        }
        round2(score)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
