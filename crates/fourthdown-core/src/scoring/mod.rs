// Player scoring: bucket rules, category weights, and the scorer.

pub mod rules;
pub mod scorer;

use serde::{Deserialize, Serialize};

use crate::model::Player;
use crate::signals::Signal;

pub use rules::{Bucket, BucketRule, Category};
pub use scorer::{confidence, score, score_pool};

/// Relative importance of each rule category. Each weight is >= 0 and the
/// four sum to 1.0; equal weights leave rule points unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub market: f64,
    pub projection: f64,
    pub environment: f64,
    pub health: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        CategoryWeights {
            market: 0.25,
            projection: 0.25,
            environment: 0.25,
            health: 0.25,
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: Category) -> f64 {
        match category {
            Category::Market => self.market,
            Category::Projection => self.projection,
            Category::Environment => self.environment,
            Category::Health => self.health,
        }
    }

    /// Factor applied to a rule's points: the category weight relative to
    /// an even split.
    pub fn multiplier(&self, category: Category) -> f64 {
        self.weight(category) * Category::ALL.len() as f64
    }

    pub fn sum(&self) -> f64 {
        Category::ALL.iter().map(|&c| self.weight(c)).sum()
    }
}

/// Everything the scorer needs, validated at config load.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoringRules {
    pub weights: CategoryWeights,
    pub rules: Vec<BucketRule>,
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Points one signal added to a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub signal: Signal,
    pub category: Category,
    /// The signal value the rule saw.
    pub value: f64,
    /// Weighted points.
    pub points: f64,
}

/// A player's scalar score plus the contributions that produced it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Score {
    pub total: f64,
    pub contributions: Vec<Contribution>,
    /// 0.0-1.0: how much of the signal picture behind `total` was reported.
    #[serde(default)]
    pub confidence: f64,
}

impl Score {
    pub fn zero() -> Self {
        Score::default()
    }
}

/// A player paired with this week's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPlayer {
    pub player: Player,
    pub score: Score,
}

impl ScoredPlayer {
    pub fn value(&self) -> f64 {
        self.score.total
    }

    pub fn confidence(&self) -> f64 {
        self.score.confidence
    }
}
