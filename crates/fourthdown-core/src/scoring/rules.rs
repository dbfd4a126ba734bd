// Bucket rules: the configurable mapping from one signal value to points.

use serde::{Deserialize, Serialize};

use crate::model::Position;
use crate::signals::Signal;

/// Which weight a rule's points are scaled by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Betting lines and props.
    Market,
    /// Statistical projections.
    Projection,
    /// Weather.
    Environment,
    /// Injury designation.
    Health,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Market,
        Category::Projection,
        Category::Environment,
        Category::Health,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Market => "market",
            Category::Projection => "projection",
            Category::Environment => "environment",
            Category::Health => "health",
        }
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// One value range and the points it awards.
///
/// Lower bound is either `min` (inclusive) or `above` (exclusive); upper bound
/// is either `max` (inclusive) or `below` (exclusive). At least one bound is
/// required.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
    pub points: f64,
}

impl Bucket {
    pub fn matches(&self, value: f64) -> bool {
        self.min.map_or(true, |b| value >= b)
            && self.above.map_or(true, |b| value > b)
            && self.max.map_or(true, |b| value <= b)
            && self.below.map_or(true, |b| value < b)
    }

    /// Structural problems, if any.
    pub fn check(&self) -> Result<(), String> {
        if self.min.is_some() && self.above.is_some() {
            return Err("bucket sets both `min` and `above`".into());
        }
        if self.max.is_some() && self.below.is_some() {
            return Err("bucket sets both `max` and `below`".into());
        }
        if self.bounds().next().is_none() {
            return Err("bucket has no bound".into());
        }
        if self.bounds().any(|b| !b.is_finite()) || !self.points.is_finite() {
            return Err("bucket bounds and points must be finite".into());
        }
        Ok(())
    }

    fn bounds(&self) -> impl Iterator<Item = f64> {
        [self.min, self.above, self.max, self.below]
            .into_iter()
            .flatten()
    }
}

// ---------------------------------------------------------------------------
// BucketRule
// ---------------------------------------------------------------------------

/// Points for one signal, optionally restricted to some positions. The first
/// matching bucket wins; a value matching no bucket contributes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRule {
    pub signal: Signal,
    /// Positions the rule applies to; `None` means every position.
    #[serde(default)]
    pub positions: Option<Vec<Position>>,
    pub category: Category,
    pub buckets: Vec<Bucket>,
    /// Values above this are treated as bad data and score 0.
    #[serde(default)]
    pub ignore_above: Option<f64>,
}

impl BucketRule {
    pub fn applies_to(&self, position: Position) -> bool {
        self.positions
            .as_ref()
            .map_or(true, |ps| ps.contains(&position))
    }

    /// Unweighted points for `value`.
    pub fn points_for(&self, value: f64) -> f64 {
        if self.ignore_above.is_some_and(|cap| value > cap) {
            return 0.0;
        }
        self.bucket_points(value)
    }

    fn bucket_points(&self, value: f64) -> f64 {
        self.buckets
            .iter()
            .find(|b| b.matches(value))
            .map_or(0.0, |b| b.points)
    }

    /// Verify that points never rise then fall (or fall then rise) as the
    /// value increases, over the range below `ignore_above`.
    ///
    /// Samples every bucket boundary, points just either side of it, the
    /// midpoints between boundaries, and one step past each end.
    pub fn check_monotonic(&self) -> Result<(), String> {
        let mut edges: Vec<f64> = self.buckets.iter().flat_map(|b| b.bounds()).collect();
        if let Some(cap) = self.ignore_above {
            edges.retain(|&e| e <= cap);
        }
        edges.sort_by(f64::total_cmp);
        edges.dedup();
        if edges.is_empty() {
            return Ok(());
        }

        let min_gap = edges
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);
        let step = if min_gap.is_finite() { min_gap / 4.0 } else { 0.5 };

        let mut samples = Vec::with_capacity(edges.len() * 4 + 2);
        samples.push(edges[0] - 1.0);
        for (i, &e) in edges.iter().enumerate() {
            samples.extend([e - step, e, e + step]);
            if let Some(&next) = edges.get(i + 1) {
                samples.push((e + next) / 2.0);
            }
        }
        samples.push(edges[edges.len() - 1] + 1.0);
        if let Some(cap) = self.ignore_above {
            samples.retain(|&p| p <= cap);
        }
        samples.sort_by(f64::total_cmp);

        let points: Vec<f64> = samples.iter().map(|&p| self.bucket_points(p)).collect();
        let rises = points.windows(2).any(|w| w[1] > w[0]);
        let falls = points.windows(2).any(|w| w[1] < w[0]);
        if rises && falls {
            return Err(format!(
                "buckets for `{}` are not monotonic in the signal value",
                self.signal
            ));
        }
        Ok(())
    }
}
