use crate::error::{DriverDiscoveryError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative importance of each score component in the composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoringWeights {
    pub materiality: f64,
    pub variability: f64,
    pub predictability: f64,
    pub growth_impact: f64,
    pub data_quality: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            materiality: 0.3,
            variability: 0.2,
            predictability: 0.2,
            growth_impact: 0.2,
            data_quality: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.materiality + self.variability + self.predictability + self.growth_impact + self.data_quality
    }

    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("materiality", self.materiality),
            ("variability", self.variability),
            ("predictability", self.predictability),
            ("growth_impact", self.growth_impact),
            ("data_quality", self.data_quality),
        ]
    }
}

/// Validated scoring weights. Each weight lies in `[0, 1]` and they sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScoringWeights", into = "ScoringWeights")]
pub struct ScoringConfig {
    weights: ScoringWeights,
}

impl ScoringConfig {
    pub fn new(weights: ScoringWeights) -> Result<Self> {
        for (name, weight) in weights.named() {
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(DriverDiscoveryError::InvalidWeights(format!(
                    "{} weight {} must be between 0.0 and 1.0",
                    name, weight
                )));
            }
        }

        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DriverDiscoveryError::InvalidWeights(format!(
                "weights must sum to 1.0 (got {})",
                sum
            )));
        }

        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }
}

impl TryFrom<ScoringWeights> for ScoringConfig {
    type Error = DriverDiscoveryError;

    fn try_from(weights: ScoringWeights) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<ScoringConfig> for ScoringWeights {
    fn from(config: ScoringConfig) -> Self {
        config.weights
    }
}

/// Raw selection thresholds, as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectionThresholds {
    #[schemars(description = "Lowest composite score a driver may have (0.0 - 1.0)")]
    pub minimum_score: f64,

    #[schemars(description = "Lowest share of its category total a driver may have (0.0 - 1.0)")]
    pub minimum_materiality: f64,

    #[schemars(description = "Lowest fraction of non-zero months a driver may have (0.0 - 1.0)")]
    pub minimum_data_quality: f64,

    #[schemars(description = "How many selected drivers are promoted to the primary tier")]
    pub max_primary_drivers: usize,
}

/// Validated selection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SelectionThresholds", into = "SelectionThresholds")]
pub struct SelectionCriteria {
    thresholds: SelectionThresholds,
}

impl SelectionCriteria {
    pub fn new(thresholds: SelectionThresholds) -> Result<Self> {
        let named = [
            ("minimum_score", thresholds.minimum_score),
            ("minimum_materiality", thresholds.minimum_materiality),
            ("minimum_data_quality", thresholds.minimum_data_quality),
        ];

        for (name, value) in named {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(DriverDiscoveryError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }

        if thresholds.max_primary_drivers == 0 {
            return Err(DriverDiscoveryError::InvalidThreshold {
                name: "max_primary_drivers".to_string(),
                value: 0.0,
            });
        }

        Ok(Self { thresholds })
    }

    /// Strict thresholds for live company data.
    pub fn production() -> Self {
        Self {
            thresholds: SelectionThresholds {
                minimum_score: 0.3,
                minimum_materiality: 0.01,
                minimum_data_quality: 0.5,
                max_primary_drivers: 8,
            },
        }
    }

    /// Looser thresholds for sandbox companies with thin, synthetic books.
    ///
    /// `minimum_materiality` is 0.001 rather than 0.005 so that a line at
    /// 0.3% of its category still qualifies under demo, as the documented
    /// selection example requires.
    pub fn demo() -> Self {
        Self {
            thresholds: SelectionThresholds {
                minimum_score: 0.2,
                minimum_materiality: 0.001,
                minimum_data_quality: 0.3,
                max_primary_drivers: 12,
            },
        }
    }

    pub fn minimum_score(&self) -> f64 {
        self.thresholds.minimum_score
    }

    pub fn minimum_materiality(&self) -> f64 {
        self.thresholds.minimum_materiality
    }

    pub fn minimum_data_quality(&self) -> f64 {
        self.thresholds.minimum_data_quality
    }

    pub fn max_primary_drivers(&self) -> usize {
        self.thresholds.max_primary_drivers
    }
}

impl TryFrom<SelectionThresholds> for SelectionCriteria {
    type Error = DriverDiscoveryError;

    fn try_from(thresholds: SelectionThresholds) -> Result<Self> {
        Self::new(thresholds)
    }
}

impl From<SelectionCriteria> for SelectionThresholds {
    fn from(criteria: SelectionCriteria) -> Self {
        criteria.thresholds
    }
}

/// Everything a discovery run needs, built once and passed down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub selection: SelectionCriteria,
}

impl DiscoveryConfig {
    pub fn production() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            selection: SelectionCriteria::production(),
        }
    }

    pub fn demo() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            selection: SelectionCriteria::demo(),
        }
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
