use crate::config::ScoringConfig;
use crate::error::Result;
use crate::series::{validate_month_axis, MonthlySeries};
use crate::stats::{cagr, coefficient_of_variation, linear_regression, MIN_MONTHS_FOR_GROWTH};
use log::debug;
use serde::{Deserialize, Serialize};

const VARIABILITY_CV_CAP: f64 = 5.0;
const MIN_POINTS_FOR_SHAPE: usize = 3;
const GROWTH_IMPACT_SCALE: f64 = 5.0;

/// Five independent scores for one line plus their weighted composite.
/// Every field lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverScore {
    /// Share of the line's category total over the period
    pub materiality: f64,
    /// Capped coefficient of variation, normalised
    pub variability: f64,
    /// R² of a linear trend fit
    pub predictability: f64,
    /// Scaled absolute CAGR
    pub growth_impact: f64,
    /// Fraction of months with activity
    pub data_quality: f64,
    pub composite: f64,
}

pub struct DriverScorer {
    config: ScoringConfig,
}

impl DriverScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, series: &MonthlySeries) -> DriverScore {
        let values = series.values();

        let materiality = materiality(series);
        let variability = variability(&series.name, &values);
        let predictability = predictability(&series.name, &values);
        let growth_impact = growth_impact(&series.name, &values);
        let data_quality = data_quality(&values);

        let w = self.config.weights();
        let composite = (materiality * w.materiality
            + variability * w.variability
            + predictability * w.predictability
            + growth_impact * w.growth_impact
            + data_quality * w.data_quality)
            .clamp(0.0, 1.0);

        DriverScore {
            materiality,
            variability,
            predictability,
            growth_impact,
            data_quality,
            composite,
        }
    }

    /// Scores a batch of lines that must share one month axis.
    pub fn score_batch(&self, series: &[MonthlySeries]) -> Result<Vec<DriverScore>> {
        validate_month_axis(series)?;
        Ok(series.iter().map(|s| self.score(s)).collect())
    }
}

/// `|line total| / |category total|`, clamped to `[0, 1]`.
pub fn materiality(series: &MonthlySeries) -> f64 {
    let denominator = series.business_total_sum().abs();
    if denominator == 0.0 {
        debug!("{}: category total is zero, materiality set to 0", series.name);
        return 0.0;
    }
    (series.total().abs() / denominator).clamp(0.0, 1.0)
}

pub fn variability(name: &str, values: &[f64]) -> f64 {
    let active = values.iter().filter(|v| **v != 0.0).count();
    if active < MIN_POINTS_FOR_SHAPE {
        debug!("{}: {} active months, variability set to 0", name, active);
        return 0.0;
    }
    coefficient_of_variation(values).min(VARIABILITY_CV_CAP) / VARIABILITY_CV_CAP
}

/// `max(0, R²)` of the linear trend. A flat line has nothing to fit and
/// scores `0`.
pub fn predictability(name: &str, values: &[f64]) -> f64 {
    if values.len() < MIN_POINTS_FOR_SHAPE {
        debug!("{}: {} months, predictability set to 0", name, values.len());
        return 0.0;
    }
    linear_regression(values).r_squared.clamp(0.0, 1.0)
}

pub fn growth_impact(name: &str, values: &[f64]) -> f64 {
    if values.len() < MIN_MONTHS_FOR_GROWTH {
        debug!("{}: {} months, growth impact set to 0", name, values.len());
        return 0.0;
    }
    (cagr(values).abs() * GROWTH_IMPACT_SCALE).min(1.0)
}

pub fn data_quality(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v != 0.0).count() as f64 / values.len() as f64
}
