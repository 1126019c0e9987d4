use crate::classifier::Classification;
use crate::config::SelectionCriteria;
use crate::methods::ForecastMethod;
use crate::scoring::DriverScore;
use crate::series::{Category, MonthlySeries};
use crate::stats::mean;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            Confidence::High
        } else if score > 0.4 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverTier {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredDriver {
    pub series: MonthlySeries,
    pub score: DriverScore,
    pub correlation_with_revenue: f64,
    pub classification: Classification,
    pub confidence: Confidence,
    /// Mean of the four confidence inputs, in `[0, 1]`
    pub confidence_score: f64,
    /// Percentage of the driver's own category total
    pub coverage: f64,
    pub forecast_method: ForecastMethod,
    pub tier: DriverTier,
}

impl DiscoveredDriver {
    pub fn name(&self) -> &str {
        &self.series.name
    }

    pub fn category(&self) -> Category {
        self.series.category
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQualityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl DataQualityLabel {
    pub fn from_score(data_quality: f64) -> Self {
        if data_quality >= 0.9 {
            DataQualityLabel::Excellent
        } else if data_quality >= 0.75 {
            DataQualityLabel::Good
        } else if data_quality >= 0.5 {
            DataQualityLabel::Fair
        } else {
            DataQualityLabel::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySummary {
    pub drivers_found: usize,
    pub primary_drivers: usize,
    pub secondary_drivers: usize,
    pub lines_evaluated: usize,
    pub revenue_coverage_percent: f64,
    pub expense_coverage_percent: f64,
    pub business_coverage_percent: f64,
    pub average_confidence_percent: f64,
    pub data_quality_label: DataQualityLabel,
    pub months_analyzed: usize,
}

pub struct DriverSelector {
    criteria: SelectionCriteria,
}

impl DriverSelector {
    pub fn new(criteria: SelectionCriteria) -> Self {
        Self { criteria }
    }

    pub fn is_selected(&self, score: &DriverScore) -> bool {
        score.composite >= self.criteria.minimum_score()
            && score.materiality >= self.criteria.minimum_materiality()
            && score.data_quality >= self.criteria.minimum_data_quality()
    }

    /// Orders drivers into primary and secondary tiers.
    ///
    /// Primary slots alternate between the strongest remaining revenue and
    /// expense drivers so one category cannot crowd out the other. Each tier
    /// is sorted by composite score, ties broken by name.
    pub fn partition(&self, mut drivers: Vec<DiscoveredDriver>) -> Vec<DiscoveredDriver> {
        drivers.sort_by(rank_order);

        let (mut revenue, mut expense): (Vec<_>, Vec<_>) = drivers
            .into_iter()
            .partition(|d| d.category() == Category::Revenue);
        revenue.reverse();
        expense.reverse();

        let mut primary = Vec::new();
        let mut take_revenue = true;
        while primary.len() < self.criteria.max_primary_drivers() {
            let next = if take_revenue {
                revenue.pop().or_else(|| expense.pop())
            } else {
                expense.pop().or_else(|| revenue.pop())
            };
            match next {
                Some(driver) => primary.push(driver),
                None => break,
            }
            take_revenue = !take_revenue;
        }

        let mut secondary: Vec<DiscoveredDriver> = revenue.into_iter().chain(expense).collect();

        primary.sort_by(rank_order);
        secondary.sort_by(rank_order);

        for driver in &mut primary {
            driver.tier = DriverTier::Primary;
        }
        for driver in &mut secondary {
            driver.tier = DriverTier::Secondary;
        }

        primary.extend(secondary);
        primary
    }
}

fn rank_order(a: &DiscoveredDriver, b: &DiscoveredDriver) -> Ordering {
    b.score
        .composite
        .total_cmp(&a.score.composite)
        .then_with(|| a.name().cmp(b.name()))
}

/// Coverage of one driver: its materiality as a percentage of its own
/// category total.
pub fn driver_coverage(score: &DriverScore) -> f64 {
    score.materiality * 100.0
}

pub fn category_coverage(drivers: &[DiscoveredDriver], category: Category) -> f64 {
    drivers
        .iter()
        .filter(|d| d.category() == category)
        .map(|d| d.coverage)
        .sum()
}

/// Averages revenue and expense coverage, since the two are measured
/// against different totals. Capped at 100.
pub fn business_coverage(drivers: &[DiscoveredDriver]) -> f64 {
    let revenue = category_coverage(drivers, Category::Revenue);
    let expense = category_coverage(drivers, Category::Expense);
    ((revenue + expense) / 2.0).min(100.0)
}

pub fn confidence_score(score: &DriverScore) -> f64 {
    (score.predictability
        + score.data_quality
        + (score.materiality * 2.0).min(1.0)
        + (1.0 - score.variability))
        / 4.0
}

pub fn summarize(
    drivers: &[DiscoveredDriver],
    all_scores: &[DriverScore],
    months_analyzed: usize,
) -> DiscoverySummary {
    let primary_drivers = drivers.iter().filter(|d| d.tier == DriverTier::Primary).count();

    let average_confidence_percent = if drivers.is_empty() {
        0.0
    } else {
        drivers.iter().map(|d| d.confidence_score).sum::<f64>() / drivers.len() as f64 * 100.0
    };

    let quality_basis: Vec<f64> = if drivers.is_empty() {
        all_scores.iter().map(|s| s.data_quality).collect()
    } else {
        drivers.iter().map(|d| d.score.data_quality).collect()
    };

    DiscoverySummary {
        drivers_found: drivers.len(),
        primary_drivers,
        secondary_drivers: drivers.len() - primary_drivers,
        lines_evaluated: all_scores.len(),
        revenue_coverage_percent: category_coverage(drivers, Category::Revenue).min(100.0),
        expense_coverage_percent: category_coverage(drivers, Category::Expense).min(100.0),
        business_coverage_percent: business_coverage(drivers),
        average_confidence_percent,
        data_quality_label: DataQualityLabel::from_score(mean(&quality_basis)),
        months_analyzed,
    }
}
