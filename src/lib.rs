//! # Financial Driver Discovery
//!
//! A library for finding the Profit & Loss lines that actually drive a
//! business, and projecting them forward under a handful of scenarios.
//!
//! ## Core Concepts
//!
//! - **Monthly Series**: One P&L line on a shared month axis, carrying its category total
//! - **Driver Score**: Materiality, variability, predictability, growth impact and data quality, plus a weighted composite
//! - **Classification**: Recurring or variable revenue, fixed or variable cost
//! - **Forecast Method**: Percentage of revenue, trend extrapolation, scenario range or simple growth
//! - **Scenario Forecast**: Baseline, growth and downturn projections with confidence bands
//!
//! Every stage is deterministic: the same input and configuration always
//! produce the same drivers and the same projections.
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_driver_discovery::*;
//!
//! let report: FinancialReport = serde_json::from_str(&report_json)?;
//! let discovery = DriverDiscoveryProcessor::discover_from_report(&report, &DiscoveryConfig::production())?;
//!
//! for driver in discovery.primary_drivers() {
//!     println!(
//!         "{}: {:.2} ({:?}, {})",
//!         driver.name(),
//!         driver.score.composite,
//!         driver.classification,
//!         driver.forecast_method.label()
//!     );
//! }
//!
//! let forecast = forecast_scenarios(&discovery, 12)?;
//! println!("Growth net income: {:.0}", forecast.total_net_income(Scenario::Growth));
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod forecast;
pub mod ingestion;
pub mod methods;
pub mod schema;
pub mod scoring;
pub mod selection;
pub mod series;
pub mod stats;
pub mod utils;

pub use classifier::{classify, correlation_with_revenue, total_revenue_series, Classification};
pub use config::{DiscoveryConfig, ScoringConfig, ScoringWeights, SelectionCriteria, SelectionThresholds};
pub use error::{DriverDiscoveryError, Result};
pub use forecast::{
    scenario_multiplier, ConfidenceBand, Scenario, ScenarioForecast, ScenarioForecastEngine, ScenarioProjection,
};
pub use ingestion::normalize_report;
pub use methods::{assign_forecast_method, ForecastMethod};
pub use schema::*;
pub use scoring::{DriverScore, DriverScorer};
pub use selection::{
    Confidence, DataQualityLabel, DiscoveredDriver, DiscoverySummary, DriverSelector, DriverTier,
};
pub use series::{validate_month_axis, Category, MonthlyPoint, MonthlySeries};

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// The outcome of one discovery run over one company's reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverDiscovery {
    /// The analysed month axis, shared by every driver
    pub months: Vec<NaiveDate>,
    /// Total revenue per month on the same axis
    pub total_revenue: Vec<f64>,
    /// Primary drivers first, then secondary
    pub drivers: Vec<DiscoveredDriver>,
    pub summary: DiscoverySummary,
}

impl DriverDiscovery {
    pub fn primary_drivers(&self) -> impl Iterator<Item = &DiscoveredDriver> {
        self.drivers.iter().filter(|d| d.tier == DriverTier::Primary)
    }

    pub fn secondary_drivers(&self) -> impl Iterator<Item = &DiscoveredDriver> {
        self.drivers.iter().filter(|d| d.tier == DriverTier::Secondary)
    }

    pub fn driver(&self, name: &str) -> Option<&DiscoveredDriver> {
        self.drivers.iter().find(|d| d.name() == name)
    }
}

pub struct DriverDiscoveryProcessor;

impl DriverDiscoveryProcessor {
    pub fn discover(series: &[MonthlySeries], config: &DiscoveryConfig) -> Result<DriverDiscovery> {
        let months = validate_month_axis(series)?;

        info!(
            "Discovering drivers across {} lines over {} months",
            series.len(),
            months.len()
        );

        let scores = DriverScorer::new(config.scoring).score_batch(series)?;
        let total_revenue = total_revenue_series(series);
        let selector = DriverSelector::new(config.selection);

        let mut candidates = Vec::new();
        for (line, score) in series.iter().zip(&scores) {
            if !selector.is_selected(score) {
                debug!(
                    "'{}' not selected: composite {:.3}, materiality {:.4}, data quality {:.2}",
                    line.name, score.composite, score.materiality, score.data_quality
                );
                continue;
            }

            let correlation = correlation_with_revenue(line, &total_revenue);
            let confidence_score = selection::confidence_score(score);

            candidates.push(DiscoveredDriver {
                series: line.clone(),
                score: *score,
                correlation_with_revenue: correlation,
                classification: classify(line.category, score.variability, correlation),
                confidence: Confidence::from_score(confidence_score),
                confidence_score,
                coverage: selection::driver_coverage(score),
                forecast_method: assign_forecast_method(line, score, correlation),
                tier: DriverTier::Secondary,
            });
        }

        if candidates.is_empty() {
            warn!("No line met the selection thresholds");
        }

        let drivers = selector.partition(candidates);
        let summary = selection::summarize(&drivers, &scores, months.len());

        info!(
            "Selected {} drivers ({} primary); business coverage {:.1}%, data quality {:?}",
            summary.drivers_found,
            summary.primary_drivers,
            summary.business_coverage_percent,
            summary.data_quality_label
        );

        Ok(DriverDiscovery {
            months,
            total_revenue,
            drivers,
            summary,
        })
    }

    pub fn discover_from_report(report: &FinancialReport, config: &DiscoveryConfig) -> Result<DriverDiscovery> {
        if let Some(name) = &report.organization_name {
            info!("Normalizing P&L report for organization: {}", name);
        }
        let series = normalize_report(report)?;
        Self::discover(&series, config)
    }

    pub fn forecast(discovery: &DriverDiscovery, horizon_months: u32) -> Result<ScenarioForecast> {
        Ok(ScenarioForecastEngine::new(discovery, horizon_months)?.forecast())
    }
}

pub fn discover_drivers(series: &[MonthlySeries], config: &DiscoveryConfig) -> Result<DriverDiscovery> {
    DriverDiscoveryProcessor::discover(series, config)
}

pub fn forecast_scenarios(discovery: &DriverDiscovery, horizon_months: u32) -> Result<ScenarioForecast> {
    DriverDiscoveryProcessor::forecast(discovery, horizon_months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::get_month_ends_in_period;

    fn axis(n: usize) -> Vec<NaiveDate> {
        get_month_ends_in_period(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
        )
        .into_iter()
        .take(n)
        .collect()
    }

    fn sum(a: &[f64], b: &[f64]) -> Vec<f64> {
        a.iter().zip(b).map(|(x, y)| x + y).collect()
    }

    fn small_business() -> Vec<MonthlySeries> {
        let months = axis(12);
        let product: Vec<f64> = (0..12).map(|i| 20_000.0 + 500.0 * i as f64).collect();
        let consulting = vec![
            0.0, 750.0, 0.0, 1_250.0, 0.0, 0.0, 1_000.0, 0.0, 1_500.0, 0.0, 500.0, 0.0,
        ];
        let materials: Vec<f64> = product.iter().map(|p| p * 0.35).collect();
        let rent = vec![5_000.0; 12];
        let bank_fees = vec![15.0; 12];

        let revenue_total = sum(&product, &consulting);
        let expense_total = sum(&sum(&materials, &rent), &bank_fees);

        vec![
            MonthlySeries::from_values("Product Sales", Category::Revenue, &months, &product, revenue_total.clone())
                .unwrap(),
            MonthlySeries::from_values("Consulting", Category::Revenue, &months, &consulting, revenue_total).unwrap(),
            MonthlySeries::from_values("Materials", Category::Expense, &months, &materials, expense_total.clone())
                .unwrap(),
            MonthlySeries::from_values("Rent", Category::Expense, &months, &rent, expense_total.clone()).unwrap(),
            MonthlySeries::from_values("Bank Fees", Category::Expense, &months, &bank_fees, expense_total).unwrap(),
        ]
    }

    #[test]
    fn test_end_to_end_discovery() {
        let discovery = discover_drivers(&small_business(), &DiscoveryConfig::production()).unwrap();

        assert_eq!(discovery.months.len(), 12);
        assert_eq!(discovery.summary.lines_evaluated, 5);
        assert!(discovery.driver("Bank Fees").is_none());
        // A flat line has no trend or growth, so its composite stays under the production bar.
        assert!(discovery.driver("Rent").is_none());

        let product = discovery.driver("Product Sales").unwrap();
        assert_eq!(product.classification, Classification::RecurringRevenue);
        assert_eq!(product.tier, DriverTier::Primary);

        let materials = discovery.driver("Materials").unwrap();
        assert_eq!(materials.classification, Classification::VariableCost);
        assert!(matches!(
            materials.forecast_method,
            ForecastMethod::PercentageOfRevenue { .. }
        ));

    }

    #[test]
    fn test_demo_thresholds_keep_fixed_costs() {
        let discovery = discover_drivers(&small_business(), &DiscoveryConfig::demo()).unwrap();
        let rent = discovery.driver("Rent").unwrap();
        assert_eq!(rent.classification, Classification::FixedCost);
        assert_eq!(rent.correlation_with_revenue, 0.0);
        assert!(discovery.driver("Bank Fees").is_none());
    }

    #[test]
    fn test_drivers_are_ordered_by_tier_then_score() {
        let discovery = discover_drivers(&small_business(), &DiscoveryConfig::demo()).unwrap();

        let tiers: Vec<DriverTier> = discovery.drivers.iter().map(|d| d.tier).collect();
        let first_secondary = tiers.iter().position(|t| *t == DriverTier::Secondary).unwrap_or(tiers.len());
        assert!(tiers[first_secondary..].iter().all(|t| *t == DriverTier::Secondary));

        let primary: Vec<&DiscoveredDriver> = discovery.primary_drivers().collect();
        for pair in primary.windows(2) {
            assert!(pair[0].score.composite >= pair[1].score.composite);
        }
    }

    #[test]
    fn test_discovery_is_deterministic() {
        let series = small_business();
        let config = DiscoveryConfig::demo();
        let first = discover_drivers(&series, &config).unwrap();
        let second = discover_drivers(&series, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            discover_drivers(&[], &DiscoveryConfig::production()),
            Err(DriverDiscoveryError::EmptySeriesSet)
        ));
    }

    #[test]
    fn test_mismatched_axis_is_rejected() {
        let mut series = small_business();
        let short = axis(6);
        series.push(
            MonthlySeries::from_values("Late Line", Category::Expense, &short, &[1.0; 6], vec![10.0; 6]).unwrap(),
        );
        assert!(matches!(
            discover_drivers(&series, &DiscoveryConfig::production()),
            Err(DriverDiscoveryError::MismatchedMonthAxis { .. })
        ));
    }

    #[test]
    fn test_forecast_uses_discovered_axis() {
        let discovery = discover_drivers(&small_business(), &DiscoveryConfig::production()).unwrap();
        let forecast = forecast_scenarios(&discovery, 3).unwrap();

        let baseline = forecast.projections(Scenario::Baseline);
        assert_eq!(baseline.len(), 3);
        assert_eq!(baseline[0].month, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(forecast_scenarios(&discovery, 0).is_err());
    }
}
