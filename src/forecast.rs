use crate::classifier::Classification;
use crate::error::{DriverDiscoveryError, Result};
use crate::methods::ForecastMethod;
use crate::selection::{Confidence, DiscoveredDriver};
use crate::series::Category;
use crate::stats::{linear_regression, mean};
use crate::utils::following_month_ends;
use crate::DriverDiscovery;
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_HORIZON_MONTHS: u32 = 120;

/// Months averaged to establish a line's current run-rate.
const RECENT_LEVEL_MONTHS: usize = 3;
const MAX_MONTHLY_REVENUE_GROWTH: f64 = 0.05;
const MIN_ANNUAL_GROWTH: f64 = -0.5;
const MAX_ANNUAL_GROWTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Baseline,
    Growth,
    Downturn,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Baseline, Scenario::Growth, Scenario::Downturn];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Baseline => "baseline",
            Scenario::Growth => "growth",
            Scenario::Downturn => "downturn",
        }
    }
}

/// How a scenario bends a driver's base-case value.
///
/// Growth lifts revenue (volatile revenue more than recurring) while
/// variable costs ease; downturn mirrors it. Fixed costs hold in every
/// scenario.
pub fn scenario_multiplier(scenario: Scenario, classification: Classification) -> f64 {
    match (scenario, classification) {
        (Scenario::Baseline, _) => 1.0,
        (Scenario::Growth, Classification::RecurringRevenue) => 1.10,
        (Scenario::Growth, Classification::VariableRevenue) => 1.20,
        (Scenario::Growth, Classification::FixedCost) => 1.0,
        (Scenario::Growth, Classification::VariableCost) => 0.95,
        (Scenario::Downturn, Classification::RecurringRevenue) => 0.90,
        (Scenario::Downturn, Classification::VariableRevenue) => 0.80,
        (Scenario::Downturn, Classification::FixedCost) => 1.0,
        (Scenario::Downturn, Classification::VariableCost) => 1.05,
    }
}

/// Relative one-month uncertainty of a driver at each confidence level.
fn base_uncertainty(confidence: Confidence) -> f64 {
    match confidence {
        Confidence::High => 0.05,
        Confidence::Medium => 0.10,
        Confidence::Low => 0.20,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProjection {
    pub scenario: Scenario,
    pub month: NaiveDate,
    /// 1-based distance from the last analysed month
    pub month_index: u32,
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    /// Range around net income
    pub confidence_band: ConfidenceBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioForecast {
    pub horizon_months: u32,
    pub scenarios: BTreeMap<Scenario, Vec<ScenarioProjection>>,
}

impl ScenarioForecast {
    pub fn projections(&self, scenario: Scenario) -> &[ScenarioProjection] {
        self.scenarios
            .get(&scenario)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_net_income(&self, scenario: Scenario) -> f64 {
        self.projections(scenario).iter().map(|p| p.net_income).sum()
    }
}

/// Projects discovered drivers forward under each scenario.
///
/// Every projected value is a pure function of the driver's history, its
/// forecast method and the month index, so months and scenarios can be
/// evaluated in any order.
pub struct ScenarioForecastEngine<'a> {
    discovery: &'a DriverDiscovery,
    horizon_months: u32,
    revenue_growth: f64,
}

impl<'a> ScenarioForecastEngine<'a> {
    pub fn new(discovery: &'a DriverDiscovery, horizon_months: u32) -> Result<Self> {
        if horizon_months == 0 || horizon_months > MAX_HORIZON_MONTHS {
            return Err(DriverDiscoveryError::InvalidHorizon(horizon_months));
        }

        Ok(Self {
            discovery,
            horizon_months,
            revenue_growth: monthly_revenue_growth(&discovery.total_revenue),
        })
    }

    /// Growth of total revenue `t` months past the analysed period, relative
    /// to its current run-rate.
    pub fn revenue_index(&self, month_index: u32) -> f64 {
        (1.0 + self.revenue_growth).powi(month_index as i32)
    }

    /// The driver's value under its forecast method before any scenario
    /// adjustment.
    pub fn base_value(&self, driver: &DiscoveredDriver, month_index: u32) -> f64 {
        let values = driver.series.values();
        let t = month_index as f64;

        let projected = match driver.forecast_method {
            ForecastMethod::PercentageOfRevenue {
                historical_ratio, ..
            } => historical_ratio * recent_level(driver.series.business_total()) * self.revenue_index(month_index),
            ForecastMethod::TrendExtrapolation {
                monthly_growth_rate,
                ..
            } => {
                let fit = linear_regression(&values);
                let last_index = (values.len() - 1) as f64;
                fit.value_at(last_index) + monthly_growth_rate * t
            }
            ForecastMethod::ScenarioRange { base, .. } => base,
            ForecastMethod::SimpleGrowth { annual_growth_rate } => {
                let rate = annual_growth_rate.clamp(MIN_ANNUAL_GROWTH, MAX_ANNUAL_GROWTH);
                recent_level(&values) * (1.0 + rate).powf(t / 12.0)
            }
        };

        if values.iter().all(|v| *v >= 0.0) {
            projected.max(0.0)
        } else {
            projected
        }
    }

    pub fn project_driver(&self, driver: &DiscoveredDriver, scenario: Scenario, month_index: u32) -> f64 {
        self.base_value(driver, month_index) * scenario_multiplier(scenario, driver.classification)
    }

    pub fn project_month(&self, scenario: Scenario, month_index: u32, month: NaiveDate) -> ScenarioProjection {
        let mut revenue = 0.0;
        let mut expenses = 0.0;
        let mut variance = 0.0;

        for driver in &self.discovery.drivers {
            let value = self.project_driver(driver, scenario, month_index);
            match driver.category() {
                Category::Revenue => revenue += value,
                Category::Expense => expenses += value,
            }

            let half_width = band_half_width(driver, value, month_index);
            variance += half_width * half_width;
        }

        let net_income = revenue - expenses;
        let spread = variance.sqrt();

        ScenarioProjection {
            scenario,
            month,
            month_index,
            revenue,
            expenses,
            net_income,
            confidence_band: ConfidenceBand {
                low: net_income - spread,
                high: net_income + spread,
            },
        }
    }

    pub fn forecast(&self) -> ScenarioForecast {
        info!(
            "Projecting {} drivers over {} months for {} scenarios",
            self.discovery.drivers.len(),
            self.horizon_months,
            Scenario::ALL.len()
        );
        if self.discovery.drivers.is_empty() {
            warn!("No drivers selected; every projected month will be zero");
        }

        let last_month = self.discovery.months.last().copied().unwrap_or(NaiveDate::MIN);
        let months = following_month_ends(last_month, self.horizon_months as usize);

        let scenarios = Scenario::ALL
            .iter()
            .map(|&scenario| {
                let projections = months
                    .iter()
                    .zip(1..)
                    .map(|(&month, month_index)| self.project_month(scenario, month_index, month))
                    .collect();
                (scenario, projections)
            })
            .collect();

        ScenarioForecast {
            horizon_months: self.horizon_months,
            scenarios,
        }
    }
}

/// Mean of the last few months; the run-rate a projection starts from.
fn recent_level(values: &[f64]) -> f64 {
    let start = values.len().saturating_sub(RECENT_LEVEL_MONTHS);
    mean(&values[start..])
}

fn monthly_revenue_growth(total_revenue: &[f64]) -> f64 {
    let level = recent_level(total_revenue);
    if level == 0.0 {
        return 0.0;
    }
    let slope = linear_regression(total_revenue).slope;
    (slope / level.abs()).clamp(-MAX_MONTHLY_REVENUE_GROWTH, MAX_MONTHLY_REVENUE_GROWTH)
}

/// Widens with the square root of the horizon and with lower driver
/// confidence. Range drivers never report less than half their quartile
/// spread.
fn band_half_width(driver: &DiscoveredDriver, value: f64, month_index: u32) -> f64 {
    let horizon = (month_index as f64).sqrt();
    let relative = value.abs() * base_uncertainty(driver.confidence) * horizon;

    match driver.forecast_method {
        ForecastMethod::ScenarioRange {
            conservative,
            aggressive,
            ..
        } => relative.max((aggressive - conservative).abs() / 2.0),
        _ => relative,
    }
}
