use crate::scoring::DriverScore;
use crate::series::MonthlySeries;
use crate::stats::{cagr, linear_regression, percentile};
use serde::{Deserialize, Serialize};

pub const REVENUE_COUPLING_THRESHOLD: f64 = 0.7;
pub const TREND_PREDICTABILITY_THRESHOLD: f64 = 0.8;
pub const TREND_VARIABILITY_LIMIT: f64 = 0.2;
pub const RANGE_VARIABILITY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Line moves with revenue; projected as a fixed share.
    PercentageOfRevenue {
        /// Share of the line's category total over the analysed period
        historical_ratio: f64,
        confidence: f64,
    },
    /// Line follows a clean linear trend.
    TrendExtrapolation {
        /// OLS slope in currency units per month
        monthly_growth_rate: f64,
        confidence: f64,
    },
    /// Volatile line without a usable signal; projected from its historical
    /// quartiles.
    ScenarioRange {
        conservative: f64,
        base: f64,
        aggressive: f64,
    },
    SimpleGrowth { annual_growth_rate: f64 },
}

impl ForecastMethod {
    pub fn label(&self) -> &'static str {
        match self {
            ForecastMethod::PercentageOfRevenue { .. } => "percentage_of_revenue",
            ForecastMethod::TrendExtrapolation { .. } => "trend_extrapolation",
            ForecastMethod::ScenarioRange { .. } => "scenario_range",
            ForecastMethod::SimpleGrowth { .. } => "simple_growth",
        }
    }
}

/// Picks the forecast method for one driver. Rules are checked in order and
/// the first match wins: revenue coupling, clean trend, high volatility,
/// then plain growth.
pub fn assign_forecast_method(
    series: &MonthlySeries,
    score: &DriverScore,
    correlation_with_revenue: f64,
) -> ForecastMethod {
    let values = series.values();

    if correlation_with_revenue > REVENUE_COUPLING_THRESHOLD {
        return ForecastMethod::PercentageOfRevenue {
            historical_ratio: score.materiality,
            confidence: correlation_with_revenue,
        };
    }

    if score.predictability > TREND_PREDICTABILITY_THRESHOLD && score.variability < TREND_VARIABILITY_LIMIT {
        return ForecastMethod::TrendExtrapolation {
            monthly_growth_rate: linear_regression(&values).slope,
            confidence: score.predictability,
        };
    }

    if score.variability > RANGE_VARIABILITY_THRESHOLD {
        return ForecastMethod::ScenarioRange {
            conservative: percentile(&values, 25.0),
            base: percentile(&values, 50.0),
            aggressive: percentile(&values, 75.0),
        };
    }

    ForecastMethod::SimpleGrowth {
        annual_growth_rate: cagr(&values),
    }
}
