use crate::series::{Category, MonthlySeries};
use crate::stats::pearson_correlation;
use serde::{Deserialize, Serialize};

/// Revenue lines steadier than this are treated as recurring.
pub const RECURRING_VARIABILITY_LIMIT: f64 = 0.2;

/// Expense lines moving with revenue at least this strongly are variable costs.
pub const VARIABLE_COST_CORRELATION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    RecurringRevenue,
    VariableRevenue,
    FixedCost,
    VariableCost,
}

impl Classification {
    pub fn category(&self) -> Category {
        match self {
            Classification::RecurringRevenue | Classification::VariableRevenue => Category::Revenue,
            Classification::FixedCost | Classification::VariableCost => Category::Expense,
        }
    }
}

pub fn classify(category: Category, variability: f64, correlation_with_revenue: f64) -> Classification {
    match category {
        Category::Revenue if variability < RECURRING_VARIABILITY_LIMIT => Classification::RecurringRevenue,
        Category::Revenue => Classification::VariableRevenue,
        Category::Expense if correlation_with_revenue.abs() > VARIABLE_COST_CORRELATION => {
            Classification::VariableCost
        }
        Category::Expense => Classification::FixedCost,
    }
}

/// Pearson correlation of a line against total revenue on the same axis.
pub fn correlation_with_revenue(series: &MonthlySeries, total_revenue: &[f64]) -> f64 {
    pearson_correlation(&series.values(), total_revenue)
}

/// The total revenue series for a batch that shares one month axis.
///
/// Every revenue line carries the revenue category total, so the first one
/// found supplies it. A batch with no revenue lines has zero revenue.
pub fn total_revenue_series(series: &[MonthlySeries]) -> Vec<f64> {
    let months = series.first().map(|s| s.month_count()).unwrap_or(0);
    series
        .iter()
        .find(|s| s.category == Category::Revenue)
        .map(|s| s.business_total().to_vec())
        .unwrap_or_else(|| vec![0.0; months])
}
