use crate::error::{DriverDiscoveryError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[schemars(description = "Income lines: sales, service fees, other income")]
    Revenue,

    #[schemars(description = "Cost of sales and operating expense lines")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// Month-end date of the reporting month
    pub month: NaiveDate,
    pub value: f64,
}

/// One P&L line as an ordered monthly series.
///
/// Every series in an analysis shares the same month axis. Months without
/// activity carry `0.0` rather than being omitted. `business_total` holds
/// the category total (all revenue or all expense lines) for each month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRecord")]
pub struct MonthlySeries {
    pub name: String,
    pub category: Category,
    points: Vec<MonthlyPoint>,
    business_total: Vec<f64>,
}

#[derive(Deserialize)]
struct SeriesRecord {
    name: String,
    category: Category,
    points: Vec<MonthlyPoint>,
    business_total: Vec<f64>,
}

impl TryFrom<SeriesRecord> for MonthlySeries {
    type Error = DriverDiscoveryError;

    fn try_from(record: SeriesRecord) -> Result<Self> {
        Self::new(record.name, record.category, record.points, record.business_total)
    }
}

impl MonthlySeries {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        points: Vec<MonthlyPoint>,
        business_total: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();

        if points.is_empty() {
            return Err(DriverDiscoveryError::EmptySeries(name));
        }

        if points.len() != business_total.len() {
            return Err(DriverDiscoveryError::InvalidSeries {
                series: name,
                details: format!(
                    "{} monthly values but {} business totals",
                    points.len(),
                    business_total.len()
                ),
            });
        }

        if points.windows(2).any(|w| w[0].month >= w[1].month) {
            return Err(DriverDiscoveryError::InvalidSeries {
                series: name,
                details: "months must be strictly chronological".to_string(),
            });
        }

        if points.iter().any(|p| !p.value.is_finite()) || business_total.iter().any(|v| !v.is_finite()) {
            return Err(DriverDiscoveryError::InvalidSeries {
                series: name,
                details: "values must be finite".to_string(),
            });
        }

        Ok(Self {
            name,
            category,
            points,
            business_total,
        })
    }

    /// Builds a series from parallel month and value slices.
    pub fn from_values(
        name: impl Into<String>,
        category: Category,
        months: &[NaiveDate],
        values: &[f64],
        business_total: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if months.len() != values.len() {
            return Err(DriverDiscoveryError::InvalidSeries {
                series: name,
                details: format!("{} months but {} values", months.len(), values.len()),
            });
        }

        let points = months
            .iter()
            .zip(values)
            .map(|(&month, &value)| MonthlyPoint { month, value })
            .collect();

        Self::new(name, category, points, business_total)
    }

    pub fn points(&self) -> &[MonthlyPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.month).collect()
    }

    pub fn business_total(&self) -> &[f64] {
        &self.business_total
    }

    pub fn month_count(&self) -> usize {
        self.points.len()
    }

    pub fn first_month(&self) -> NaiveDate {
        self.points[0].month
    }

    pub fn last_month(&self) -> NaiveDate {
        self.points[self.points.len() - 1].month
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }

    pub fn business_total_sum(&self) -> f64 {
        self.business_total.iter().sum()
    }

    pub fn shares_axis_with(&self, other: &MonthlySeries) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.month == b.month)
    }
}

/// Checks that every series shares the month axis of the first one.
pub fn validate_month_axis(series: &[MonthlySeries]) -> Result<Vec<NaiveDate>> {
    let reference = series.first().ok_or(DriverDiscoveryError::EmptySeriesSet)?;

    for candidate in &series[1..] {
        if !candidate.shares_axis_with(reference) {
            return Err(DriverDiscoveryError::MismatchedMonthAxis {
                series: candidate.name.clone(),
                expected: describe_axis(reference),
                found: describe_axis(candidate),
            });
        }
    }

    Ok(reference.months())
}

fn describe_axis(series: &MonthlySeries) -> String {
    format!(
        "{} months {}..{}",
        series.month_count(),
        series.first_month(),
        series.last_month()
    )
}
