//! Descriptive statistics over monthly values.
//!
//! Every function here is total: degenerate inputs (empty slices, zero
//! variance, zero denominators) resolve to `0.0` instead of `NaN` or
//! infinity, so scores built on top of them stay comparable and
//! serializable.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation using the population variance (divides by `n`).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values).abs();
    if m == 0.0 {
        return 0.0;
    }
    population_std_dev(values) / m
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; `0.0` when the series has no variance.
    pub r_squared: f64,
}

impl LinearFit {
    pub fn value_at(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// Ordinary least squares fit of `values` against a zero-based month index.
pub fn linear_regression(values: &[f64]) -> LinearFit {
    let n = values.len();
    if n == 0 {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
        };
    }

    let x_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }

    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = values.iter().map(|y| (y - y_mean).powi(2)).sum();
    let r_squared = if ss_tot == 0.0 {
        0.0
    } else {
        let ss_res: f64 = values
            .iter()
            .enumerate()
            .map(|(i, y)| (y - (intercept + slope * i as f64)).powi(2))
            .sum();
        1.0 - ss_res / ss_tot
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
    }
}

/// Pearson correlation of two equally long series.
///
/// Returns `0.0` when either side is constant or the lengths differ.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.is_empty() {
        return 0.0;
    }

    let x_mean = mean(xs);
    let y_mean = mean(ys);

    let mut covariance = 0.0;
    let mut x_var = 0.0;
    let mut y_var = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        covariance += dx * dy;
        x_var += dx * dx;
        y_var += dy * dy;
    }

    let denominator = (x_var * y_var).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (covariance / denominator).clamp(-1.0, 1.0)
}

/// Percentile with linear interpolation between closest ranks.
///
/// `p` is expressed in `[0, 100]`.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Minimum number of months before a growth rate is meaningful.
pub const MIN_MONTHS_FOR_GROWTH: usize = 6;

/// Compound annual growth rate from the first non-zero month to the last
/// month, annualised over the whole period (`years = months / 12`).
///
/// Returns `0.0` with fewer than six months or when no month is non-zero.
pub fn cagr(values: &[f64]) -> f64 {
    if values.len() < MIN_MONTHS_FOR_GROWTH {
        return 0.0;
    }

    let first = match values.iter().find(|v| **v != 0.0) {
        Some(v) => v.abs(),
        None => return 0.0,
    };
    let last = values[values.len() - 1].abs();
    let years = values.len() as f64 / 12.0;

    let rate = (last / first).powf(1.0 / years) - 1.0;
    if rate.is_finite() {
        rate
    } else {
        0.0
    }
}
