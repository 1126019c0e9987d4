use crate::error::{DriverDiscoveryError, Result};
use chrono::{Datelike, Days, NaiveDate};

pub fn next_month_end(date: NaiveDate) -> NaiveDate {
    let year = if date.month() == 12 {
        date.year() + 1
    } else {
        date.year()
    };

    let month = if date.month() == 12 {
        1
    } else {
        date.month() + 1
    };

    last_day_of_month(year, month)
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(NaiveDate::MAX)
}

/// Month-ends from the end of `start`'s month through `end`.
///
/// Stops early at the last representable month.
pub fn get_month_ends_in_period(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();

    let mut current = last_day_of_month(start.year(), start.month());
    while current <= end {
        if current >= start {
            dates.push(current);
        }
        let next = next_month_end(current);
        if next <= current {
            break;
        }
        current = next;
    }

    dates
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// The `n` month-ends that follow `last`, in order. Fewer are returned when
/// the calendar runs out.
pub fn following_month_ends(last: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut current = last;
    for _ in 0..n {
        let next = next_month_end(current);
        if next <= current {
            break;
        }
        dates.push(next);
        current = next;
    }
    dates
}

/// Parses a report column header into the month-end date it covers.
///
/// Accepts "YYYY-MM", "YYYY-MM-DD", "Jan 2023" and "January 2023".
pub fn parse_month_header(header: &str) -> Result<NaiveDate> {
    let trimmed = header.trim();

    let parsed = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("01 {}", trimmed), "%d %b %Y"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("01 {}", trimmed), "%d %B %Y"))
        .map_err(|_| {
            DriverDiscoveryError::DateError(format!(
                "Invalid month header: '{}'. Expected YYYY-MM or 'Mon YYYY'",
                header
            ))
        })?;

    Ok(last_day_of_month(parsed.year(), parsed.month()))
}

/// Parses a money cell as exported by accounting reports.
///
/// Blank cells and "-" are zero, "(1,200.00)" is negative. Returns `None`
/// when the cell holds something other than a number.
pub fn parse_money_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Some(0.0);
    }

    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '€' | '£' | ' '))
        .collect();

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_month_end() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        let next = next_month_end(date);
        assert_eq!(next, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());

        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let next = next_month_end(date);
        assert_eq!(next, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            last_day_of_month(2023, 4),
            NaiveDate::from_ymd_opt(2023, 4, 30).unwrap()
        );
    }

    #[test]
    fn test_month_ends_fill_gaps() {
        let start = NaiveDate::from_ymd_opt(2023, 11, 30).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let dates = get_month_ends_in_period(start, end);
        assert_eq!(dates.len(), 4);
        assert_eq!(months_between(start, end), 3);
    }

    #[test]
    fn test_month_ends_stop_at_calendar_limit() {
        let end = NaiveDate::MAX;
        let start = end.with_day(1).unwrap();
        assert_eq!(get_month_ends_in_period(start, end), vec![end]);
        assert!(following_month_ends(end, 3).is_empty());
    }

    #[test]
    fn test_following_month_ends() {
        let last = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let dates = following_month_ends(last, 3);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_month_header_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 2, 28).unwrap();
        assert_eq!(parse_month_header("2023-02").unwrap(), expected);
        assert_eq!(parse_month_header("2023-02-01").unwrap(), expected);
        assert_eq!(parse_month_header("Feb 2023").unwrap(), expected);
        assert_eq!(parse_month_header("February 2023").unwrap(), expected);
        assert!(parse_month_header("Total").is_err());
    }

    #[test]
    fn test_parse_money_cell() {
        assert_eq!(parse_money_cell("1,234.50"), Some(1234.5));
        assert_eq!(parse_money_cell("$500"), Some(500.0));
        assert_eq!(parse_money_cell("(200.00)"), Some(-200.0));
        assert_eq!(parse_money_cell(""), Some(0.0));
        assert_eq!(parse_money_cell("-"), Some(0.0));
        assert_eq!(parse_money_cell("n/a"), None);
    }
}
