//! Flattens a nested P&L report into one monthly series per leaf account.
//!
//! This is the only module that knows the report's row/column shape. Every
//! later stage works on [`MonthlySeries`].

use crate::error::{DriverDiscoveryError, Result};
use crate::schema::{ColumnKind, FinancialReport, ReportColumn, ReportRow};
use crate::series::{Category, MonthlySeries};
use crate::utils::{get_month_ends_in_period, months_between, parse_money_cell, parse_month_header};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Lines whose absolute total over the period is below this carry no signal.
pub const MIN_LINE_TOTAL: f64 = 1.0;

/// Report totals that are never accounts, compared against the whole
/// normalized title.
const SUMMARY_TITLES: [&str; 8] = [
    "gross profit",
    "net income",
    "net income loss",
    "net operating income",
    "net other income",
    "net profit",
    "net earnings",
    "net loss",
];

const EXPENSE_WORDS: [&str; 8] = [
    "cost", "costs", "expense", "expenses", "cogs", "overhead", "overheads", "purchases",
];
const REVENUE_WORDS: [&str; 5] = ["income", "revenue", "revenues", "sales", "turnover"];

struct MonthAxis {
    label_column: usize,
    months: Vec<NaiveDate>,
    /// (report column index, position on the month axis)
    slots: Vec<(usize, usize)>,
}

struct LeafLine {
    name: String,
    category: Category,
    values: Vec<f64>,
}

pub fn normalize_report(report: &FinancialReport) -> Result<Vec<MonthlySeries>> {
    let axis = build_axis(&report.columns)?;

    let mut leaves = Vec::new();
    collect_leaves(&report.rows, None, &axis, &mut leaves);

    let mut totals: BTreeMap<Category, Vec<f64>> = BTreeMap::new();
    for leaf in &leaves {
        let total = totals
            .entry(leaf.category)
            .or_insert_with(|| vec![0.0; axis.months.len()]);
        for (sum, value) in total.iter_mut().zip(&leaf.values) {
            *sum += value;
        }
    }

    let extracted = leaves.len();
    let mut series = Vec::new();
    for leaf in leaves {
        let line_total: f64 = leaf.values.iter().sum();
        if line_total.abs() < MIN_LINE_TOTAL {
            debug!("Dropping '{}': period total {:.2} is negligible", leaf.name, line_total);
            continue;
        }

        let business_total = totals
            .get(&leaf.category)
            .cloned()
            .unwrap_or_else(|| vec![0.0; axis.months.len()]);
        if business_total.iter().all(|v| *v == 0.0) {
            debug!("Dropping '{}': {:?} total is zero every month", leaf.name, leaf.category);
            continue;
        }

        series.push(MonthlySeries::from_values(
            leaf.name,
            leaf.category,
            &axis.months,
            &leaf.values,
            business_total,
        )?);
    }

    info!(
        "Normalized {} of {} leaf lines over {} months",
        series.len(),
        extracted,
        axis.months.len()
    );

    Ok(series)
}

fn build_axis(columns: &[ReportColumn]) -> Result<MonthAxis> {
    let label_column = columns
        .iter()
        .position(|c| c.kind == ColumnKind::Label)
        .unwrap_or(0);

    let mut dated = Vec::new();
    for (idx, column) in columns.iter().enumerate() {
        if column.kind == ColumnKind::Month {
            dated.push((idx, parse_month_header(&column.title)?));
        }
    }

    let (first, last) = match (dated.first(), dated.last()) {
        (Some(first), Some(last)) => (first.1, last.1),
        _ => {
            return Err(DriverDiscoveryError::InvalidReport(
                "report has no month columns".to_string(),
            ))
        }
    };

    if dated.windows(2).any(|w| w[0].1 >= w[1].1) {
        return Err(DriverDiscoveryError::InvalidReport(
            "month columns must be in strictly chronological order".to_string(),
        ));
    }

    let months = get_month_ends_in_period(first, last);
    if months.len() > dated.len() {
        warn!(
            "Report skips {} month(s) between {} and {}; filling them with zero",
            months.len() - dated.len(),
            first,
            last
        );
    }

    let slots = dated
        .into_iter()
        .map(|(idx, month)| (idx, months_between(first, month) as usize))
        .collect();

    Ok(MonthAxis {
        label_column,
        months,
        slots,
    })
}

fn collect_leaves(rows: &[ReportRow], inherited: Option<Category>, axis: &MonthAxis, out: &mut Vec<LeafLine>) {
    for row in rows {
        match row {
            ReportRow::Section {
                title,
                category,
                rows: children,
                summary,
            } => {
                let resolved = if category.is_some() {
                    *category
                } else if is_summary_title(title) {
                    None
                } else {
                    inherited.or_else(|| infer_category(title))
                };

                if !children.is_empty() {
                    collect_leaves(children, resolved, axis, out);
                    continue;
                }

                // A section without children is a leaf account carried on its total row.
                match (resolved, summary) {
                    (Some(category), Some(cells)) => push_leaf(title, category, cells, axis, out),
                    _ => debug!("Skipping section '{}' with no account lines", title),
                }
            }
            ReportRow::Data { cells } => {
                let name = cells.get(axis.label_column).map(|s| s.as_str()).unwrap_or("");
                match inherited {
                    Some(category) => push_leaf(name, category, cells, axis, out),
                    None => debug!("Skipping '{}': no revenue or expense section", name),
                }
            }
        }
    }
}

fn push_leaf(name: &str, category: Category, cells: &[String], axis: &MonthAxis, out: &mut Vec<LeafLine>) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }

    let mut values = vec![0.0; axis.months.len()];
    let mut numeric_cells = 0;
    for &(column, position) in &axis.slots {
        let cell = cells.get(column).map(|s| s.as_str()).unwrap_or("");
        match parse_money_cell(cell) {
            Some(value) => {
                values[position] = value;
                numeric_cells += 1;
            }
            None => debug!("'{}': unreadable amount '{}' treated as zero", name, cell),
        }
    }

    if numeric_cells == 0 {
        debug!("Skipping '{}': no numeric month cells", name);
        return;
    }

    out.push(LeafLine {
        name: name.to_string(),
        category,
        values,
    });
}

/// Lowercase words of a title, punctuation dropped.
fn title_words(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn contains_word(words: &[String], keywords: &[&str]) -> bool {
    words.iter().any(|w| keywords.iter().any(|k| w == k))
}

fn is_summary_title(title: &str) -> bool {
    let words = title_words(title);
    let body = match words.split_first() {
        Some((first, rest)) if first == "total" => rest,
        _ => words.as_slice(),
    };
    let normalized = body.join(" ");
    SUMMARY_TITLES.iter().any(|t| *t == normalized)
}

/// Category implied by a section title, matched on whole words. Cost
/// words are checked first so that "Cost of Sales" is an expense.
pub fn infer_category(title: &str) -> Option<Category> {
    if is_summary_title(title) {
        return None;
    }
    let words = title_words(title);
    if contains_word(&words, &EXPENSE_WORDS) {
        return Some(Category::Expense);
    }
    if contains_word(&words, &REVENUE_WORDS) {
        return Some(Category::Revenue);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(title: &str, kind: ColumnKind) -> ReportColumn {
        ReportColumn {
            title: title.to_string(),
            kind,
        }
    }

    fn data(cells: &[&str]) -> ReportRow {
        ReportRow::Data {
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn section(title: &str, rows: Vec<ReportRow>, summary: &[&str]) -> ReportRow {
        ReportRow::Section {
            title: title.to_string(),
            category: None,
            rows,
            summary: if summary.is_empty() {
                None
            } else {
                Some(summary.iter().map(|c| c.to_string()).collect())
            },
        }
    }

    fn sample_report() -> FinancialReport {
        FinancialReport {
            organization_name: Some("Harbour Cafe".to_string()),
            currency: Some("NZD".to_string()),
            columns: vec![
                column("Account", ColumnKind::Label),
                column("Jan 2023", ColumnKind::Month),
                column("Feb 2023", ColumnKind::Month),
                column("Apr 2023", ColumnKind::Month),
                column("Total", ColumnKind::Total),
            ],
            rows: vec![
                section(
                    "Income",
                    vec![
                        data(&["Food Sales", "8,000.00", "8,500.00", "9,000.00", "25,500.00"]),
                        data(&["Catering", "1,000.00", "", "2,000.00", "3,000.00"]),
                        data(&["Rounding", "0.10", "0.05", "", "0.15"]),
                    ],
                    &["Total Income", "9,000.10", "8,500.05", "11,000.00", "28,500.15"],
                ),
                section(
                    "Cost of Sales",
                    vec![data(&["Ingredients", "3,000.00", "3,100.00", "(200.00)", "5,900.00"])],
                    &[],
                ),
                section("Gross Profit", vec![], &["Gross Profit", "6,000", "5,400", "11,200", "22,600"]),
                section(
                    "Operating Expenses",
                    vec![
                        section(
                            "Payroll",
                            vec![
                                data(&["Wages", "4,000.00", "4,000.00", "4,200.00", "12,200.00"]),
                                data(&["Superannuation", "120.00", "120.00", "126.00", "366.00"]),
                            ],
                            &["Total Payroll", "4,120", "4,120", "4,326", "12,566"],
                        ),
                        section("Insurance", vec![], &["Insurance", "300", "300", "300", "900"]),
                    ],
                    &[],
                ),
                section("Net Income", vec![], &["Net Income", "1", "1", "1", "3"]),
            ],
        }
    }

    fn find<'a>(series: &'a [MonthlySeries], name: &str) -> &'a MonthlySeries {
        series.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_flattens_leaf_accounts() {
        let series = normalize_report(&sample_report()).unwrap();
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Food Sales", "Catering", "Ingredients", "Wages", "Superannuation", "Insurance"]
        );
    }

    #[test]
    fn test_fills_missing_months_with_zero() {
        let series = normalize_report(&sample_report()).unwrap();
        let food = find(&series, "Food Sales");
        assert_eq!(food.month_count(), 4);
        assert_eq!(food.values(), vec![8_000.0, 8_500.0, 0.0, 9_000.0]);
        assert_eq!(food.last_month(), NaiveDate::from_ymd_opt(2023, 4, 30).unwrap());
        assert!(series.iter().all(|s| s.shares_axis_with(food)));
    }

    #[test]
    fn test_business_totals_per_category() {
        let series = normalize_report(&sample_report()).unwrap();
        let catering = find(&series, "Catering");
        assert_eq!(catering.category, Category::Revenue);
        // Rounding is dropped as negligible but still counted in the category total.
        assert!((catering.business_total()[0] - 9_000.10).abs() < 1e-9);

        let wages = find(&series, "Wages");
        assert_eq!(wages.category, Category::Expense);
        assert!((wages.business_total()[0] - (3_000.0 + 4_000.0 + 120.0 + 300.0)).abs() < 1e-9);
        assert!((wages.business_total()[3] - (-200.0 + 4_200.0 + 126.0 + 300.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cost_of_sales_is_expense() {
        let series = normalize_report(&sample_report()).unwrap();
        let ingredients = find(&series, "Ingredients");
        assert_eq!(ingredients.category, Category::Expense);
        assert_eq!(ingredients.values()[3], -200.0);
    }

    #[test]
    fn test_report_without_months_is_rejected() {
        let report = FinancialReport {
            organization_name: None,
            currency: None,
            columns: vec![column("Account", ColumnKind::Label), column("Total", ColumnKind::Total)],
            rows: vec![],
        };
        assert!(matches!(
            normalize_report(&report),
            Err(DriverDiscoveryError::InvalidReport(_))
        ));
    }

    #[test]
    fn test_unordered_month_columns_are_rejected() {
        let report = FinancialReport {
            organization_name: None,
            currency: None,
            columns: vec![
                column("Account", ColumnKind::Label),
                column("2023-02", ColumnKind::Month),
                column("2023-01", ColumnKind::Month),
            ],
            rows: vec![],
        };
        assert!(normalize_report(&report).is_err());
    }

    #[test]
    fn test_explicit_category_overrides_title() {
        let report = FinancialReport {
            organization_name: None,
            currency: None,
            columns: vec![
                column("Account", ColumnKind::Label),
                column("2023-01", ColumnKind::Month),
                column("2023-02", ColumnKind::Month),
            ],
            rows: vec![ReportRow::Section {
                title: "Miscellaneous".to_string(),
                category: Some(Category::Revenue),
                rows: vec![data(&["Grants", "500", "700"])],
                summary: None,
            }],
        };
        let series = normalize_report(&report).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].category, Category::Revenue);
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(infer_category("Trading Income"), Some(Category::Revenue));
        assert_eq!(infer_category("Cost of Sales"), Some(Category::Expense));
        assert_eq!(infer_category("Other Expenses"), Some(Category::Expense));
        assert_eq!(infer_category("Net Income"), None);
        assert_eq!(infer_category("Gross Profit"), None);
        assert_eq!(infer_category("Miscellaneous"), None);
        assert_eq!(infer_category("Total Net Income"), None);
    }

    #[test]
    fn test_infer_category_matches_whole_words() {
        assert_eq!(infer_category("Costume Sales"), Some(Category::Revenue));
        assert_eq!(infer_category("Costco Rebates Income"), Some(Category::Revenue));
        assert_eq!(infer_category("Direct Costs"), Some(Category::Expense));
        assert_eq!(infer_category("Expensive Taste"), None);
    }

    #[test]
    fn test_summary_titles_match_whole_title() {
        assert!(is_summary_title("Net Income"));
        assert!(is_summary_title("Total Gross Profit"));
        assert!(is_summary_title("Net Income (Loss)"));
        assert!(!is_summary_title("Internet Income"));
        assert!(!is_summary_title("Cabinet Loss"));
        assert!(!is_summary_title("Net Income from Rentals"));
    }

    #[test]
    fn test_leaf_section_named_like_a_total_is_kept() {
        let report = FinancialReport {
            organization_name: None,
            currency: None,
            columns: vec![
                column("Account", ColumnKind::Label),
                column("2023-01", ColumnKind::Month),
                column("2023-02", ColumnKind::Month),
            ],
            rows: vec![section(
                "Income",
                vec![
                    data(&["Sales", "1,000", "1,100"]),
                    section("Internet Income", vec![], &["Internet Income", "500", "600"]),
                ],
                &[],
            )],
        };

        let series = normalize_report(&report).unwrap();
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sales", "Internet Income"]);
        assert_eq!(series[1].category, Category::Revenue);
        assert_eq!(series[1].values(), vec![500.0, 600.0]);
    }
}
