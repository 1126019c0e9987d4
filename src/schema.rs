use crate::series::Category;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[schemars(description = "The account/line name column. Exactly one per report.")]
    Label,

    #[schemars(
        description = "One reporting month. The title must name the month, e.g. '2023-01' or 'Jan 2023'."
    )]
    Month,

    #[schemars(description = "A period total column. Ignored; totals are recomputed from the months.")]
    Total,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReportColumn {
    #[schemars(description = "Column header as shown in the report")]
    pub title: String,

    #[schemars(description = "What the column holds")]
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportRow {
    #[schemars(
        description = "A grouping of rows, e.g. 'Income' or 'Operating Expenses'. A section with no child rows and a summary row is itself a leaf account."
    )]
    Section {
        #[schemars(description = "Section header text")]
        title: String,

        #[serde(default)]
        #[schemars(
            description = "Explicit category for every line in this section. When omitted, the category is inherited from the parent section or inferred from the title."
        )]
        category: Option<Category>,

        #[serde(default)]
        #[schemars(description = "Nested rows")]
        rows: Vec<ReportRow>,

        #[serde(default)]
        #[schemars(description = "Cells of the section's total row, aligned with the report columns")]
        summary: Option<Vec<String>>,
    },

    #[schemars(description = "One account line. Cells are aligned with the report columns.")]
    Data {
        #[schemars(description = "Cell text, one per report column")]
        cells: Vec<String>,
    },
}

/// A monthly Profit & Loss report as returned by the accounting system.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FinancialReport {
    #[serde(default)]
    #[schemars(description = "Name of the company the report belongs to")]
    pub organization_name: Option<String>,

    #[serde(default)]
    #[schemars(description = "ISO currency code of every money cell")]
    pub currency: Option<String>,

    #[schemars(description = "Report columns in display order")]
    pub columns: Vec<ReportColumn>,

    #[schemars(description = "Top-level report rows")]
    pub rows: Vec<ReportRow>,
}

impl FinancialReport {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FinancialReport)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
