//! Maps list items to display rows, independent of any rendering target.

use crate::models::ListItem;

/// Column headings, in display order.
pub const TABLE_HEADERS: [&str; 6] = [
    "Location",
    "Forecast Period",
    "Temperature",
    "Unit",
    "Forecast",
    "DateTime",
];

/// Shown instead of rows when the list is empty.
pub const EMPTY_TABLE_MESSAGE: &str = "No weather data found. Run a sync to get the latest.";

/// One display row; missing values become empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: [String; 6],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    Empty(&'static str),
    Rows(Vec<TableRow>),
}

impl From<&ListItem> for TableRow {
    fn from(item: &ListItem) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            cells: [
                text(&item.location),
                text(&item.forecast_period),
                item.temperature.map(|t| t.to_string()).unwrap_or_default(),
                text(&item.unit),
                text(&item.forecast),
                text(&item.date_time),
            ],
        }
    }
}

/// Builds the table for `items`, preserving their order.
pub fn table_view(items: &[ListItem]) -> TableView {
    if items.is_empty() {
        return TableView::Empty(EMPTY_TABLE_MESSAGE);
    }
    TableView::Rows(items.iter().map(TableRow::from).collect())
}

impl TableView {
    /// Plain-text rendering with left-aligned, space-padded columns.
    pub fn render_text(&self) -> String {
        let rows = match self {
            TableView::Empty(message) => return format!("{}\n", message),
            TableView::Rows(rows) => rows,
        };

        let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row.cells.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, TABLE_HEADERS.iter().copied(), &widths);
        push_line(
            &mut out,
            widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().iter().map(String::as_str),
            &widths,
        );
        for row in rows {
            push_line(&mut out, row.cells.iter().map(String::as_str), &widths);
        }
        out
    }
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize; 6]) {
    let line: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
