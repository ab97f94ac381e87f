//! Search, sort and pagination for the data table widget.
use crate::util::{locale_cmp, plain_number};
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A single cell as the table sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// String form used for searching and for string comparison; `None` for
    /// missing cells.
    pub fn text(&self) -> Option<String> {
        match self {
            CellValue::Number(n) => Some(plain_number(*n)),
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        v.map(CellValue::Number).unwrap_or(CellValue::Missing)
    }
}

/// Rows the table can display.
pub trait TableRow {
    fn cell(&self, key: &str) -> CellValue;
}

pub type Formatter = fn(&CellValue) -> String;

#[derive(Debug, Clone)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub format: Option<Formatter>,
}

impl Column {
    pub fn new(key: &'static str, label: &'static str) -> Self {
        Column {
            key,
            label,
            sortable: true,
            format: None,
        }
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn with_format(mut self, format: Formatter) -> Self {
        self.format = Some(format);
        self
    }

    /// Display text for a cell, `N/A` when missing and unformatted.
    pub fn render(&self, value: &CellValue) -> String {
        match self.format {
            Some(f) => f(value),
            None => value.text().unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery<'a> {
    pub search: &'a str,
    pub sort_column: Option<&'a str>,
    pub sort_direction: SortDirection,
    /// 1-indexed.
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableQuery<'_> {
    fn default() -> Self {
        TableQuery {
            search: "",
            sort_column: None,
            sort_direction: SortDirection::Ascending,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<R> {
    pub page_rows: Vec<R>,
    pub total_pages: usize,
    pub total_rows: usize,
    pub page: usize,
    /// 1-indexed position of the first row shown, 0 when nothing matched.
    pub first_row: usize,
    /// 1-indexed position of the last row shown.
    pub last_row: usize,
}

impl<R> TablePage<R> {
    /// "showing a - b of n" footer text.
    pub fn footer(&self) -> String {
        format!(
            "{} - {} of {}  (page {} / {})",
            self.first_row, self.last_row, self.total_rows, self.page, self.total_pages
        )
    }
}

fn matches_search<R: TableRow>(row: &R, columns: &[Column], needle: &str) -> bool {
    columns.iter().any(|col| {
        row.cell(col.key)
            .text()
            .is_some_and(|t| t.to_lowercase().contains(needle))
    })
}

fn compare_present(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => locale_cmp(
            &a.text().unwrap_or_default(),
            &b.text().unwrap_or_default(),
        ),
    }
}

/// Filter, sort and slice `rows` for one page of the table.
///
/// Missing sort keys go last in both directions. Equal keys keep their input
/// order. A page past the end comes back empty; `total_pages` is never below 1.
pub fn table_view<R: TableRow + Clone>(
    rows: &[R],
    columns: &[Column],
    query: &TableQuery<'_>,
) -> TablePage<R> {
    let needle = query.search.to_lowercase();
    let mut matched: Vec<&R> = if needle.is_empty() {
        rows.iter().collect()
    } else {
        rows.iter()
            .filter(|r| matches_search(*r, columns, &needle))
            .collect()
    };

    if let Some(key) = query.sort_column {
        if columns.iter().any(|c| c.key == key && c.sortable) {
            let mut keyed: Vec<(CellValue, &R)> = matched.iter().map(|r| (r.cell(key), *r)).collect();
            keyed.sort_by(|(a, _), (b, _)| match (a.is_missing(), b.is_missing()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = compare_present(a, b);
                    match query.sort_direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                }
            });
            matched = keyed.into_iter().map(|(_, r)| r).collect();
        } else {
            debug!("ignoring sort on unknown or unsortable column {}", key);
        }
    }

    let page_size = query.page_size.max(1);
    let page = query.page.max(1);
    let total_rows = matched.len();
    let total_pages = total_rows.div_ceil(page_size).max(1);
    let start = (page - 1).saturating_mul(page_size);
    let page_rows: Vec<R> = matched
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    let (first_row, last_row) = if page_rows.is_empty() {
        (0, 0)
    } else {
        (start + 1, start + page_rows.len())
    };
    TablePage {
        first_row,
        last_row,
        page_rows,
        total_pages,
        total_rows,
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: Option<&'static str>,
        amount: Option<f64>,
    }

    impl TableRow for Row {
        fn cell(&self, key: &str) -> CellValue {
            match key {
                "name" => self
                    .name
                    .map(|n| CellValue::Text(n.to_string()))
                    .unwrap_or(CellValue::Missing),
                "amount" => self.amount.into(),
                _ => CellValue::Missing,
            }
        }
    }

    fn columns() -> Vec<Column> {
        vec![Column::new("name", "Name"), Column::new("amount", "Amount")]
    }

    fn row(name: Option<&'static str>, amount: Option<f64>) -> Row {
        Row { name, amount }
    }

    fn names(page: &TablePage<Row>) -> Vec<Option<&'static str>> {
        page.page_rows.iter().map(|r| r.name).collect()
    }

    #[test]
    fn empty_search_keeps_every_row() {
        let rows: Vec<Row> = (0..7).map(|i| row(Some("x"), Some(i as f64))).collect();
        let page = table_view(&rows, &columns(), &TableQuery::default());
        assert_eq!(page.total_rows, 7);
        assert_eq!(page.page_rows.len(), 7);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn search_is_case_insensitive_over_any_column() {
        let rows = vec![
            row(Some("Blé"), Some(7000.0)),
            row(Some("Orge"), Some(2700.5)),
            row(None, Some(27.0)),
        ];
        let query = TableQuery {
            search: "BLÉ",
            ..TableQuery::default()
        };
        assert_eq!(names(&table_view(&rows, &columns(), &query)), vec![Some("Blé")]);

        let query = TableQuery {
            search: "27",
            ..TableQuery::default()
        };
        let page = table_view(&rows, &columns(), &query);
        assert_eq!(page.total_rows, 2);
    }

    #[test]
    fn missing_values_never_match_search() {
        let rows = vec![row(None, None)];
        let query = TableQuery {
            search: "n/a",
            ..TableQuery::default()
        };
        assert_eq!(table_view(&rows, &columns(), &query).total_rows, 0);
    }

    #[test]
    fn numeric_sort_and_missing_last_both_directions() {
        let rows = vec![
            row(Some("a"), Some(10.0)),
            row(Some("b"), None),
            row(Some("c"), Some(9.0)),
            row(Some("d"), Some(100.0)),
        ];
        let asc = TableQuery {
            sort_column: Some("amount"),
            ..TableQuery::default()
        };
        assert_eq!(
            names(&table_view(&rows, &columns(), &asc)),
            vec![Some("c"), Some("a"), Some("d"), Some("b")]
        );
        let desc = TableQuery {
            sort_direction: SortDirection::Descending,
            ..asc
        };
        assert_eq!(
            names(&table_view(&rows, &columns(), &desc)),
            vec![Some("d"), Some("a"), Some("c"), Some("b")]
        );
    }

    #[test]
    fn text_sort_is_accent_insensitive() {
        let rows = vec![
            row(Some("Tomates"), None),
            row(Some("Amandes"), None),
            row(Some("Blé"), None),
            row(None, None),
            row(Some("Agrumes"), None),
        ];
        let query = TableQuery {
            sort_column: Some("name"),
            sort_direction: SortDirection::Descending,
            ..TableQuery::default()
        };
        assert_eq!(
            names(&table_view(&rows, &columns(), &query)),
            vec![Some("Tomates"), Some("Blé"), Some("Amandes"), Some("Agrumes"), None]
        );
    }

    #[test]
    fn unsortable_column_keeps_input_order() {
        let rows = vec![row(Some("b"), Some(2.0)), row(Some("a"), Some(1.0))];
        let cols = vec![Column::new("name", "Name").unsortable()];
        let query = TableQuery {
            sort_column: Some("name"),
            ..TableQuery::default()
        };
        assert_eq!(names(&table_view(&rows, &cols, &query)), vec![Some("b"), Some("a")]);
    }

    #[test]
    fn paginates_twenty_three_rows() {
        let rows: Vec<Row> = (0..23).map(|i| row(Some("r"), Some(i as f64))).collect();
        let query = TableQuery {
            page: 3,
            ..TableQuery::default()
        };
        let page = table_view(&rows, &columns(), &query);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page_rows.len(), 3);
        assert_eq!(page.page_rows[0].amount, Some(20.0));
        assert_eq!((page.first_row, page.last_row), (21, 23));
    }

    #[test]
    fn no_rows_still_has_one_page() {
        let rows: Vec<Row> = Vec::new();
        let page = table_view(&rows, &columns(), &TableQuery::default());
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.total_pages, 1);
        assert_eq!((page.first_row, page.last_row), (0, 0));
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let rows: Vec<Row> = (0..5).map(|i| row(Some("r"), Some(i as f64))).collect();
        let query = TableQuery {
            page: 4,
            ..TableQuery::default()
        };
        let page = table_view(&rows, &columns(), &query);
        assert!(page.page_rows.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn column_render_falls_back_to_na() {
        let col = Column::new("amount", "Amount");
        assert_eq!(col.render(&CellValue::Missing), "N/A");
        let col = col.with_format(|v| match v {
            CellValue::Number(n) => format!("{n:.1} kt"),
            _ => "-".to_string(),
        });
        assert_eq!(col.render(&CellValue::Number(3.0)), "3.0 kt");
    }
}
