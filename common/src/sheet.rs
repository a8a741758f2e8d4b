use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const SECONDS_PER_DAY: f64 = 86_400.0;
const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];
/// Placeholders spreadsheet exports use for a missing value
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "<NA>", "N/A", "NA", "n/a", "NULL", "null", "None", "-",
];

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("No such file: {}", .path.display())]
    FileNotFound { path: PathBuf },
    #[error("Could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: calamine::Error,
    },
    #[error("Could not read {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Worksheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },
    #[error("Sheet '{sheet}' has no header row")]
    NoHeader { sheet: String },
    #[error("Missing expected column in '{sheet}': {column}")]
    MissingColumn { sheet: String, column: String },
}

fn missing_column(sheet: &str, column: impl ToString) -> SheetError {
    SheetError::MissingColumn {
        sheet: sheet.to_owned(),
        column: column.to_string(),
    }
}

/// A single spreadsheet value
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    /// Seconds since the spreadsheet epoch
    Timestamp(f64),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Interprets a textual field, as found in csv exports
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            Cell::Empty
        } else if let Ok(value) = text.parse::<f64>() {
            Cell::Number(value)
        } else {
            Cell::Text(text.to_owned())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Finite numeric value of the cell, if any
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(v) | Cell::Timestamp(v) => *v,
            Cell::Text(s) => s.parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    fn header_name(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) | Cell::Timestamp(v) => v.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::Bool(v) => Cell::Bool(*v),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(s.to_owned())
                }
            }
            Data::DateTime(dt) => Cell::Timestamp(dt.as_f64() * SECONDS_PER_DAY),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

/// A sheet, first row taken as the headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    fn from_rows<I>(sheet: &str, rows: I) -> Result<Self, SheetError>
    where
        I: IntoIterator<Item = Vec<Cell>>,
    {
        let mut rows = rows.into_iter();
        let headers = rows
            .next()
            .ok_or_else(|| SheetError::NoHeader {
                sheet: sheet.to_owned(),
            })?
            .iter()
            .map(Cell::header_name)
            .collect();
        Ok(Self::new(headers, rows.collect()))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain([self.headers.len()])
            .max()
            .unwrap_or(0)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn cell(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

/// Loads `sheet` from a workbook, or the whole file for csv exports
pub fn load_table(path: &Path, sheet: &str) -> Result<Table, SheetError> {
    if !path.is_file() {
        return Err(SheetError::FileNotFound {
            path: path.to_owned(),
        });
    }
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        load_csv(path, sheet)
    } else {
        load_workbook(path, sheet)
    }
}

fn load_workbook(path: &Path, sheet: &str) -> Result<Table, SheetError> {
    let open_err = |source| SheetError::Open {
        path: path.to_owned(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(open_err)?;
    if !workbook.sheet_names().iter().any(|name| name.as_str() == sheet) {
        return Err(SheetError::SheetNotFound {
            path: path.to_owned(),
            sheet: sheet.to_owned(),
        });
    }
    let range = workbook.worksheet_range(sheet).map_err(open_err)?;

    // Ranges start at the first used cell, pad so positions match the sheet columns
    let offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    Table::from_rows(
        sheet,
        range.rows().map(|row| {
            std::iter::repeat_n(Cell::Empty, offset)
                .chain(row.iter().map(Cell::from))
                .collect::<Vec<_>>()
        }),
    )
}

fn load_csv(path: &Path, sheet: &str) -> Result<Table, SheetError> {
    let csv_err = |source| SheetError::Csv {
        path: path.to_owned(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(Cell::parse).collect());
    }
    Table::from_rows(sheet, rows)
}

/// Where the X values of a series come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum XAxis {
    /// Zero based column position
    Position(usize),
    Header(String),
}

impl XAxis {
    /// Column letters (`A`, `B`, .. `AA`) select by position, anything else is a header name
    pub fn parse(identifier: &str) -> Self {
        let identifier = identifier.trim();
        if (1..=3).contains(&identifier.len()) && identifier.bytes().all(|b| b.is_ascii_uppercase())
        {
            let number = identifier
                .bytes()
                .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
            XAxis::Position(number - 1)
        } else {
            XAxis::Header(identifier.to_owned())
        }
    }
}

impl fmt::Display for XAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XAxis::Position(idx) => {
                let mut letters = Vec::new();
                let mut n = idx + 1;
                while n > 0 {
                    let rem = (n - 1) % 26;
                    letters.push(char::from(b'A' + rem as u8));
                    n = (n - 1) / 26;
                }
                letters.iter().rev().try_for_each(|c| write!(f, "{c}"))
            }
            XAxis::Header(name) => f.write_str(name),
        }
    }
}

/// Keeps only rows where `column` equals `value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: Cell,
}

impl Filter {
    pub fn new(column: impl Into<String>, value: impl Into<Cell>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// (x, y) samples of one metric for one source, missing rows excluded
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    samples: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(samples: Vec<(f64, f64)>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.samples.iter().map(|s| s.0))
    }

    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.samples.iter().map(|s| s.1))
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

enum AxisCell {
    Missing,
    Value(f64),
    Time(f64),
    /// Text that is neither a number nor a timestamp
    Label,
}

impl AxisCell {
    fn parse(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => AxisCell::Missing,
            Cell::Number(v) if v.is_finite() => AxisCell::Value(*v),
            Cell::Number(_) => AxisCell::Missing,
            Cell::Timestamp(t) => AxisCell::Time(*t),
            Cell::Bool(_) => AxisCell::Label,
            Cell::Text(s) if NA_VALUES.contains(&s.trim()) => AxisCell::Missing,
            Cell::Text(s) => {
                if let Ok(v) = s.parse::<f64>() {
                    if v.is_finite() {
                        AxisCell::Value(v)
                    } else {
                        AxisCell::Missing
                    }
                } else if let Some(t) = parse_timestamp(s) {
                    AxisCell::Time(t)
                } else {
                    AxisCell::Label
                }
            }
        }
    }
}

fn parse_timestamp(text: &str) -> Option<f64> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|dt| dt.and_utc().timestamp_millis() as f64 / 1000.0)
}

/// Pairs the X axis with `column`, dropping rows where either is missing.
///
/// Timestamps on the X axis become seconds since the first kept sample. If
/// the X column holds labels the row ordinal is used instead.
pub fn extract_series(
    table: &Table,
    sheet: &str,
    x_axis: &XAxis,
    column: &str,
    filters: &[Filter],
) -> Result<Series, SheetError> {
    let predicates = filters
        .iter()
        .map(|filter| {
            table
                .column_index(&filter.column)
                .map(|idx| (idx, &filter.value))
                .ok_or_else(|| missing_column(sheet, &filter.column))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let x_idx = match x_axis {
        XAxis::Position(idx) if *idx < table.width() => *idx,
        XAxis::Position(_) => return Err(missing_column(sheet, x_axis)),
        XAxis::Header(name) => table
            .column_index(name)
            .ok_or_else(|| missing_column(sheet, name))?,
    };
    let y_idx = table
        .column_index(column)
        .ok_or_else(|| missing_column(sheet, column))?;

    let rows = table
        .rows()
        .iter()
        .filter(|row| {
            predicates
                .iter()
                .all(|(idx, value)| cell(row, *idx) == *value)
        })
        .collect::<Vec<_>>();

    let x_cells = rows
        .iter()
        .map(|row| AxisCell::parse(cell(row, x_idx)))
        .collect::<Vec<_>>();
    let ordinal = x_cells.iter().any(|x| matches!(x, AxisCell::Label));

    let mut origin = None;
    let mut samples = Vec::with_capacity(rows.len());
    for (position, (x, row)) in x_cells.into_iter().zip(&rows).enumerate() {
        let Some(y) = cell(row, y_idx).as_f64() else {
            continue;
        };
        let x = match x {
            AxisCell::Missing => continue,
            _ if ordinal => position as f64,
            AxisCell::Value(v) => v,
            AxisCell::Time(t) => t - *origin.get_or_insert(t),
            AxisCell::Label => continue,
        };
        samples.push((x, y));
    }

    if samples.len() < rows.len() {
        debug!(
            "{sheet}/{column}: dropped {} of {} rows with missing values",
            rows.len() - samples.len(),
            rows.len()
        );
    }
    Ok(Series::new(samples))
}

/// Extracts series from spreadsheets, parsing each (file, sheet) once
#[derive(Debug)]
pub struct Extractor {
    x_axis: XAxis,
    tables: HashMap<(PathBuf, String), Table>,
}

impl Extractor {
    pub fn new(x_axis: XAxis) -> Self {
        Self {
            x_axis,
            tables: HashMap::new(),
        }
    }

    pub fn extract(
        &mut self,
        file: &Path,
        sheet: &str,
        column: &str,
        filters: &[Filter],
    ) -> Result<Series, SheetError> {
        let table = cached_table(&mut self.tables, file, sheet)?;
        extract_series(table, sheet, &self.x_axis, column, filters)
    }

    /// Number of sheets parsed so far
    pub fn cached_sheets(&self) -> usize {
        self.tables.len()
    }
}

fn cached_table<'a>(
    tables: &'a mut HashMap<(PathBuf, String), Table>,
    file: &Path,
    sheet: &str,
) -> Result<&'a Table, SheetError> {
    match tables.entry((file.to_owned(), sheet.to_owned())) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let table = load_table(file, sheet)?;
            debug!(
                "Loaded '{sheet}' from {}: {} columns, {} rows",
                file.display(),
                table.headers().len(),
                table.len()
            );
            Ok(entry.insert(table))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use eyre::Result;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    use super::*;

    fn table(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table::new(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    fn first_column() -> XAxis {
        XAxis::parse("A")
    }

    #[test]
    fn drops_rows_with_missing_values() -> Result<()> {
        let table = table(
            &["sample", "metric_CPI"],
            vec![
                vec![1.0.into(), 10.0.into()],
                vec![2.0.into(), Cell::Empty],
                vec![3.0.into(), 30.0.into()],
            ],
        );
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(1.0, 10.0), (3.0, 30.0)]);
        Ok(())
    }

    #[test]
    fn missing_x_is_dropped_too() -> Result<()> {
        let table = table(
            &["sample", "metric_CPI"],
            vec![vec![Cell::Empty, 10.0.into()], vec![2.0.into(), 20.0.into()]],
        );
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(2.0, 20.0)]);
        Ok(())
    }

    #[test]
    fn missing_column_names_the_sheet() {
        let table = table(&["sample", "metric_CPI"], vec![vec![1.0.into(), 1.0.into()]]);
        let err = extract_series(
            &table,
            "details system view",
            &first_column(),
            "metric_CPI (socket 0)",
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, SheetError::MissingColumn { .. }));
        let message = err.to_string();
        assert!(message.contains("details system view"), "{message}");
        assert!(message.contains("metric_CPI (socket 0)"), "{message}");
    }

    #[test]
    fn missing_x_header() {
        let table = table(&["sample", "metric_CPI"], vec![vec![1.0.into(), 1.0.into()]]);
        let err = extract_series(
            &table,
            "details",
            &XAxis::parse("timestamp"),
            "metric_CPI",
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SheetError::MissingColumn { ref column, .. } if column == "timestamp"
        ));

        let err = extract_series(&table, "details", &XAxis::parse("C"), "metric_CPI", &[])
            .unwrap_err();
        assert!(matches!(
            err,
            SheetError::MissingColumn { ref column, .. } if column == "C"
        ));
    }

    #[test]
    fn alphabetic_x_name_is_not_the_first_column() {
        let table = table(
            &["sample", "metric_CPI"],
            vec![vec![1.0.into(), 0.5.into()]],
        );
        let err = extract_series(&table, "details", &XAxis::parse("Time"), "metric_CPI", &[])
            .unwrap_err();
        assert!(matches!(
            err,
            SheetError::MissingColumn { ref column, .. } if column == "Time"
        ));
    }

    #[test]
    fn x_axis_by_header() -> Result<()> {
        let table = table(
            &["socket", "sample", "metric_CPI"],
            vec![
                vec![0.0.into(), 5.0.into(), 0.5.into()],
                vec![0.0.into(), 6.0.into(), 0.7.into()],
            ],
        );
        let series = extract_series(
            &table,
            "details",
            &XAxis::parse("sample"),
            "metric_CPI",
            &[],
        )?;
        assert_eq!(series.samples(), &[(5.0, 0.5), (6.0, 0.7)]);
        Ok(())
    }

    #[test]
    fn filters_are_conjunctive() -> Result<()> {
        let table = table(
            &["sample", "socket", "core", "metric_CPI"],
            vec![
                vec![1.0.into(), 0.0.into(), "a".into(), 1.0.into()],
                vec![2.0.into(), 1.0.into(), "a".into(), 2.0.into()],
                vec![3.0.into(), 0.0.into(), "b".into(), 3.0.into()],
                vec![4.0.into(), 0.0.into(), "a".into(), 4.0.into()],
            ],
        );
        let filters = [Filter::new("socket", 0.0), Filter::new("core", "a")];
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &filters)?;
        assert_eq!(series.samples(), &[(1.0, 1.0), (4.0, 4.0)]);

        let err = extract_series(
            &table,
            "details",
            &first_column(),
            "metric_CPI",
            &[Filter::new("package", 0.0)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SheetError::MissingColumn { ref column, .. } if column == "package"
        ));
        Ok(())
    }

    #[test]
    fn timestamps_are_rebased() -> Result<()> {
        let table = table(
            &["timestamp", "metric_CPI"],
            vec![
                vec!["03/10/2024 12:00:00.000".into(), Cell::Empty],
                vec!["03/10/2024 12:00:01.500".into(), 1.0.into()],
                vec!["03/10/2024 12:00:03.000".into(), 2.0.into()],
            ],
        );
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(0.0, 1.0), (1.5, 2.0)]);
        Ok(())
    }

    #[test]
    fn label_x_values_fall_back_to_row_ordinal() -> Result<()> {
        let table = table(
            &["phase", "metric_CPI"],
            vec![
                vec!["warmup".into(), 1.0.into()],
                vec!["prefill".into(), 2.0.into()],
                vec!["decode".into(), 3.0.into()],
            ],
        );
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        Ok(())
    }

    #[test]
    fn not_a_number_x_drops_only_its_row() -> Result<()> {
        let table = table(
            &["sample", "metric_CPI"],
            vec![
                vec!["NaN".into(), 1.0.into()],
                vec![2.0.into(), 2.0.into()],
                vec!["inf".into(), 3.0.into()],
                vec![f64::NAN.into(), 4.0.into()],
                vec!["5".into(), 5.0.into()],
            ],
        );
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(2.0, 2.0), (5.0, 5.0)]);
        Ok(())
    }

    #[test]
    fn na_placeholders_in_x_are_missing_not_labels() -> Result<()> {
        let table = table(
            &["sample", "metric_CPI"],
            vec![
                vec![10.0.into(), 1.0.into()],
                vec!["N/A".into(), 2.0.into()],
                vec![30.0.into(), 3.0.into()],
                vec!["#N/A".into(), 4.0.into()],
                vec![Cell::parse("NULL"), 5.0.into()],
            ],
        );
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(10.0, 1.0), (30.0, 3.0)]);
        Ok(())
    }

    #[test]
    fn numeric_text_and_junk_in_y() -> Result<()> {
        let table = table(
            &["sample", "metric_CPI"],
            vec![
                vec![1.0.into(), "0.75".into()],
                vec![2.0.into(), "#DIV/0!".into()],
                vec![3.0.into(), f64::NAN.into()],
            ],
        );
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(1.0, 0.75)]);
        Ok(())
    }

    #[test]
    fn ragged_rows_count_as_missing() -> Result<()> {
        let table = table(
            &["sample", "metric_CPI"],
            vec![vec![1.0.into()], vec![2.0.into(), 4.0.into()]],
        );
        let series = extract_series(&table, "details", &first_column(), "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(2.0, 4.0)]);
        Ok(())
    }

    #[test]
    fn x_axis_parsing() {
        assert_eq!(XAxis::parse("A"), XAxis::Position(0));
        assert_eq!(XAxis::parse("B"), XAxis::Position(1));
        assert_eq!(XAxis::parse("Z"), XAxis::Position(25));
        assert_eq!(XAxis::parse("AA"), XAxis::Position(26));
        assert_eq!(XAxis::parse("Time"), XAxis::Header("Time".to_owned()));
        assert_eq!(XAxis::parse("TIMESTAMP"), XAxis::Header("TIMESTAMP".to_owned()));
        assert_eq!(XAxis::parse("1"), XAxis::Header("1".to_owned()));

        for letters in ["A", "Z", "AA", "AZ", "BA", "ZZ", "AAA"] {
            assert_eq!(XAxis::parse(letters).to_string(), letters);
        }
    }

    #[test]
    fn csv_export_is_a_single_sheet() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("emon.csv");
        fs::write(
            &path,
            "timestamp,metric_CPI,metric_CPU utilization %\n1,0.5,40\n2,,41\n3,0.7,\n",
        )?;

        let table = load_table(&path, "details system view")?;
        assert_eq!(
            table.headers(),
            &["timestamp", "metric_CPI", "metric_CPU utilization %"]
        );
        assert_eq!(table.len(), 3);

        let mut extractor = Extractor::new(first_column());
        let series = extractor.extract(&path, "details system view", "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(1.0, 0.5), (3.0, 0.7)]);
        Ok(())
    }

    #[test]
    fn reads_xlsx_sheets() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("emon.xlsx");

        let mut workbook = Workbook::new();
        let system = workbook.add_worksheet();
        system.set_name("details system view")?;
        system.write_string(0, 0, "timestamp")?;
        system.write_string(0, 1, "metric_CPI")?;
        for (row, value) in [(1u32, Some(0.5)), (2, None), (3, Some(0.9))] {
            system.write_number(row, 0, row as f64)?;
            if let Some(value) = value {
                system.write_number(row, 1, value)?;
            }
        }
        let socket = workbook.add_worksheet();
        socket.set_name("details socket view")?;
        socket.write_string(0, 0, "timestamp")?;
        socket.write_string(0, 1, "metric_CPI (socket 0)")?;
        socket.write_number(1, 0, 1.0)?;
        socket.write_number(1, 1, 1.25)?;
        workbook.save(&path)?;

        let mut extractor = Extractor::new(first_column());
        let series = extractor.extract(&path, "details system view", "metric_CPI", &[])?;
        assert_eq!(series.samples(), &[(1.0, 0.5), (3.0, 0.9)]);

        let series = extractor.extract(&path, "details socket view", "metric_CPI (socket 0)", &[])?;
        assert_eq!(series.samples(), &[(1.0, 1.25)]);

        let err = extractor
            .extract(&path, "details system view", "metric_CPI (socket 0)", &[])
            .unwrap_err();
        assert!(err.to_string().contains("details system view"));
        assert_eq!(extractor.cached_sheets(), 2);
        Ok(())
    }

    #[test]
    fn missing_sheet() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("emon.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("details system view")?;
        workbook.save(&path)?;

        let err = load_table(&path, "details socket view").unwrap_err();
        assert!(matches!(
            err,
            SheetError::SheetNotFound { ref sheet, .. } if sheet == "details socket view"
        ));
        Ok(())
    }

    #[test]
    fn missing_file() {
        let mut extractor = Extractor::new(first_column());
        let err = extractor
            .extract(
                Path::new("does/not/exist.xlsx"),
                "details system view",
                "metric_CPI",
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, SheetError::FileNotFound { .. }));
        assert_eq!(extractor.cached_sheets(), 0);
    }

    #[test]
    fn empty_csv_has_no_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.csv");
        fs::write(&path, "")?;
        let err = load_table(&path, "details").unwrap_err();
        assert!(matches!(err, SheetError::NoHeader { .. }));
        Ok(())
    }
}
