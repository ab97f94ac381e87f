use crate::error::ExportError;
use crate::types::{ExportRow, NationalRecord};
use crate::util::plain_number;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Rows per page of the paginated report.
pub const REPORT_ROWS_PER_PAGE: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Report,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Report => "txt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            "report" | "pdf" | "txt" => Some(ExportFormat::Report),
            _ => None,
        }
    }
}

pub fn export_file_name(crop: &str, format: ExportFormat) -> String {
    format!("morocco-{}-data.{}", crop, format.extension())
}

/// Missing and zero measurements both export as `N/A`.
fn optional_cell(v: Option<f64>, render: impl Fn(f64) -> String) -> String {
    match v {
        Some(x) if x != 0.0 => render(x),
        _ => "N/A".to_string(),
    }
}

fn plain_row(r: &NationalRecord) -> ExportRow {
    ExportRow {
        year: r.year,
        crop: r.crop_label_secondary.clone(),
        production_kt: plain_number(r.production_kt),
        area_ha: optional_cell(r.area_ha, plain_number),
        yield_t_per_ha: optional_cell(r.yield_t_per_ha, plain_number),
    }
}

fn report_row(r: &NationalRecord, crop: &str) -> ExportRow {
    let label = if r.crop_label_secondary.is_empty() {
        crop.to_string()
    } else {
        r.crop_label_secondary.clone()
    };
    ExportRow {
        year: r.year,
        crop: label,
        production_kt: format!("{:.1}", r.production_kt),
        area_ha: optional_cell(r.area_ha, plain_number),
        yield_t_per_ha: optional_cell(r.yield_t_per_ha, |v| format!("{:.2}", v)),
    }
}

/// Rows as the report and console previews show them.
pub fn report_rows(series: &[NationalRecord], crop: &str) -> Vec<ExportRow> {
    series.iter().map(|r| report_row(r, crop)).collect()
}

pub fn write_series_csv<W: Write>(writer: W, series: &[NationalRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if series.is_empty() {
        wtr.write_record(["Year", "Crop", "Production (kt)", "Area (ha)", "Yield (t/ha)"])?;
    }
    for r in series {
        wtr.serialize(plain_row(r))?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonExport<'a> {
    crop: &'a str,
    #[serde(rename = "exportDate")]
    export_date: DateTime<Utc>,
    data: &'a [NationalRecord],
}

pub fn write_series_json<W: Write>(
    writer: W,
    crop: &str,
    series: &[NationalRecord],
    exported_at: DateTime<Utc>,
) -> Result<(), ExportError> {
    let doc = JsonExport {
        crop,
        export_date: exported_at,
        data: series,
    };
    serde_json::to_writer_pretty(writer, &doc)?;
    Ok(())
}

/// Plain-text report: a title block, then the rows split into pages separated
/// by form feeds.
pub fn write_series_report<W: Write>(
    mut writer: W,
    crop: &str,
    series: &[NationalRecord],
    generated: NaiveDate,
) -> Result<(), ExportError> {
    writeln!(writer, "Morocco Crop Insight - {}", crop)?;
    writeln!(writer, "Production Data Report")?;
    writeln!(writer, "Generated: {}", generated.format("%Y-%m-%d"))?;
    writeln!(writer)?;

    let rows = report_rows(series, crop);
    if rows.is_empty() {
        writeln!(writer, "(no rows)")?;
        return Ok(());
    }
    let pages = rows.chunks(REPORT_ROWS_PER_PAGE).count();
    for (i, chunk) in rows.chunks(REPORT_ROWS_PER_PAGE).enumerate() {
        if i > 0 {
            write!(writer, "\x0c")?;
        }
        writeln!(writer, "{}", Table::new(chunk.to_vec()).with(Style::ascii()))?;
        writeln!(writer, "Page {} / {}", i + 1, pages)?;
    }
    Ok(())
}

/// Write `series` to `dir` in `format` and return the created file's path.
pub fn export_series(
    dir: &Path,
    format: ExportFormat,
    crop: &str,
    series: &[NationalRecord],
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(crop, format));
    let writer = BufWriter::new(File::create(&path)?);
    match format {
        ExportFormat::Csv => write_series_csv(writer, series)?,
        ExportFormat::Json => write_series_json(writer, crop, series, Utc::now())?,
        ExportFormat::Report => {
            write_series_report(writer, crop, series, Utc::now().date_naive())?
        }
    }
    log::info!("exported {} rows to {}", series.len(), path.display());
    Ok(path)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Console preview of rows whose columns are only known at run time.
pub fn preview_grid(header: Vec<String>, rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
