//! Shapes derived views into the inputs each display widget expects.
use crate::classify::{color_bucket, ColorBucket};
use crate::table::{CellValue, Column, TableRow};
use crate::types::{ComparisonMatrix, Geography, KpiSummary, NationalRecord, RegionValueMap, TopEntry};
use crate::util::{format_int, format_number};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;

/// Bars shown by the top crops widget.
pub const TOP_DISPLAY_COUNT: usize = 5;

impl TableRow for NationalRecord {
    fn cell(&self, key: &str) -> CellValue {
        match key {
            "year" => CellValue::Number(self.year as f64),
            "crop_en" => CellValue::Text(self.crop_label_primary.clone()),
            "crop_fr" => CellValue::Text(self.crop_label_secondary.clone()),
            "production_kt" => CellValue::Number(self.production_kt),
            "area_ha" => self.area_ha.into(),
            "yield_tha" => self.yield_t_per_ha.into(),
            _ => CellValue::Missing,
        }
    }
}

fn kt_cell(v: &CellValue) -> String {
    match v {
        CellValue::Number(n) => format!("{} kt", format_number(*n, 1)),
        _ => "N/A".to_string(),
    }
}

fn hectares_cell(v: &CellValue) -> String {
    match v {
        CellValue::Number(n) => format!("{} ha", format_number(*n, 0)),
        _ => "N/A".to_string(),
    }
}

fn yield_cell(v: &CellValue) -> String {
    match v {
        CellValue::Number(n) => format!("{:.2} t/ha", n),
        _ => "N/A".to_string(),
    }
}

/// Column layout of the national data table.
pub static NATIONAL_COLUMNS: Lazy<Vec<Column>> = Lazy::new(|| {
    vec![
        Column::new("year", "Year"),
        Column::new("crop_en", "Crop"),
        Column::new("crop_fr", "Culture"),
        Column::new("production_kt", "Production").with_format(kt_cell),
        Column::new("area_ha", "Area").with_format(hectares_cell),
        Column::new("yield_tha", "Yield").with_format(yield_cell),
    ]
});

/// Display strings for one table row, in column order.
pub fn render_row<R: TableRow>(row: &R, columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.render(&row.cell(c.key))).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub production_kt: f64,
}

/// Input of the production line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChartInput {
    pub crop_label: String,
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

pub fn line_chart(series: &[NationalRecord], crop_label: &str, color: &str) -> LineChartInput {
    LineChartInput {
        crop_label: crop_label.to_string(),
        color: color.to_string(),
        points: series
            .iter()
            .map(|r| SeriesPoint {
                year: r.year,
                production_kt: r.production_kt,
            })
            .collect(),
    }
}

/// The prefix of a ranking the bar chart displays.
pub fn top_bars(entries: &[TopEntry], count: usize) -> Vec<TopEntry> {
    entries.iter().take(count).cloned().collect()
}

/// Colour of the `index`-th compared crop when no override is configured.
pub fn fallback_crop_color(index: usize) -> String {
    format!("hsl({}, 70%, 50%)", index * 60)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonChartInput {
    pub matrix: ComparisonMatrix,
    pub colors: BTreeMap<String, String>,
}

pub fn comparison_chart(
    matrix: ComparisonMatrix,
    overrides: &BTreeMap<String, String>,
) -> ComparisonChartInput {
    let colors = matrix
        .crops
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let color = overrides
                .get(code)
                .cloned()
                .unwrap_or_else(|| fallback_crop_color(i));
            (code.clone(), color)
        })
        .collect();
    ComparisonChartInput { matrix, colors }
}

/// Leaflet-style path options for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStyle {
    pub fill_color: &'static str,
    pub weight: f64,
    pub color: &'static str,
    pub fill_opacity: f64,
}

impl FeatureStyle {
    pub fn for_bucket(bucket: ColorBucket) -> Self {
        FeatureStyle {
            fill_color: bucket.fill_color(),
            weight: 2.5,
            color: "white",
            fill_opacity: 0.8,
        }
    }
}

/// Per-feature map output: the style plus the popup detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFeature {
    pub region_name: String,
    pub value: f64,
    pub bucket: ColorBucket,
    pub style: FeatureStyle,
}

/// Style every feature; regions without data read 0.
pub fn map_features(geography: &Geography, values: &RegionValueMap) -> Vec<MapFeature> {
    geography
        .features
        .iter()
        .map(|f| region_feature(&f.region_name, values))
        .collect()
}

pub fn region_feature(region_name: &str, values: &RegionValueMap) -> MapFeature {
    let value = values.get(region_name).copied().unwrap_or(0.0);
    let bucket = color_bucket(value);
    MapFeature {
        region_name: region_name.to_string(),
        value,
        bucket,
        style: FeatureStyle::for_bucket(bucket),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub fill_color: &'static str,
}

/// Map legend, highest bucket first.
pub fn map_legend() -> Vec<LegendEntry> {
    ColorBucket::ALL
        .iter()
        .rev()
        .map(|b| LegendEntry {
            label: b.legend(),
            fill_color: b.fill_color(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub title: &'static str,
    pub value: String,
    pub subtitle: Option<String>,
    pub trend: Option<Trend>,
}

/// The four headline cards.
pub fn kpi_cards(kpis: &KpiSummary) -> Vec<KpiCard> {
    let growth_sign = if kpis.growth_rate > 0.0 { "+" } else { "" };
    vec![
        KpiCard {
            title: "Total production",
            value: format!("{} kt", format_int(kpis.total)),
            subtitle: None,
            trend: None,
        },
        KpiCard {
            title: "Average production",
            value: format!("{:.1} kt", kpis.average),
            subtitle: None,
            trend: None,
        },
        KpiCard {
            title: "Growth rate",
            value: format!("{}{:.1}%", growth_sign, kpis.growth_rate),
            subtitle: None,
            trend: Some(if kpis.growth_rate >= 0.0 {
                Trend::Up
            } else {
                Trend::Down
            }),
        },
        KpiCard {
            title: "Top region",
            value: kpis.top_region.name.clone(),
            subtitle: Some(format!("{} kt", format_number(kpis.top_region.value, 1))),
            trend: None,
        },
    ]
}
