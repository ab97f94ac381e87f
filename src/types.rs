use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabled::Tabled;

/// One row of the national series CSV as read from disk. Every field stays a
/// string so a single bad cell drops only its own row.
#[derive(Debug, Deserialize)]
pub struct RawNationalRow {
    #[serde(rename = "year")]
    pub year: Option<String>,
    #[serde(rename = "crop_en")]
    pub crop_en: Option<String>,
    #[serde(rename = "crop_fr")]
    pub crop_fr: Option<String>,
    #[serde(rename = "production_kt")]
    pub production_kt: Option<String>,
    #[serde(rename = "area_ha")]
    pub area_ha: Option<String>,
    #[serde(rename = "yield_tha")]
    pub yield_tha: Option<String>,
}

/// Regional snapshot row. The JSON export carries the value as a number while
/// the CSV export carries it as text, so both land in a `serde_json::Value`.
#[derive(Debug, Deserialize)]
pub struct RawRegionalRow {
    #[serde(rename = "region")]
    pub region: Option<String>,
    #[serde(rename = "production_2023_kt", alias = "production_kt")]
    pub production_kt: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawCropRow {
    pub en: Option<String>,
    pub fr: Option<String>,
}

/// Production of one crop in one year, national scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalRecord {
    pub year: i32,
    #[serde(rename = "crop_en")]
    pub crop_code: String,
    #[serde(skip)]
    pub crop_label_primary: String,
    #[serde(rename = "crop_fr")]
    pub crop_label_secondary: String,
    pub production_kt: f64,
    #[serde(rename = "area_ha")]
    pub area_ha: Option<f64>,
    #[serde(rename = "yield_tha")]
    pub yield_t_per_ha: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalRecord {
    pub region_name: String,
    pub production_kt: f64,
}

/// A selectable crop. `code` joins against [`NationalRecord::crop_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropDescriptor {
    pub code: String,
    pub label_primary: String,
    pub label_secondary: String,
}

/// Region name to production value, built once per regional load.
pub type RegionValueMap = HashMap<String, f64>;

/// National records of one crop, ordered by year ascending.
pub type TimeSeries = Vec<NationalRecord>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopEntry {
    pub label: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub year: i32,
    /// Aligned with [`ComparisonMatrix::crops`].
    pub values: Vec<f64>,
}

/// One row per year, one column per requested crop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMatrix {
    pub crops: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonMatrix {
    /// Value for `crop` in the row at `year`, if both exist.
    pub fn value(&self, year: i32, crop: &str) -> Option<f64> {
        let col = self.crops.iter().position(|c| c == crop)?;
        self.rows
            .iter()
            .find(|r| r.year == year)
            .map(|r| r.values[col])
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRegion {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total: i64,
    pub average: f64,
    pub growth_rate: f64,
    pub top_region: TopRegion,
}

impl KpiSummary {
    pub fn empty() -> Self {
        KpiSummary {
            total: 0,
            average: 0.0,
            growth_rate: 0.0,
            top_region: TopRegion {
                name: "N/A".to_string(),
                value: 0.0,
            },
        }
    }
}

/// Row layout shared by the CSV export and the paginated report.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ExportRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Production (kt)")]
    #[tabled(rename = "Production (kt)")]
    pub production_kt: String,
    #[serde(rename = "Area (ha)")]
    #[tabled(rename = "Area (ha)")]
    pub area_ha: String,
    #[serde(rename = "Yield (t/ha)")]
    #[tabled(rename = "Yield (t/ha)")]
    pub yield_t_per_ha: String,
}

/// A map feature reduced to what the dashboard joins on: its region name. The
/// geometry is carried through untouched for the map widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionFeature {
    pub region_name: String,
    pub geometry: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Geography {
    pub features: Vec<RegionFeature>,
}
