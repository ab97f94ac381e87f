use crate::error::{LoadError, Result};
use crate::types::{
    CropDescriptor, Geography, NationalRecord, RawCropRow, RawNationalRow, RawRegionalRow,
    RegionFeature, RegionValueMap, RegionalRecord,
};
use crate::util::{clean_text, parse_f64_safe, parse_i32_safe};
use crate::views;
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::thread;

const NATIONAL_COLUMNS: [&str; 4] = ["year", "crop_en", "crop_fr", "production_kt"];

/// Where each dataset lives.
#[derive(Debug, Clone)]
pub struct DataSources {
    pub national: PathBuf,
    pub regional: PathBuf,
    /// When absent the catalog is derived from the national table.
    pub crops: Option<PathBuf>,
    pub geography: Option<PathBuf>,
    /// Feature property holding the region name in the geography source.
    pub region_property: String,
}

/// Row accounting for a single source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
}

impl SourceReport {
    fn keep(&mut self) {
        self.total_rows += 1;
        self.kept_rows += 1;
    }

    fn drop_row(&mut self) {
        self.total_rows += 1;
        self.dropped_rows += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub national: SourceReport,
    pub regional: SourceReport,
    pub crops: SourceReport,
    pub geography: SourceReport,
}

impl LoadReport {
    pub fn dropped_rows(&self) -> usize {
        self.national.dropped_rows
            + self.regional.dropped_rows
            + self.crops.dropped_rows
            + self.geography.dropped_rows
    }
}

/// Immutable tables backing every derived view.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub national: Vec<NationalRecord>,
    pub regional: Vec<RegionalRecord>,
    pub crops: Vec<CropDescriptor>,
    pub region_values: RegionValueMap,
    pub geography: Option<Geography>,
    pub report: LoadReport,
}

impl RecordStore {
    /// Assemble a store from already-parsed tables.
    pub fn from_tables(
        national: Vec<NationalRecord>,
        regional: Vec<RegionalRecord>,
        crops: Vec<CropDescriptor>,
    ) -> Self {
        let region_values = region_value_map(&regional);
        RecordStore {
            national,
            regional,
            crops,
            region_values,
            geography: None,
            report: LoadReport::default(),
        }
    }

    /// Production for a region, 0 when the region has no regional record.
    pub fn region_value(&self, region_name: &str) -> f64 {
        self.region_values.get(region_name).copied().unwrap_or(0.0)
    }

    pub fn crop(&self, code: &str) -> Option<&CropDescriptor> {
        self.crops.iter().find(|c| c.code == code)
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        views::year_bounds(&self.national)
    }
}

pub fn region_value_map(regional: &[RegionalRecord]) -> RegionValueMap {
    regional
        .iter()
        .map(|r| (r.region_name.clone(), r.production_kt))
        .collect()
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn require_columns(headers: &csv::StringRecord, required: &[&str], path: &Path) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(LoadError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

pub fn load_national(path: &Path) -> Result<(Vec<NationalRecord>, SourceReport)> {
    read_national(open(path)?, path)
}

/// Parse the national series. `path` is only used in error messages.
pub fn read_national<R: Read>(reader: R, path: &Path) -> Result<(Vec<NationalRecord>, SourceReport)> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    require_columns(&headers, &NATIONAL_COLUMNS, path)?;

    let mut report = SourceReport::default();
    let mut seen: HashSet<(i32, String)> = HashSet::new();
    let mut records = Vec::new();

    for (line, result) in rdr.deserialize::<RawNationalRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("national row {}: {}", line + 2, e);
                report.drop_row();
                continue;
            }
        };

        let Some(year) = parse_i32_safe(row.year.as_deref()) else {
            debug!("national row {}: unparsable year {:?}", line + 2, row.year);
            report.drop_row();
            continue;
        };
        let Some(crop_code) = clean_text(row.crop_en.as_deref()) else {
            debug!("national row {}: missing crop name", line + 2);
            report.drop_row();
            continue;
        };
        let production_kt = match parse_f64_safe(row.production_kt.as_deref()) {
            Some(v) if v >= 0.0 => v,
            _ => {
                debug!(
                    "national row {}: invalid production {:?}",
                    line + 2,
                    row.production_kt
                );
                report.drop_row();
                continue;
            }
        };
        if !seen.insert((year, crop_code.clone())) {
            warn!("national row {}: duplicate {} {}, keeping first", line + 2, crop_code, year);
            report.drop_row();
            continue;
        }

        // Optional measurements degrade to absent rather than dropping the row.
        let area_ha = parse_f64_safe(row.area_ha.as_deref()).filter(|v| *v >= 0.0);
        let yield_t_per_ha = parse_f64_safe(row.yield_tha.as_deref()).filter(|v| *v >= 0.0);
        let crop_label_secondary =
            clean_text(row.crop_fr.as_deref()).unwrap_or_else(|| crop_code.clone());

        records.push(NationalRecord {
            year,
            crop_label_primary: crop_code.clone(),
            crop_code,
            crop_label_secondary,
            production_kt,
            area_ha,
            yield_t_per_ha,
        });
        report.keep();
    }

    Ok((records, report))
}

pub fn load_regional(path: &Path) -> Result<(Vec<RegionalRecord>, SourceReport)> {
    let reader = open(path)?;
    let rows: Vec<Option<RawRegionalRow>> = if is_csv(path) {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|source| LoadError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .clone();
        require_columns(&headers, &["region"], path)?;
        if !headers
            .iter()
            .any(|h| matches!(h.trim(), "production_2023_kt" | "production_kt"))
        {
            return Err(LoadError::MissingColumn {
                column: "production_2023_kt".to_string(),
                path: path.to_path_buf(),
            });
        }
        rdr.deserialize::<RawRegionalRow>().map(|r| r.ok()).collect()
    } else {
        let items: Vec<serde_json::Value> =
            serde_json::from_reader(reader).map_err(|source| LoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        items
            .into_iter()
            .map(|v| serde_json::from_value::<RawRegionalRow>(v).ok())
            .collect()
    };
    Ok(clean_regional(rows))
}

fn regional_value(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => parse_f64_safe(Some(s)),
        _ => None,
    }
}

fn clean_regional(rows: Vec<Option<RawRegionalRow>>) -> (Vec<RegionalRecord>, SourceReport) {
    let mut report = SourceReport::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for row in rows {
        let parsed = row.and_then(|r| {
            let name = clean_text(r.region.as_deref())?;
            let value = r.production_kt.as_ref().and_then(regional_value)?;
            (value >= 0.0).then_some((name, value))
        });
        let Some((region_name, production_kt)) = parsed else {
            debug!("regional row dropped: missing region or production");
            report.drop_row();
            continue;
        };
        if !seen.insert(region_name.clone()) {
            warn!("duplicate region {}, keeping first", region_name);
            report.drop_row();
            continue;
        }
        records.push(RegionalRecord {
            region_name,
            production_kt,
        });
        report.keep();
    }
    (records, report)
}

pub fn load_crops(path: &Path) -> Result<(Vec<CropDescriptor>, SourceReport)> {
    let items: Vec<serde_json::Value> =
        serde_json::from_reader(open(path)?).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let mut report = SourceReport::default();
    let mut crops: Vec<CropDescriptor> = Vec::new();
    for item in items {
        let parsed = serde_json::from_value::<RawCropRow>(item).ok().and_then(|r| {
            let code = clean_text(r.en.as_deref())?;
            let fr = clean_text(r.fr.as_deref()).unwrap_or_else(|| code.clone());
            Some((code, fr))
        });
        match parsed {
            Some((code, fr)) if !crops.iter().any(|c| c.code == code) => {
                crops.push(CropDescriptor {
                    label_primary: code.clone(),
                    code,
                    label_secondary: fr,
                });
                report.keep();
            }
            _ => report.drop_row(),
        }
    }
    Ok((crops, report))
}

/// Catalog of the crops present in the national table, in first-seen order.
pub fn crops_from_national(national: &[NationalRecord]) -> Vec<CropDescriptor> {
    let mut crops: Vec<CropDescriptor> = Vec::new();
    for r in national {
        if !crops.iter().any(|c| c.code == r.crop_code) {
            crops.push(CropDescriptor {
                code: r.crop_code.clone(),
                label_primary: r.crop_label_primary.clone(),
                label_secondary: r.crop_label_secondary.clone(),
            });
        }
    }
    crops
}

pub fn load_geography(path: &Path, region_property: &str) -> Result<(Geography, SourceReport)> {
    let doc: serde_json::Value =
        serde_json::from_reader(open(path)?).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let features = doc
        .get("features")
        .and_then(|f| f.as_array())
        .ok_or_else(|| LoadError::InvalidDocument {
            path: path.to_path_buf(),
            reason: "expected a FeatureCollection with a `features` array".to_string(),
        })?;

    let mut report = SourceReport::default();
    let mut geography = Geography::default();
    for feature in features {
        let name = feature
            .get("properties")
            .and_then(|p| p.get(region_property))
            .and_then(|n| n.as_str())
            .and_then(|n| clean_text(Some(n)));
        match name {
            Some(region_name) => {
                geography.features.push(RegionFeature {
                    region_name,
                    geometry: feature
                        .get("geometry")
                        .cloned()
                        .unwrap_or(serde_json::Value::Null),
                });
                report.keep();
            }
            None => {
                debug!("feature without `{}` property dropped", region_property);
                report.drop_row();
            }
        }
    }
    Ok((geography, report))
}

fn joined<T>(
    handle: thread::ScopedJoinHandle<'_, Result<T>>,
    source_name: &'static str,
) -> Result<T> {
    handle
        .join()
        .map_err(|_| LoadError::WorkerPanicked { source_name })?
}

/// Load every configured source concurrently and wait for all of them.
///
/// The first failing source, in the order national, regional, crops,
/// geography, decides the error.
pub fn load_all(sources: &DataSources) -> Result<RecordStore> {
    let (national, regional, crops, geography) = thread::scope(|s| {
        let national = s.spawn(|| load_national(&sources.national));
        let regional = s.spawn(|| load_regional(&sources.regional));
        let crops = sources
            .crops
            .as_deref()
            .map(|p| s.spawn(move || load_crops(p)));
        let geography = sources
            .geography
            .as_deref()
            .map(|p| s.spawn(move || load_geography(p, &sources.region_property)));
        (
            joined(national, "national"),
            joined(regional, "regional"),
            crops.map(|h| joined(h, "crops")),
            geography.map(|h| joined(h, "geography")),
        )
    });

    let (national, national_report) = national?;
    let (regional, regional_report) = regional?;
    let (crops, crops_report) = match crops.transpose()? {
        Some(loaded) => loaded,
        None => (crops_from_national(&national), SourceReport::default()),
    };
    let (geography, geography_report) = match geography.transpose()? {
        Some((g, r)) => (Some(g), r),
        None => (None, SourceReport::default()),
    };

    let report = LoadReport {
        national: national_report,
        regional: regional_report,
        crops: crops_report,
        geography: geography_report,
    };
    info!(
        "loaded {} national records, {} regions, {} crops ({} rows dropped)",
        national.len(),
        regional.len(),
        crops.len(),
        report.dropped_rows()
    );

    let mut store = RecordStore::from_tables(national, regional, crops);
    store.geography = geography;
    store.report = report;
    Ok(store)
}
