//! End-to-end tests: datasets on disk through loading, selection and export.

use std::fs;
use std::path::{Path, PathBuf};

use crop_insight::classify::ColorBucket;
use crop_insight::dashboard::{self, DisplayOptions};
use crop_insight::error::LoadError;
use crop_insight::loader::{load_all, DataSources};
use crop_insight::output::{export_series, ExportFormat};
use crop_insight::selection::{SelectionState, ToggleOutcome};

const NATIONAL: &str = "\
year,crop_en,crop_fr,production_kt,area_ha,yield_tha
2013,Wheat,Blé,100,2000000,0.05
2023,Wheat,Blé,150,,
2013,Barley,Orge,40,,
2023,Barley,Orge,60,,
2018,Olives,Olives,30,,
2019,Tomatoes,Tomates,20,,
2020,Citrus Fruit,Agrumes,10,,
abc,Wheat,Blé,10,,
2014,,X,10,,
2015,Wheat,Blé,-3,,
2013,Wheat,Blé,999,,
";

const REGIONAL: &str = r#"[
  {"region": "Fès-Meknès", "production_2023_kt": 1520.0},
  {"region": "Oriental", "production_2023_kt": "85.2"},
  {"region": null, "production_2023_kt": 3}
]"#;

const CROPS: &str = r#"[
  {"en": "Wheat", "fr": "Blé"},
  {"en": "Barley", "fr": "Orge"},
  {"en": "Olives", "fr": "Olives"},
  {"en": "Tomatoes", "fr": "Tomates"},
  {"en": "Citrus Fruit", "fr": "Agrumes"}
]"#;

const GEOGRAPHY: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"nom_region": "Fès-Meknès"}, "geometry": null},
    {"type": "Feature", "properties": {"nom_region": "Dakhla-Oued Ed-Dahab"}, "geometry": null},
    {"type": "Feature", "properties": {}, "geometry": null}
  ]
}"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn sources(dir: &Path) -> DataSources {
    DataSources {
        national: write(dir, "national.csv", NATIONAL),
        regional: write(dir, "regional.json", REGIONAL),
        crops: Some(write(dir, "crops.json", CROPS)),
        geography: Some(write(dir, "regions.geojson", GEOGRAPHY)),
        region_property: "nom_region".to_string(),
    }
}

#[test]
fn load_counts_dropped_rows_per_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = load_all(&sources(dir.path())).unwrap();

    assert_eq!(store.national.len(), 7);
    assert_eq!(store.report.national.dropped_rows, 4);
    assert_eq!(store.regional.len(), 2);
    assert_eq!(store.report.regional.dropped_rows, 1);
    assert_eq!(store.crops.len(), 5);
    assert_eq!(store.report.geography.dropped_rows, 1);
    assert_eq!(store.report.dropped_rows(), 6);
    assert_eq!(store.region_value("Oriental"), 85.2);
    assert_eq!(store.year_bounds(), Some((2013, 2023)));
}

#[test]
fn single_crop_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let store = load_all(&sources(dir.path())).unwrap();
    let selection = SelectionState::new("Wheat", (2013, 2023));

    let view = dashboard::render(&store, &selection, &DisplayOptions::default());

    assert_eq!(view.series.len(), 2);
    assert_eq!(view.kpis.total, 250);
    assert_eq!(view.kpis.growth_rate, 50.0);
    assert_eq!(view.kpis.top_region.name, "Fès-Meknès");
    assert_eq!(view.top_crops[0].label, "Blé");
    assert_eq!(view.map.len(), 2);
    assert_eq!(view.map[0].bucket, ColorBucket::Peak);
    assert_eq!(view.map[1].value, 0.0);
    assert_eq!(view.map[1].bucket, ColorBucket::Empty);
}

#[test]
fn comparison_caps_at_four_crops() {
    let dir = tempfile::tempdir().unwrap();
    let store = load_all(&sources(dir.path())).unwrap();
    let mut selection = SelectionState::new("Wheat", (2013, 2023));

    selection.toggle_comparison_mode();
    for crop in ["Barley", "Olives", "Tomatoes"] {
        assert_eq!(selection.toggle_crop(crop), ToggleOutcome::Added);
    }
    assert_eq!(selection.toggle_crop("Citrus Fruit"), ToggleOutcome::Rejected);

    let view = dashboard::render(&store, &selection, &DisplayOptions::default());
    let comparison = view.comparison.unwrap();
    assert_eq!(comparison.matrix.crops.len(), 4);
    assert_eq!(comparison.matrix.years(), vec![2013, 2018, 2019, 2020, 2023]);
    assert_eq!(comparison.matrix.value(2018, "Wheat"), Some(0.0));
}

#[test]
fn missing_file_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = sources(dir.path());
    sources.regional = dir.path().join("absent.json");

    match load_all(&sources) {
        Err(LoadError::Io { path, .. }) => assert!(path.ends_with("absent.json")),
        other => panic!("expected an I/O error, got {:?}", other.map(|s| s.national.len())),
    }
}

#[test]
fn missing_required_column_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = sources(dir.path());
    sources.national = write(dir.path(), "bad.csv", "year,crop_en,crop_fr\n2013,Wheat,Blé\n");

    match load_all(&sources) {
        Err(LoadError::MissingColumn { column, .. }) => assert_eq!(column, "production_kt"),
        other => panic!("expected a missing column, got {:?}", other.map(|s| s.national.len())),
    }
}

#[test]
fn exports_selected_series() {
    let dir = tempfile::tempdir().unwrap();
    let store = load_all(&sources(dir.path())).unwrap();
    let mut selection = SelectionState::new("Wheat", (2013, 2023));
    assert!(selection.set_year_max(2020));
    let view = dashboard::render(&store, &selection, &DisplayOptions::default());

    let out = tempfile::tempdir().unwrap();
    let csv_path = export_series(out.path(), ExportFormat::Csv, "Wheat", &view.series).unwrap();
    assert!(csv_path.ends_with("morocco-Wheat-data.csv"));
    let text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "Year,Crop,Production (kt),Area (ha),Yield (t/ha)",
            "2013,Blé,100,2000000,0.05",
        ]
    );

    let json_path = export_series(out.path(), ExportFormat::Json, "Wheat", &view.series).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(doc["crop"], "Wheat");
    assert_eq!(doc["data"].as_array().unwrap().len(), 1);
}
