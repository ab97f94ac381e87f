//! Full recomputation of every dashboard view from the store and selection.
use crate::adapters::{
    comparison_chart, kpi_cards, line_chart, map_features, top_bars, ComparisonChartInput,
    KpiCard, LineChartInput, MapFeature, NATIONAL_COLUMNS,
};
use crate::loader::RecordStore;
use crate::selection::SelectionState;
use crate::table::{table_view, TablePage};
use crate::types::{KpiSummary, NationalRecord, TimeSeries, TopEntry};
use crate::views::{build_comparison_matrix, compute_kpis, distribution, filter_series, top_n};
use log::debug;
use std::collections::BTreeMap;

/// Display options that are not part of the user selection.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub top_count: usize,
    /// Year of the top crops ranking; the latest loaded year when `None`.
    pub top_year: Option<i32>,
    pub series_color: String,
    pub crop_colors: BTreeMap<String, String>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            top_count: crate::adapters::TOP_DISPLAY_COUNT,
            top_year: None,
            series_color: "#006400".to_string(),
            crop_colors: BTreeMap::new(),
        }
    }
}

/// Everything the widgets need for one frame.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub crop_label: String,
    pub series: TimeSeries,
    pub line_chart: LineChartInput,
    pub kpis: KpiSummary,
    pub kpi_cards: Vec<KpiCard>,
    pub top_year: Option<i32>,
    pub top_crops: Vec<TopEntry>,
    /// Every crop of the top year with its share of that year's total.
    pub distribution: Vec<(TopEntry, f64)>,
    /// Present in comparison mode only.
    pub comparison: Option<ComparisonChartInput>,
    pub table: TablePage<NationalRecord>,
    pub map: Vec<MapFeature>,
}

/// Display label of a crop code, the code itself when it is not catalogued.
pub fn crop_label(store: &RecordStore, code: &str) -> String {
    store
        .crop(code)
        .map(|c| c.label_secondary.clone())
        .unwrap_or_else(|| code.to_string())
}

pub fn render(
    store: &RecordStore,
    selection: &SelectionState,
    options: &DisplayOptions,
) -> DashboardView {
    let (year_min, year_max) = selection.year_range();
    let crop = selection.active_crop();
    let label = crop_label(store, crop);

    let series = filter_series(&store.national, crop, year_min, year_max);
    let kpis = compute_kpis(&series, &store.regional);

    let top_year = options
        .top_year
        .or_else(|| store.year_bounds().map(|(_, hi)| hi));
    let ranking = top_year
        .map(|y| top_n(&store.national, y))
        .unwrap_or_default();
    let top_crops = top_bars(&ranking, options.top_count);

    let comparison = selection.comparison_mode().then(|| {
        let matrix =
            build_comparison_matrix(&store.national, selection.active_crops(), year_min, year_max);
        comparison_chart(matrix, &options.crop_colors)
    });

    // The table lists the whole year range for every crop; the search box is
    // how users narrow it.
    let table_rows: Vec<NationalRecord> = store
        .national
        .iter()
        .filter(|r| (year_min..=year_max).contains(&r.year))
        .cloned()
        .collect();
    let table = table_view(&table_rows, &NATIONAL_COLUMNS, &selection.table_query());

    let map = store
        .geography
        .as_ref()
        .map(|g| map_features(g, &store.region_values))
        .unwrap_or_default();

    debug!(
        "recomputed views: {} series points, {} table rows, {} map features",
        series.len(),
        table.total_rows,
        map.len()
    );

    DashboardView {
        line_chart: line_chart(&series, &label, &options.series_color),
        crop_label: label,
        kpi_cards: kpi_cards(&kpis),
        kpis,
        series,
        top_year,
        distribution: distribution(&ranking),
        top_crops,
        comparison,
        table,
        map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CropDescriptor, Geography, RegionFeature, RegionalRecord};

    fn rec(year: i32, crop: &str, fr: &str, kt: f64) -> NationalRecord {
        NationalRecord {
            year,
            crop_code: crop.to_string(),
            crop_label_primary: crop.to_string(),
            crop_label_secondary: fr.to_string(),
            production_kt: kt,
            area_ha: None,
            yield_t_per_ha: None,
        }
    }

    fn store() -> RecordStore {
        let mut store = RecordStore::from_tables(
            vec![
                rec(2013, "Wheat", "Blé", 100.0),
                rec(2023, "Wheat", "Blé", 150.0),
                rec(2018, "Barley", "Orge", 40.0),
                rec(2023, "Barley", "Orge", 60.0),
            ],
            vec![RegionalRecord {
                region_name: "Fès-Meknès".to_string(),
                production_kt: 1520.0,
            }],
            vec![CropDescriptor {
                code: "Wheat".to_string(),
                label_primary: "Wheat".to_string(),
                label_secondary: "Blé".to_string(),
            }],
        );
        store.geography = Some(Geography {
            features: vec![RegionFeature {
                region_name: "Oriental".to_string(),
                geometry: serde_json::Value::Null,
            }],
        });
        store
    }

    #[test]
    fn renders_every_view_for_single_crop() {
        let store = store();
        let selection = SelectionState::new("Wheat", (2013, 2023));
        let view = render(&store, &selection, &DisplayOptions::default());
        assert_eq!(view.crop_label, "Blé");
        assert_eq!(view.series.len(), 2);
        assert_eq!(view.kpis.growth_rate, 50.0);
        assert_eq!(view.kpis.top_region.name, "Fès-Meknès");
        assert_eq!(view.top_year, Some(2023));
        assert_eq!(view.top_crops[0].label, "Blé");
        assert!(view.comparison.is_none());
        assert_eq!(view.table.total_rows, 4);
        assert_eq!(view.map[0].value, 0.0);
    }

    #[test]
    fn distribution_covers_every_crop_of_the_year() {
        let national: Vec<NationalRecord> = (0..10)
            .map(|i| rec(2023, &format!("crop{i}"), &format!("culture{i}"), 10.0))
            .collect();
        let store = RecordStore::from_tables(national, Vec::new(), Vec::new());
        let selection = SelectionState::new("crop0", (2023, 2023));
        let view = render(&store, &selection, &DisplayOptions::default());

        assert_eq!(view.top_crops.len(), 5);
        assert_eq!(view.distribution.len(), 10);
        assert!(view.distribution.iter().all(|(_, share)| (share - 10.0).abs() < 1e-9));
    }

    #[test]
    fn comparison_mode_adds_matrix() {
        let store = store();
        let mut selection = SelectionState::new("Wheat", (2013, 2023));
        selection.toggle_comparison_mode();
        selection.toggle_crop("Barley");
        let view = render(&store, &selection, &DisplayOptions::default());
        let comparison = view.comparison.expect("comparison view");
        assert_eq!(comparison.matrix.years(), vec![2013, 2018, 2023]);
        assert_eq!(comparison.matrix.value(2018, "Wheat"), Some(0.0));
        assert_eq!(comparison.colors.len(), 2);
    }

    #[test]
    fn table_follows_year_range_and_search() {
        let store = store();
        let mut selection = SelectionState::new("Wheat", (2013, 2023));
        selection.set_year_min(2018);
        selection.set_search("orge");
        let view = render(&store, &selection, &DisplayOptions::default());
        assert_eq!(view.table.total_rows, 2);
        assert!(view
            .table
            .page_rows
            .iter()
            .all(|r| r.crop_code == "Barley"));
    }
}
