//! Derived views over the loaded tables.
//!
//! Every function here is pure: the same tables and selection always give the
//! same output, and nothing is cached between calls. Callers recompute the
//! full set of views after each selection change.
use crate::types::{
    ComparisonMatrix, ComparisonRow, KpiSummary, NationalRecord, RegionalRecord, TimeSeries,
    TopEntry, TopRegion,
};
use crate::util::average;
use std::collections::BTreeSet;

/// Records of `crop_code` with `year_min <= year <= year_max`, oldest first.
///
/// An inverted range yields an empty series.
pub fn filter_series(
    national: &[NationalRecord],
    crop_code: &str,
    year_min: i32,
    year_max: i32,
) -> TimeSeries {
    let mut series: TimeSeries = national
        .iter()
        .filter(|r| r.crop_code == crop_code && (year_min..=year_max).contains(&r.year))
        .cloned()
        .collect();
    series.sort_by_key(|r| r.year);
    series
}

/// Crops produced in `year`, largest rounded production first.
///
/// Equal values keep their input order. The full ranking is returned; widgets
/// take the prefix they display.
pub fn top_n(national: &[NationalRecord], year: i32) -> Vec<TopEntry> {
    let mut entries: Vec<TopEntry> = national
        .iter()
        .filter(|r| r.year == year)
        .map(|r| TopEntry {
            label: r.crop_label_secondary.clone(),
            value: r.production_kt.round() as i64,
        })
        .collect();
    // `sort_by` is stable, which gives the insertion-order tie-break.
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries
}

/// Share of each entry in the sum of all entries, in percent.
pub fn distribution(entries: &[TopEntry]) -> Vec<(TopEntry, f64)> {
    let total: i64 = entries.iter().map(|e| e.value).sum();
    entries
        .iter()
        .map(|e| {
            let share = if total == 0 {
                0.0
            } else {
                e.value as f64 / total as f64 * 100.0
            };
            (e.clone(), share)
        })
        .collect()
}

/// Sorted distinct years within the inclusive range, across every crop.
pub fn years_in_range(national: &[NationalRecord], year_min: i32, year_max: i32) -> Vec<i32> {
    national
        .iter()
        .map(|r| r.year)
        .filter(|y| (year_min..=year_max).contains(y))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Earliest and latest year in the table.
pub fn year_bounds(national: &[NationalRecord]) -> Option<(i32, i32)> {
    let min = national.iter().map(|r| r.year).min()?;
    let max = national.iter().map(|r| r.year).max()?;
    Some((min, max))
}

/// One row per year present in range for any crop, one column per requested
/// crop. A crop without a record for a year reads 0 there.
pub fn build_comparison_matrix(
    national: &[NationalRecord],
    crop_codes: &[String],
    year_min: i32,
    year_max: i32,
) -> ComparisonMatrix {
    let mut crops: Vec<String> = Vec::with_capacity(crop_codes.len());
    for code in crop_codes {
        if !crops.contains(code) {
            crops.push(code.clone());
        }
    }

    let rows = years_in_range(national, year_min, year_max)
        .into_iter()
        .map(|year| ComparisonRow {
            year,
            values: crops
                .iter()
                .map(|code| {
                    national
                        .iter()
                        .find(|r| r.year == year && &r.crop_code == code)
                        .map(|r| r.production_kt)
                        .unwrap_or(0.0)
                })
                .collect(),
        })
        .collect();

    ComparisonMatrix { crops, rows }
}

/// Headline figures for a series.
///
/// The growth rate is the endpoint change between the first and last year of
/// the series, not an annualised rate. The top region comes from the whole
/// regional snapshot since that table has no per-crop breakdown.
pub fn compute_kpis(series: &[NationalRecord], regional: &[RegionalRecord]) -> KpiSummary {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return KpiSummary::empty();
    };

    let values: Vec<f64> = series.iter().map(|r| r.production_kt).collect();
    let sum: f64 = values.iter().sum();
    let growth_rate = if first.production_kt == 0.0 {
        0.0
    } else {
        (last.production_kt - first.production_kt) / first.production_kt * 100.0
    };

    KpiSummary {
        total: sum.round() as i64,
        average: average(&values),
        growth_rate,
        top_region: top_region(regional),
    }
}

/// Region with the largest production; the first one wins a tie.
pub fn top_region(regional: &[RegionalRecord]) -> TopRegion {
    let mut best: Option<&RegionalRecord> = None;
    for r in regional {
        match best {
            Some(b) if r.production_kt <= b.production_kt => {}
            _ => best = Some(r),
        }
    }
    best.map(|r| TopRegion {
        name: r.region_name.clone(),
        value: r.production_kt,
    })
    .unwrap_or_else(|| KpiSummary::empty().top_region)
}
