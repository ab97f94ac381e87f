//! Command line options and the resolved run configuration.
use crate::dashboard::DisplayOptions;
use crate::loader::DataSources;
use crate::output::ExportFormat;
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "crop_insight",
    version,
    about = "Morocco agricultural production dashboard"
)]
pub struct Cli {
    /// Directory holding the datasets.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
    /// National series CSV [default: <data-dir>/processed/fao_national_clean.csv]
    #[arg(long)]
    pub national: Option<PathBuf>,
    /// Regional snapshot, JSON or CSV [default: <data-dir>/processed/regional_cereals_2023.json]
    #[arg(long)]
    pub regional: Option<PathBuf>,
    /// Crop catalog JSON; derived from the national series when omitted.
    #[arg(long)]
    pub crops: Option<PathBuf>,
    /// Region boundaries GeoJSON.
    #[arg(long)]
    pub geography: Option<PathBuf>,
    /// Feature property carrying the region name.
    #[arg(long, default_value = "nom_region")]
    pub region_property: String,

    /// Crop to show; the first catalogued crop when omitted.
    #[arg(long)]
    pub crop: Option<String>,
    /// First year of the range.
    #[arg(long = "from")]
    pub year_from: Option<i32>,
    /// Last year of the range.
    #[arg(long = "to")]
    pub year_to: Option<i32>,
    /// Crops to overlay (repeatable, at most 4); enables comparison mode.
    #[arg(long = "compare")]
    pub compare: Vec<String>,
    /// Number of crops in the top ranking.
    #[arg(long, default_value_t = crate::adapters::TOP_DISPLAY_COUNT)]
    pub top: usize,
    /// Year of the top ranking; the latest year when omitted.
    #[arg(long)]
    pub top_year: Option<i32>,
    /// Colour override for a compared crop, as CODE=COLOR.
    #[arg(long = "color", value_parser = parse_color)]
    pub colors: Vec<(String, String)>,

    /// Table search term.
    #[arg(long, default_value = "")]
    pub search: String,
    /// Table sort column key.
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending.
    #[arg(long)]
    pub desc: bool,
    /// Table page.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Export the selected series.
    #[arg(long, value_enum)]
    pub export: Option<ExportFormat>,
    /// Export directory.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Read commands from stdin after the first render.
    #[arg(long, short)]
    pub interactive: bool,
}

fn parse_color(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((code, color)) if !code.trim().is_empty() && !color.trim().is_empty() => {
            Ok((code.trim().to_string(), color.trim().to_string()))
        }
        _ => Err(format!("expected CODE=COLOR, got `{}`", s)),
    }
}

/// Initial selection requested on the command line.
#[derive(Debug, Clone, Default)]
pub struct SelectionSeed {
    pub crop: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub compare: Vec<String>,
    pub search: String,
    pub sort: Option<String>,
    pub descending: bool,
    pub page: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sources: DataSources,
    pub seed: SelectionSeed,
    pub display: DisplayOptions,
    pub export: Option<ExportFormat>,
    pub out_dir: PathBuf,
    pub interactive: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let sources = DataSources {
            national: cli
                .national
                .unwrap_or_else(|| cli.data_dir.join("processed/fao_national_clean.csv")),
            regional: cli
                .regional
                .unwrap_or_else(|| cli.data_dir.join("processed/regional_cereals_2023.json")),
            crops: cli.crops,
            geography: cli.geography,
            region_property: cli.region_property,
        };
        let display = DisplayOptions {
            top_count: cli.top,
            top_year: cli.top_year,
            crop_colors: cli.colors.into_iter().collect::<BTreeMap<_, _>>(),
            ..DisplayOptions::default()
        };
        Config {
            sources,
            seed: SelectionSeed {
                crop: cli.crop,
                year_from: cli.year_from,
                year_to: cli.year_to,
                compare: cli.compare,
                search: cli.search,
                sort: cli.sort,
                descending: cli.desc,
                page: cli.page,
            },
            display,
            export: cli.export,
            out_dir: cli.out,
            interactive: cli.interactive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_against_data_dir() {
        let cli = Cli::parse_from(["crop_insight", "--data-dir", "/srv/data"]);
        let config = Config::from(cli);
        assert_eq!(
            config.sources.national,
            PathBuf::from("/srv/data/processed/fao_national_clean.csv")
        );
        assert!(config.sources.crops.is_none());
        assert_eq!(config.sources.region_property, "nom_region");
        assert_eq!(config.display.top_count, 5);
        assert_eq!(config.seed.page, 1);
    }

    #[test]
    fn parses_selection_and_colors() {
        let cli = Cli::parse_from([
            "crop_insight",
            "--crop",
            "Barley",
            "--from",
            "2015",
            "--compare",
            "Wheat",
            "--compare",
            "Olives",
            "--color",
            "Wheat=#d97706",
            "--export",
            "json",
            "--desc",
        ]);
        let config = Config::from(cli);
        assert_eq!(config.seed.crop.as_deref(), Some("Barley"));
        assert_eq!(config.seed.year_from, Some(2015));
        assert_eq!(config.seed.compare, vec!["Wheat", "Olives"]);
        assert_eq!(config.display.crop_colors["Wheat"], "#d97706");
        assert_eq!(config.export, Some(ExportFormat::Json));
        assert!(config.seed.descending);
    }

    #[test]
    fn rejects_malformed_color() {
        assert!(Cli::try_parse_from(["crop_insight", "--color", "Wheat"]).is_err());
    }
}
