// Entry point and high-level CLI flow.
//
// - The datasets are loaded once, concurrently, and the load diagnostics
//   are printed.
// - The dashboard is rendered for the selection given on the command line.
// - With `--interactive`, selection commands are read from stdin and every
//   accepted command re-renders the whole dashboard.
use anyhow::{bail, Context, Result};
use clap::Parser;
use crop_insight::adapters::{map_legend, render_row, NATIONAL_COLUMNS};
use crop_insight::config::{Cli, Config, SelectionSeed};
use crop_insight::dashboard::{self, DashboardView, DisplayOptions};
use crop_insight::loader::{self, RecordStore};
use crop_insight::output::{self, ExportFormat};
use crop_insight::selection::{SelectionState, MAX_COMPARED_CROPS};
use crop_insight::session::{self, Command, HELP};
use crop_insight::table::SortDirection;
use crop_insight::util;
use log::warn;
use std::io::{self, Write};
use std::path::Path;

/// Read one command line after printing the prompt. `None` on end of input.
fn read_command() -> Option<String> {
    print!("> ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn print_load_report(store: &RecordStore) {
    let report = &store.report;
    println!(
        "Loaded {} national rows ({} skipped), {} regions ({} skipped), {} crops.",
        util::format_int(report.national.kept_rows),
        util::format_int(report.national.dropped_rows),
        util::format_int(report.regional.kept_rows),
        util::format_int(report.regional.dropped_rows),
        util::format_int(store.crops.len())
    );
    if let Some(geography) = &store.geography {
        println!(
            "Info: {} map regions ({} features without a name skipped).",
            util::format_int(geography.features.len()),
            util::format_int(report.geography.dropped_rows)
        );
    }
    println!();
}

/// Build the starting selection from the command line seed.
fn seed_selection(store: &RecordStore, seed: &SelectionSeed) -> Result<SelectionState> {
    let Some(bounds) = store.year_bounds() else {
        bail!("the national series has no usable rows");
    };
    let crop = match &seed.crop {
        Some(code) => {
            if store.crop(code).is_none() {
                bail!("unknown crop `{}`", code);
            }
            code.clone()
        }
        None => match store.crops.first() {
            Some(c) => c.code.clone(),
            None => bail!("the crop catalog is empty"),
        },
    };

    let mut selection = SelectionState::new(crop, bounds);
    if let Some(y) = seed.year_from {
        if !selection.set_year_min(y) {
            bail!("--from {} is outside {}..={}", y, bounds.0, bounds.1);
        }
    }
    if let Some(y) = seed.year_to {
        if !selection.set_year_max(y) {
            bail!("--to {} must be between {} and {}", y, selection.year_range().0, bounds.1);
        }
    }

    if !seed.compare.is_empty() {
        let mut wanted: Vec<&str> = Vec::new();
        for code in &seed.compare {
            if store.crop(code).is_none() {
                warn!("ignoring unknown crop `{}` in --compare", code);
            } else if !wanted.contains(&code.as_str()) {
                wanted.push(code);
            }
        }
        if wanted.len() > MAX_COMPARED_CROPS {
            warn!(
                "ignoring {:?}: at most {} crops can be compared",
                &wanted[MAX_COMPARED_CROPS..],
                MAX_COMPARED_CROPS
            );
            wanted.truncate(MAX_COMPARED_CROPS);
        }

        // Entering comparison seeds the active crop; it stays only if listed.
        selection.toggle_comparison_mode();
        let seeded = selection.active_crop().to_string();
        for code in &wanted {
            if selection.active_crops().iter().any(|c| c == code) {
                continue;
            }
            selection.toggle_crop(code);
            if !wanted.contains(&seeded.as_str())
                && selection.active_crops().contains(&seeded)
            {
                selection.toggle_crop(&seeded);
            }
        }
    }

    if seed.sort.is_some() {
        let direction = if seed.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        selection.set_sort(seed.sort.clone(), direction);
    }
    selection.set_search(seed.search.clone());
    selection.set_page(seed.page);
    Ok(selection)
}

fn print_dashboard(store: &RecordStore, selection: &SelectionState, view: &DashboardView) {
    let (from, to) = selection.year_range();
    println!(
        "{} ({} - {}, showing {} years)\n",
        view.crop_label,
        from,
        to,
        selection.year_span()
    );

    for card in &view.kpi_cards {
        match &card.subtitle {
            Some(sub) => println!("  {:<20} {} ({})", card.title, card.value, sub),
            None => println!("  {:<20} {}", card.title, card.value),
        }
    }
    println!();

    println!("Production series");
    output::preview_table_rows(
        &output::report_rows(&view.series, &view.crop_label),
        view.series.len(),
    );

    if let Some(year) = view.top_year {
        println!("Top crops in {}", year);
        let rows = view
            .top_crops
            .iter()
            .zip(view.distribution.iter().map(|(_, share)| share))
            .map(|(e, share)| {
                vec![
                    e.label.clone(),
                    format!("{} kt", util::format_int(e.value)),
                    format!("{:.1}%", share),
                ]
            })
            .collect();
        output::preview_grid(vec!["Crop".into(), "Production".into(), "Share".into()], rows);
    }

    if let Some(comparison) = &view.comparison {
        let full = if selection.can_add_crop() { "" } else { ", full" };
        println!(
            "Comparison ({} / {} crops{})",
            comparison.matrix.crops.len(),
            MAX_COMPARED_CROPS,
            full
        );
        let mut header = vec!["Year".to_string()];
        header.extend(
            comparison
                .matrix
                .crops
                .iter()
                .map(|c| dashboard::crop_label(store, c)),
        );
        let rows = comparison
            .matrix
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.year.to_string()];
                cells.extend(row.values.iter().map(|v| util::format_number(*v, 1)));
                cells
            })
            .collect();
        output::preview_grid(header, rows);
    }

    let table_state = selection.table();
    let header = NATIONAL_COLUMNS
        .iter()
        .map(|c| {
            if table_state.sort_column.as_deref() == Some(c.key) {
                format!("{} {}", c.label, table_state.sort_direction.arrow())
            } else {
                c.label.to_string()
            }
        })
        .collect();
    let rows = view
        .table
        .page_rows
        .iter()
        .map(|r| render_row(r, &NATIONAL_COLUMNS))
        .collect();
    if table_state.search_term.is_empty() {
        println!("National data");
    } else {
        println!("National data matching \"{}\"", table_state.search_term);
    }
    output::preview_grid(header, rows);
    println!("{}\n", view.table.footer());

    if !view.map.is_empty() {
        println!("Regions");
        let rows = view
            .map
            .iter()
            .map(|f| {
                vec![
                    f.region_name.clone(),
                    format!("{} kt", util::format_number(f.value, 1)),
                    f.style.fill_color.to_string(),
                ]
            })
            .collect();
        output::preview_grid(vec!["Region".into(), "Production".into(), "Fill".into()], rows);
        let legend = map_legend()
            .into_iter()
            .map(|e| format!("{} {}", e.fill_color, e.label))
            .collect::<Vec<_>>();
        println!("Legend: {}\n", legend.join(" | "));
    }
}

fn handle_export(dir: &Path, format: ExportFormat, selection: &SelectionState, view: &DashboardView) {
    match output::export_series(dir, format, selection.active_crop(), &view.series) {
        Ok(path) => println!("(Series exported to {})\n", path.display()),
        Err(e) => eprintln!("Export error: {}\n", e),
    }
}

/// Read and apply commands until `quit` or end of input.
fn run_session(
    store: &RecordStore,
    selection: &mut SelectionState,
    display: &DisplayOptions,
    out_dir: &Path,
) {
    let known: Vec<String> = store.crops.iter().map(|c| c.code.clone()).collect();
    let mut view = dashboard::render(store, selection, display);
    println!("{}\n", HELP);

    while let Some(line) = read_command() {
        let command = match session::parse_command(&line) {
            Ok(c) => c,
            Err(msg) => {
                println!("{}\n", msg);
                continue;
            }
        };
        match &command {
            Command::Quit => break,
            Command::Help => {
                println!("{}\n", HELP);
                continue;
            }
            Command::Export(format) => {
                handle_export(out_dir, *format, selection, &view);
                continue;
            }
            _ => {}
        }
        if let Some(msg) = session::apply(selection, &command, &known, view.table.total_pages) {
            println!("{}\n", msg);
            continue;
        }
        view = dashboard::render(store, selection, display);
        print_dashboard(store, selection, &view);
    }
    println!("Exiting the program.");
}

fn main() -> Result<()> {
    env_logger::init();
    let config = Config::from(Cli::parse());

    println!("Processing datasets...");
    let store = loader::load_all(&config.sources).context("failed to load the datasets")?;
    print_load_report(&store);

    let mut selection = seed_selection(&store, &config.seed)?;
    let view = dashboard::render(&store, &selection, &config.display);
    print_dashboard(&store, &selection, &view);

    if let Some(format) = config.export {
        handle_export(&config.out_dir, format, &selection, &view);
    }
    if config.interactive {
        run_session(&store, &mut selection, &config.display, &config.out_dir);
    }
    Ok(())
}
