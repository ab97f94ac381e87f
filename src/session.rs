//! Line commands for the interactive dashboard session.
use crate::output::ExportFormat;
use crate::selection::{SelectionState, ToggleOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Crop(String),
    Toggle(String),
    Compare,
    From(i32),
    To(i32),
    Search(String),
    Sort(String),
    Page(usize),
    Next,
    Prev,
    Export(ExportFormat),
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  crop <code>        show a single crop
  toggle <code>      add/remove a crop in comparison mode
  compare            switch comparison mode on/off
  from <year>        first year of the range
  to <year>          last year of the range
  search <text>      filter the table (empty clears)
  sort <column>      sort the table; repeat to flip direction
  page <n> | next | prev
  export csv|json|report
  show | help | quit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((v, r)) => (v, r.trim()),
        None => (line, ""),
    };
    let needs_arg = |what: &str| {
        if rest.is_empty() {
            Err(format!("`{}` needs {}", verb, what))
        } else {
            Ok(rest.to_string())
        }
    };
    let year = |s: String| {
        s.parse::<i32>()
            .map_err(|_| format!("`{}` is not a year", s))
    };

    match verb.to_ascii_lowercase().as_str() {
        "crop" => needs_arg("a crop code").map(Command::Crop),
        "toggle" => needs_arg("a crop code").map(Command::Toggle),
        "compare" => Ok(Command::Compare),
        "from" => needs_arg("a year").and_then(year).map(Command::From),
        "to" => needs_arg("a year").and_then(year).map(Command::To),
        "search" => Ok(Command::Search(rest.to_string())),
        "sort" => needs_arg("a column key").map(Command::Sort),
        "page" => needs_arg("a page number").and_then(|s| {
            s.parse::<usize>()
                .map(Command::Page)
                .map_err(|_| format!("`{}` is not a page number", s))
        }),
        "next" => Ok(Command::Next),
        "prev" => Ok(Command::Prev),
        "export" => needs_arg("a format").and_then(|s| {
            ExportFormat::parse(&s)
                .map(Command::Export)
                .ok_or_else(|| format!("unknown export format `{}`", s))
        }),
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command `{}` (try `help`)", other)),
    }
}

/// Year selector options as `first - last`.
fn offered(options: &[i32]) -> String {
    match (options.first(), options.last()) {
        (Some(first), Some(last)) => format!("{} - {}", first, last),
        _ => "(none)".to_string(),
    }
}

/// Apply a selection command. Returns a message for the user when the
/// command was refused; non-selection commands are left to the caller.
pub fn apply(
    selection: &mut SelectionState,
    command: &Command,
    known_crops: &[String],
    total_pages: usize,
) -> Option<String> {
    let unknown = |code: &str| {
        (!known_crops.is_empty() && !known_crops.iter().any(|c| c == code))
            .then(|| format!("unknown crop `{}`", code))
    };
    match command {
        Command::Crop(code) => {
            if let Some(msg) = unknown(code) {
                return Some(msg);
            }
            selection.select_crop(code.clone());
            None
        }
        Command::Toggle(code) => {
            if let Some(msg) = unknown(code) {
                return Some(msg);
            }
            if !selection.comparison_mode() {
                return Some("turn comparison mode on first (`compare`)".to_string());
            }
            match selection.toggle_crop(code) {
                ToggleOutcome::Rejected => Some(format!("cannot toggle `{}` now", code)),
                _ => None,
            }
        }
        Command::Compare => {
            selection.toggle_comparison_mode();
            None
        }
        Command::From(y) => {
            if selection.set_year_min(*y) {
                None
            } else {
                Some(format!(
                    "start year must be one of {}",
                    offered(&selection.year_min_options())
                ))
            }
        }
        Command::To(y) => {
            if selection.set_year_max(*y) {
                None
            } else {
                Some(format!(
                    "end year must be one of {}",
                    offered(&selection.year_max_options())
                ))
            }
        }
        Command::Search(term) => {
            selection.set_search(term.clone());
            None
        }
        Command::Sort(column) => {
            selection.sort_by(column);
            None
        }
        Command::Page(n) => {
            selection.set_page(*n);
            None
        }
        Command::Next => {
            (!selection.next_page(total_pages)).then(|| "already on the last page".to_string())
        }
        Command::Prev => {
            (!selection.previous_page()).then(|| "already on the first page".to_string())
        }
        Command::Export(_) | Command::Show | Command::Help | Command::Quit => None,
    }
}
