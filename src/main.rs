use std::io::{self, BufRead, Write};
use std::path::Path;

use commerce_dashboard::dashboard::{
    dataset::Dataset,
    filter::{filter_cached, FilterCache},
    metrics::DashboardMetrics,
    render::render_dashboard,
    DashboardError, FilterParams, SliderBounds,
};
use jemallocator::Jemalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const DEFAULT_DATA_PATH: &str = "data/all_data.csv";

const HELP: &str = "\
commands:
  category <name,name,...> | category all     filter by product category
  payment <name,name,...>  | payment all      filter by payment type
  score <n>                                   minimum review score
  price <min> <max>                           inclusive price range
  reset                                       clear all filters
  help                                        show this help
  quit                                        exit";

/// One parsed sidebar interaction.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Categories(Vec<String>),
    Payments(Vec<String>),
    MinScore(i64),
    PriceRange(f64, f64),
    Reset,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    match word {
        "category" | "categories" => Ok(Command::Categories(parse_selection(rest))),
        "payment" | "payments" => Ok(Command::Payments(parse_selection(rest))),
        "score" => rest
            .parse::<i64>()
            .map(Command::MinScore)
            .map_err(|_| format!("not a score: '{}'", rest)),
        "price" => parse_price_range(rest),
        "reset" => Ok(Command::Reset),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "" => Err("empty command; try 'help'".to_string()),
        other => Err(format!("unknown command: '{}'; try 'help'", other)),
    }
}

/// `a,b,c` into a sorted selection; `all` (or nothing) clears the selection.
fn parse_selection(rest: &str) -> Vec<String> {
    if rest.is_empty() || rest == "all" {
        return Vec::new();
    }
    let mut values: Vec<String> = rest
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    values.sort();
    values.dedup();
    values
}

fn parse_price_range(rest: &str) -> Result<Command, String> {
    let parts: Vec<&str> = if rest.contains("..") {
        rest.splitn(2, "..").map(str::trim).collect()
    } else {
        rest.split_whitespace().collect()
    };
    if parts.len() != 2 {
        return Err(format!("expected 'price <min> <max>', got '{}'", rest));
    }
    let lo = parts[0]
        .parse::<f64>()
        .map_err(|_| format!("not a price: '{}'", parts[0]))?;
    let hi = parts[1]
        .parse::<f64>()
        .map_err(|_| format!("not a price: '{}'", parts[1]))?;
    if lo > hi {
        return Err(format!("empty price range: {} > {}", lo, hi));
    }
    Ok(Command::PriceRange(lo, hi))
}

/// Applies one command to the sidebar state. Numeric inputs are clamped to
/// the dataset-derived bounds; selection values must exist in the dataset.
fn apply_command(
    command: Command,
    params: &mut FilterParams,
    bounds: &SliderBounds,
    known_categories: &[String],
    known_payments: &[String],
) -> Result<(), String> {
    match command {
        Command::Categories(selection) => {
            if let Some(unknown) = selection.iter().find(|v| !known_categories.contains(v)) {
                return Err(format!("unknown category: '{}'", unknown));
            }
            params.categories = selection;
        }
        Command::Payments(selection) => {
            if let Some(unknown) = selection.iter().find(|v| !known_payments.contains(v)) {
                return Err(format!("unknown payment type: '{}'", unknown));
            }
            params.payment_types = selection;
        }
        Command::MinScore(score) => {
            params.min_review_score = score.clamp(bounds.review_score.0, bounds.review_score.1);
        }
        Command::PriceRange(lo, hi) => {
            params.price_range = (
                lo.clamp(bounds.price.0, bounds.price.1),
                hi.clamp(bounds.price.0, bounds.price.1),
            );
        }
        Command::Reset => *params = FilterParams::unfiltered(bounds),
        Command::Help | Command::Quit => {}
    }
    Ok(())
}

fn main() -> Result<(), DashboardError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());

    let dataset = Dataset::load(Path::new(&path))?;
    let bounds = dataset.bounds();
    let known_categories = dataset.distinct_categories();
    let known_payments = dataset.distinct_payment_types();
    let cache = FilterCache::new();

    let stdout = io::stdout();
    let stdin = io::stdin();
    let mut out = stdout.lock();

    writeln!(
        out,
        "loaded {} rows from {} ({} skipped)",
        dataset.row_count(),
        path,
        dataset.summary().errors.len()
    )?;
    writeln!(out, "categories: {}", known_categories.join(", "))?;
    writeln!(out, "payment types: {}", known_payments.join(", "))?;
    writeln!(out, "{}", HELP)?;
    writeln!(out)?;

    let mut params = FilterParams::unfiltered(&bounds);

    // Re-run the whole pipeline from the cached load on every interaction
    loop {
        let view = filter_cached(&dataset, &params, &cache);
        let metrics = DashboardMetrics::compute(&view);
        render_dashboard(&mut out, &bounds, &params, &metrics)?;

        write!(out, "\nfilter> ")?;
        out.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => writeln!(out, "{}", HELP)?,
            Ok(command) => {
                if let Err(msg) = apply_command(
                    command,
                    &mut params,
                    &bounds,
                    &known_categories,
                    &known_payments,
                ) {
                    writeln!(out, "{}", msg)?;
                }
            }
            Err(msg) => writeln!(out, "{}", msg)?,
        }
    }

    Ok(())
}
