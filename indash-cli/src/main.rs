use std::{fs, path::PathBuf};

use clap::{ArgEnum, Parser};
use eyre::{Result, WrapErr};
use indash::{Dashboard, Mode, Page, Selection, ValueField, YearRange};

#[derive(ArgEnum, Clone, Copy, Debug)]
enum ModeArg {
    Overview,
    Indicators,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Overview => Mode::Overview,
            ModeArg::Indicators => Mode::Indicators,
        }
    }
}

#[derive(ArgEnum, Clone, Copy, Debug)]
enum Format {
    Html,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "indash", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[clap(short, long)]
    verbose: bool,

    /// Configuration file (TOML, YAML or JSON).
    #[clap(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Which set of charts to render.
    #[clap(long, arg_enum, default_value = "overview")]
    mode: ModeArg,

    /// Country to include (repeatable). Defaults to all countries.
    #[clap(long = "country", value_name = "COUNTRY")]
    countries: Vec<String>,

    /// First year to include. Defaults to the earliest year in the dataset.
    #[clap(long, value_name = "YEAR")]
    from: Option<i32>,

    /// Last year to include. Defaults to the latest year in the dataset.
    #[clap(long, value_name = "YEAR")]
    to: Option<i32>,

    /// Sector whose activities are offered. Defaults to the configured sector.
    #[clap(long)]
    sector: Option<String>,

    /// Activity to include (repeatable). Defaults to the sector's first
    /// activity.
    #[clap(long = "activity", value_name = "ACTIVITY")]
    activities: Vec<String>,

    /// Indicator dimension to select (repeatable, at most four).
    #[clap(long = "dimension", value_name = "DIMENSION")]
    dimensions: Vec<String>,

    /// Indicator to chart (repeatable, at most four).
    #[clap(long = "indicator", value_name = "INDICATOR")]
    indicators: Vec<String>,

    /// Country to emphasize in indicator charts.
    #[clap(long)]
    highlight: Option<String>,

    /// Column to plot ("value" or "valueUSD"). Defaults to the configured
    /// column.
    #[clap(long, value_name = "FIELD")]
    value_field: Option<String>,

    /// Output format.
    #[clap(long, arg_enum, default_value = "html")]
    format: Format,

    /// Where to write the output. Defaults to standard output.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Print the available filter options and exit.
    #[clap(long)]
    list: bool,
}

fn main() {
    let args = Args::parse();
    simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    })
    .unwrap();

    if let Err(e) = run(&args) {
        log::error!("Failed: {:?}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let dashboard = Dashboard::load(&args.config)?;

    if args.list {
        let listing = serde_json::to_string_pretty(&dashboard.filter_options())?;
        return write_output(args, &listing);
    }

    let mode = Mode::from(args.mode);
    let selection = build_selection(&dashboard, args, mode)?;
    log::debug!("Selection: {:?}", selection);

    let mut options = dashboard.render_options();
    if let Some(highlight) = &args.highlight {
        options = options.with_highlight(highlight);
    }
    if let Some(field) = &args.value_field {
        options = options.with_value_field(field.parse::<ValueField>()?);
    }
    let rendered = dashboard.render_with(&selection, mode, &options);
    for notice in rendered.notices() {
        log::warn!("{}", notice.message);
    }

    let output = match args.format {
        Format::Html => Page::new()?.render(&dashboard, &rendered)?,
        Format::Json => serde_json::to_string_pretty(&rendered)?,
    };
    write_output(args, &output)?;
    log::info!(
        "Rendered {} chart(s) from {} record(s)",
        rendered.charts().count(),
        rendered.data.len()
    );
    Ok(())
}

// Starts from the dashboard's default selection and overrides whatever was
// given on the command line.
fn build_selection(dashboard: &Dashboard, args: &Args, mode: Mode) -> Result<Selection> {
    let dataset = dashboard.dataset();
    let mut selection = dashboard.default_selection(mode);

    if let Some(sector) = &args.sector {
        if !dashboard.config().options().sectors.contains(sector) {
            log::warn!("Sector \"{}\" is not one of the configured sectors", sector);
        }
        let first_activity = dataset.activities_for_sector(sector).into_iter().take(1);
        selection = selection
            .with_sector(sector.as_str())
            .with_activities(first_activity);
    }
    if !args.countries.is_empty() {
        selection = selection.with_countries(args.countries.iter().cloned());
    }
    if args.from.is_some() || args.to.is_some() {
        let bounds = dataset.year_bounds();
        let years = YearRange::new(
            args.from.unwrap_or_else(|| bounds.min()),
            args.to.unwrap_or_else(|| bounds.max()),
        )?;
        selection = selection.with_years(years).clamped_to(dataset);
    }
    if !args.activities.is_empty() {
        selection = selection.with_activities(args.activities.iter().cloned());
    }
    if !args.dimensions.is_empty() {
        selection = selection.with_dimensions(args.dimensions.iter().cloned());
    }
    if !args.indicators.is_empty() {
        selection = selection.with_variables(args.indicators.iter().cloned());
    } else if args.sector.is_some() || !args.dimensions.is_empty() {
        selection = selection.with_default_variables(dataset, dashboard.config(), mode);
    }
    Ok(selection)
}

fn write_output(args: &Args, content: &str) -> Result<()> {
    match &args.output {
        Some(path) => fs::write(path, content)
            .wrap_err_with(|| format!("failed to write output to {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
