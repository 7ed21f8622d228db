use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use tridash::export::{self, text, ExportFormat};
use tridash::logging::init_logging;
use tridash::report::{self, DashboardReport, ReportOptions};
use tridash::{analysis, ActivitySet, AppConfig, DashError, DateRange, ImportManager, RaceBook};

/// tridash - Triathlon Training Dashboard
///
/// Reads the activity cache fetched from the fitness service and reports
/// training totals, running volume, race results, heart rate analysis and
/// simple trend forecasts in the terminal.
#[derive(Parser)]
#[command(name = "tridash")]
#[command(version)]
#[command(about = "Triathlon training dashboard CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Activity file (CSV or JSON), overrides the configured path
    #[arg(short, long, value_name = "FILE", global = true)]
    activities: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct RangeArgs {
    /// Date range start (YYYY-MM-DD), defaults to the first session
    #[arg(long)]
    from: Option<String>,

    /// Date range end (YYYY-MM-DD), defaults to the last session
    #[arg(long)]
    to: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sessions, distance and time per discipline
    Summary {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Running distance by year, month and week
    Volume {
        #[command(flatten)]
        range: RangeArgs,

        /// Length of the trailing monthly window
        #[arg(short, long)]
        months: Option<u32>,
    },

    /// Race results, paces and upcoming races
    Races {
        /// Reference date for the countdown (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },

    /// Heart rate versus speed, correlation and efficiency
    Analysis {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Weekly running volume trend and forecast
    Forecast {
        #[command(flatten)]
        range: RangeArgs,

        /// Weeks to forecast
        #[arg(short, long)]
        weeks: Option<u32>,
    },

    /// Heart-rate zone table and run distribution
    Zones {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Every dashboard section
    Report {
        #[command(flatten)]
        range: RangeArgs,

        /// Reference date for the countdown (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },

    /// Export the dashboard report
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (json, csv, text); guessed from the extension if omitted
        #[arg(short = 'f', long)]
        format: Option<String>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Configure application settings
    Config {
        /// Print the whole configuration
        #[arg(short, long)]
        list: bool,

        /// Get a configuration value (dotted key, e.g. data.activities_file)
        #[arg(short, long)]
        get: Option<String>,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

/// Everything one render pass needs
struct Session {
    set: ActivitySet,
    range: DateRange,
    today: NaiveDate,
    options: ReportOptions,
    styled: bool,
}

impl Session {
    fn samples(&self) -> Vec<analysis::RunSample> {
        analysis::qualifying_runs(&self.set, self.range)
    }
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid --{} date '{}', expected YYYY-MM-DD", flag, value))
}

fn parse_optional_date(value: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    value.map(|v| parse_date(v, flag)).transpose()
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path),
        None => Ok(AppConfig::load_or_default()),
    }
}

fn load_session(
    cli_activities: Option<&Path>,
    config: &AppConfig,
    range: &RangeArgs,
) -> Result<Session> {
    let path = cli_activities.unwrap_or(&config.data.activities_file);
    let set = ImportManager::new()
        .load(path)
        .with_context(|| format!("Failed to load activities from {}", path.display()))?;

    let today = Local::now().date_naive();
    let from = parse_optional_date(range.from.as_deref(), "from")?;
    let to = parse_optional_date(range.to.as_deref(), "to")?;

    let range = match set.date_bounds() {
        Some(bounds) => DateRange::resolve(from, to, &bounds)?,
        None => {
            warn!("No swim, bike or run sessions in the activity file");
            let end = to.unwrap_or(today);
            DateRange::new(from.unwrap_or(end), end)?
        }
    };
    info!(range = %range, activities = set.len(), "Session ready");

    Ok(Session {
        set,
        range,
        today,
        options: ReportOptions::from(config),
        styled: std::io::stdout().is_terminal(),
    })
}

fn load_race_book(config: &AppConfig) -> Option<RaceBook> {
    match RaceBook::load_or_builtin(config.data.races_file.as_deref()) {
        Ok(book) => Some(book),
        Err(e) => {
            e.log("race book");
            None
        }
    }
}

fn print_section<F>(render: F) -> Result<()>
where
    F: FnOnce(&mut String) -> std::fmt::Result,
{
    let mut out = String::new();
    render(&mut out)?;
    print!("{}", out);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;
    let activities = cli.activities.as_deref();

    match cli.command {
        Commands::Summary { range } => {
            let session = load_session(activities, &config, &range)?;
            println!("{} {}", "Period:".bold(), session.range);
            let section = report::totals_section(&session.set, session.range);
            print_section(|out| text::render_totals(out, &section, session.styled))?;
        }

        Commands::Volume { range, months } => {
            let session = load_session(activities, &config, &range)?;
            let months = months.unwrap_or(session.options.trailing_months);
            if months == 0 {
                bail!("--months must be at least 1");
            }
            let section = report::volume_section(&session.set, session.range.end, months);
            print_section(|out| text::render_volume(out, &section, session.styled))?;
        }

        Commands::Races { today } => {
            let today = parse_optional_date(today.as_deref(), "today")?
                .unwrap_or_else(|| Local::now().date_naive());
            let book = load_race_book(&config);
            let section = report::races_section(book.as_ref(), today);
            let styled = std::io::stdout().is_terminal();
            print_section(|out| text::render_races(out, &section, styled))?;
        }

        Commands::Analysis { range } => {
            let session = load_session(activities, &config, &range)?;
            let samples = session.samples();
            println!("{} {}", "Period:".bold(), session.range);
            print_section(|out| {
                let summary = report::heart_rate_speed_section(&samples);
                text::render_heart_rate_speed(out, &summary, session.styled)?;
                let correlation = report::correlation_section(&samples);
                text::render_correlation(out, &correlation, session.styled)?;
                text::render_efficiency(
                    out,
                    &report::efficiency_section(&samples, session.options.efficiency_horizon_days),
                    session.styled,
                )
            })?;
        }

        Commands::Forecast { range, weeks } => {
            let session = load_session(activities, &config, &range)?;
            let weeks = weeks.unwrap_or(session.options.forecast_weeks);
            let section = report::forecast_section(&session.set, session.range, weeks);
            print_section(|out| text::render_forecast(out, &section, session.styled))?;
        }

        Commands::Zones { range } => {
            let session = load_session(activities, &config, &range)?;
            let section = report::zones_section(&session.samples(), &session.options.zones);
            print_section(|out| text::render_zones(out, &section, session.styled))?;
        }

        Commands::Report { range, today } => {
            let mut session = load_session(activities, &config, &range)?;
            if let Some(today) = parse_optional_date(today.as_deref(), "today")? {
                session.today = today;
            }
            let book = load_race_book(&config);
            let report = DashboardReport::build(
                &session.set,
                book.as_ref(),
                session.range,
                session.today,
                &session.options,
            );
            print!("{}", text::render_report(&report, session.styled)?);
        }

        Commands::Export { output, format, range } => {
            let format = match format {
                Some(name) => ExportFormat::from_str(&name)?,
                None => ExportFormat::from_path(&output).unwrap_or(ExportFormat::Json),
            };
            let session = load_session(activities, &config, &range)?;
            let book = load_race_book(&config);
            let report = DashboardReport::build(
                &session.set,
                book.as_ref(),
                session.range,
                session.today,
                &session.options,
            );

            println!("{}", "Exporting dashboard report...".yellow().bold());
            export::export_report(&report, format, &output)
                .with_context(|| format!("Failed to export report to {}", output.display()))?;
            println!(
                "{} {} ({} of 8 sections with data)",
                "✓ Exported to".yellow(),
                output.display(),
                report.ready_sections()
            );
        }

        Commands::Config { list, get, init } => {
            if init {
                let path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
                if path.exists() {
                    bail!("Config file already exists: {}", path.display());
                }
                AppConfig::default().save_to_file(&path)?;
                println!("{} {}", "✓ Wrote default configuration to".green(), path.display());
            } else if let Some(key) = get {
                match config.get(&key)? {
                    Some(value) => println!("{}", value.trim_end()),
                    None => bail!("Unknown configuration key: {}", key),
                }
            } else if list {
                print!("{}", config.to_toml()?);
            } else {
                println!("Use --list, --get KEY or --init");
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let (message, code) = match e.downcast_ref::<DashError>() {
            Some(dash) => {
                dash.log("tridash");
                (dash.user_message(), dash.exit_code())
            }
            None => (format!("{:#}", e), 1),
        };
        eprintln!("{} {}", "Error:".red().bold(), message);
        std::process::exit(code);
    }
}
