mod config;
mod render;

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use runlog::{
    format_distance, parse_pace, Bot, CsvStore, Dashboard, DashboardRow, InboundMessage,
    PaceParse, DATE_FORMAT, HEADER,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Overrides, Settings};
use crate::render::{render_chart_guard, ChartKind};

#[derive(Parser, Debug)]
#[command(author, version, about = "Personal running log: chat bot and dashboard", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// JSON settings file
    #[arg(long, global = true, env = "RUNLOG_CONFIG", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// CSV store path (created with a header row if missing)
    #[arg(long, global = true, env = "RUNLOG_STORE", value_hint = ValueHint::FilePath)]
    store: Option<PathBuf>,

    /// The only chat user allowed to talk to the bot
    #[arg(long, global = true, env = "RUNLOG_USER_ID", allow_negative_numbers = true)]
    user_id: Option<i64>,

    /// Verbose logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one chat message to the bot and print its reply
    Message(MessageArgs),
    /// Read chat messages from stdin, one per line
    Chat(ChatArgs),
    /// Print summary metrics and render the pace/heart-rate trend chart
    Dashboard(DashboardArgs),
    /// Show how a pace string is read
    Pace(PaceArgs),
}

#[derive(Args, Debug)]
struct MessageArgs {
    /// Sender id of the message
    #[arg(long = "from", allow_negative_numbers = true)]
    sender: i64,

    /// Message text, e.g. `5.0, 25:30, 05:06, 165` or `/hapus`
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    text: Vec<String>,
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// Sender id applied to every line
    #[arg(long = "from", allow_negative_numbers = true)]
    sender: i64,
}

#[derive(Args, Debug)]
struct DashboardArgs {
    /// Output PNG chart path
    #[arg(long, default_value = "trend.png", value_hint = ValueHint::FilePath)]
    png: PathBuf,

    /// Output SVG chart path
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,

    /// Disable chart generation
    #[arg(long, action = ArgAction::SetTrue)]
    no_plot: bool,

    /// Print the raw data table, newest first
    #[arg(long, action = ArgAction::SetTrue)]
    raw: bool,

    /// Write records with derived pace seconds to CSV (`-` for stdout)
    #[arg(long, value_hint = ValueHint::FilePath)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PaceArgs {
    /// Pace text such as 5'06 or 05:06
    text: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.global.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let overrides = Overrides {
        store_path: cli.global.store.clone(),
        authorized_user_id: cli.global.user_id,
    };
    let settings = Settings::load(cli.global.config.as_deref(), &overrides)?;

    match cli.command {
        Command::Message(args) => handle_message(args, &settings),
        Command::Chat(args) => handle_chat(args, &settings),
        Command::Dashboard(args) => handle_dashboard(args, &settings),
        Command::Pace(args) => handle_pace(args),
    }
}

fn open_bot(settings: &Settings) -> Result<Bot<CsvStore>> {
    let user_id = settings.require_user_id()?;
    let store = CsvStore::open(&settings.store_path)
        .with_context(|| format!("failed to open store {}", settings.store_path.display()))?;
    Ok(Bot::new(store, user_id))
}

fn handle_message(args: MessageArgs, settings: &Settings) -> Result<()> {
    let mut bot = open_bot(settings)?;
    let message = InboundMessage::new(args.sender, args.text.join(" "));
    let reply = bot.handle(&message, Local::now().date_naive());
    println!("{}", reply);
    Ok(())
}

fn handle_chat(args: ChatArgs, settings: &Settings) -> Result<()> {
    let mut bot = open_bot(settings)?;
    info!("Running log bot active, reading messages from stdin");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = bot.handle(
            &InboundMessage::new(args.sender, line),
            Local::now().date_naive(),
        );
        writeln!(out, "{}\n", reply)?;
        out.flush()?;
    }
    Ok(())
}

fn handle_dashboard(args: DashboardArgs, settings: &Settings) -> Result<()> {
    let dashboard = match load_dashboard(&settings.store_path) {
        Ok(dashboard) => dashboard,
        Err(err) => {
            eprintln!(
                "Make sure the store is readable and its columns are: {}",
                HEADER.join(", ")
            );
            return Err(err);
        }
    };

    println!("Running Performance Analytics");
    for card in dashboard.metric_cards() {
        println!("  {:<20} {}", card.label, card.value);
    }

    if let Some(path) = args.export.as_ref() {
        if path.as_os_str() == "-" {
            write_records_stdout(&dashboard)?;
        } else {
            write_records_csv(&dashboard, path)?;
            info!("Wrote records CSV: {}", path.display());
        }
    }

    if args.raw {
        print_raw_table(&dashboard);
    }

    if !args.no_plot {
        if dashboard.records().is_empty() {
            warn!("No records yet; skipping chart");
        } else {
            let size = (settings.chart_width, settings.chart_height);
            render_logged(&dashboard, &args.png, ChartKind::Png, size);
            if let Some(path) = args.svg.as_ref() {
                render_logged(&dashboard, path, ChartKind::Svg, size);
            }
        }
    }

    Ok(())
}

fn load_dashboard(store_path: &Path) -> Result<Dashboard> {
    let store = CsvStore::open(store_path)
        .with_context(|| format!("failed to open store {}", store_path.display()))?;
    Dashboard::load(&store).with_context(|| format!("failed to read {}", store_path.display()))
}

fn render_logged(dashboard: &Dashboard, path: &Path, kind: ChartKind, size: (u32, u32)) {
    match render_chart_guard(dashboard, path, kind, size) {
        Ok(()) => info!("Wrote chart: {}", path.display()),
        Err(err) => warn!("Skipping chart render ({}): {}", path.display(), err),
    }
}

fn handle_pace(args: PaceArgs) -> Result<()> {
    match parse_pace(&args.text) {
        PaceParse::Parsed(seconds) => println!(
            "{} -> {} s/km ({})",
            args.text,
            seconds,
            runlog::format_pace(seconds)
        ),
        PaceParse::Unparsed => println!("{} -> unparsed (counted as 0)", args.text),
    }
    Ok(())
}

fn print_raw_table(dashboard: &Dashboard) {
    println!();
    println!(
        "{:<12} {:>10} {:>10} {:>8} {:>6} {:>7}",
        "Date", "Distance", "Duration", "Pace", "HR", "pace_s"
    );
    for row in dashboard.raw_rows_newest_first() {
        let record = &row.record;
        println!(
            "{:<12} {:>10} {:>10} {:>8} {:>6} {:>7}",
            record.date.format(DATE_FORMAT).to_string(),
            format_distance(record.distance_km),
            record.duration,
            record.pace,
            record.heart_rate,
            row.pace.seconds_or_zero()
        );
    }
}

fn write_records_stdout(dashboard: &Dashboard) -> Result<()> {
    let stdout = io::stdout();
    let handle = stdout.lock();
    let mut writer = csv::Writer::from_writer(handle);
    write_record_rows(dashboard.records(), &mut writer)
}

fn write_records_csv(dashboard: &Dashboard, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    write_record_rows(dashboard.records(), &mut writer)
}

fn write_record_rows<W: Write>(rows: &[DashboardRow], writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record(["date", "distance_km", "duration", "pace", "heart_rate", "pace_s"])?;
    for row in rows {
        let record = &row.record;
        writer.write_record([
            record.date.format(DATE_FORMAT).to_string(),
            format_distance(record.distance_km),
            record.duration.clone(),
            record.pace.clone(),
            record.heart_rate.to_string(),
            row.pace
                .seconds()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "".into()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
