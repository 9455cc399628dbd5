// medialint-cli/src/main.rs
//
// Command-line consumer of the medialint core pipeline. Submits the
// given paths, polls the session at a fixed interval, prints each
// verdict as it completes (colored table row or JSON line), and exits
// with a status reflecting the worst verdict seen.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use console::style;
use env_logger::Env;

use medialint_core::{
    CoreConfig, CoreError, CoreResult, FfprobeProbe, Overall, Row, Session, Severity, SortColumn,
    Verdict,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "medialint: media file quality validation",
    long_about = "Probes media files with ffprobe and checks them against a \
configurable rule set (resolution, bit rates, frame rate, naming, size)."
)]
struct Cli {
    /// Files or directories to validate (directories are walked recursively)
    #[arg(required = true, value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// JSON configuration file (defaults to the built-in rule set)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit each verdict as a JSON line instead of the colored report
    #[arg(long)]
    json: bool,

    /// Poll interval for draining finished verdicts, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100)]
    interval_ms: u64,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("{} {err}", style("error:").red().bold());
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> CoreResult<i32> {
    let config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::new(),
    };

    let mut session = Session::new(config, Arc::new(FfprobeProbe::new()))?;
    session.submit(cli.inputs.clone());

    if !cli.json {
        print_header();
    }

    let interval = Duration::from_millis(cli.interval_ms.max(1));
    let mut any_error = false;
    loop {
        for (num, verdict) in session.drain() {
            report(&cli, num, &verdict, &mut any_error)?;
        }
        if session.is_idle() {
            // The worker may have published between the drain and the
            // idle check; one more drain empties the queue for good.
            for (num, verdict) in session.drain() {
                report(&cli, num, &verdict, &mut any_error)?;
            }
            break;
        }
        thread::sleep(interval);
    }

    if cli.json {
        let counts = session.counts();
        log::info!(
            "checked {} files: {} videos, {} images, {} with problems",
            counts.total,
            counts.videos,
            counts.images,
            counts.problems
        );
    } else {
        print_summary(&session);
    }

    Ok(if any_error { 1 } else { 0 })
}

fn report(cli: &Cli, num: u64, verdict: &Verdict, any_error: &mut bool) -> CoreResult<()> {
    if verdict.overall == Overall::Error {
        *any_error = true;
    }
    if cli.json {
        let line = serde_json::to_string(verdict)
            .map_err(|e| CoreError::Other(format!("failed to serialize verdict: {e}")))?;
        println!("{line}");
    } else {
        print_row(num, verdict);
    }
    Ok(())
}

fn print_header() {
    println!(
        "{}",
        style(format!(
            "{:>4}  {:<7}  {:>10}  {:>8}  {:>9}  {:>10}  {}",
            "#", "status", "size", "duration", "fps", "resolution", "file"
        ))
        .dim()
    );
}

fn print_row(num: u64, verdict: &Verdict) {
    // Pad before styling: ANSI escapes confuse format-width padding.
    let tier = match verdict.overall {
        Overall::Clean => style(format!("{:<7}", "OK")).green(),
        Overall::Warning => style(format!("{:<7}", "WARN")).yellow(),
        Overall::Error => style(format!("{:<7}", "ERROR")).red().bold(),
    };

    // Reuse the aggregate view's cell formatting for the columns.
    let row = Row {
        verdict: verdict.clone(),
        display_num: num,
    };
    println!(
        "{:>4}  {}  {:>10}  {:>8}  {:>9}  {:>10}  {}",
        num,
        tier,
        row.cell(SortColumn::FileSize),
        row.cell(SortColumn::Duration),
        row.cell(SortColumn::FrameRate),
        row.cell(SortColumn::Resolution),
        verdict.file_name
    );

    for violation in &verdict.violations {
        let marker = match violation.severity {
            Severity::Info => style("info").dim(),
            Severity::Warning => style("warning").yellow(),
            Severity::Error => style("error").red(),
        };
        println!("        {marker}: {} ({})", violation.message, violation.code);
    }
}

fn print_summary(session: &Session) {
    let counts = session.counts();
    let problems = if counts.problems > 0 {
        style(format!("{} with problems", counts.problems)).red().to_string()
    } else {
        style("no problems").green().to_string()
    };
    println!(
        "\nchecked {} files: {} videos, {} images, {problems}",
        counts.total, counts.videos, counts.images
    );
}
