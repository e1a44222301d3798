use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;
use webmirror_core::report::save_report;
use webmirror_core::{MirrorOptions, ReportFormat, execute_mirror, generate_mirror_report};
use webmirror_scanner::{CancellationToken, CrawlSummary, ScanError, Scope};

/// Exit status used when the user interrupts a mirror
pub const EXIT_CANCELLED: i32 = 130;

/// Parse a seed argument as a URL, adding http:// when no scheme is given
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.contains("://") {
        return Url::parse(line).ok().map(|_| line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}

/// Expand a leading `~` into the user's home directory
pub fn expand_output_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Install the global tracing subscriber.
/// `RUST_LOG` wins when set; otherwise `warn`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build mirror options from the `mirror` subcommand's arguments
pub fn mirror_options_from_args(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<MirrorOptions> {
    let raw_url = sub_matches
        .get_one::<String>("url")
        .context("--url is required")?;
    let Some(url) = parse_url_line(raw_url) else {
        bail!("'{}' is not a valid URL", raw_url);
    };

    let output = sub_matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("./mirror");
    let scope: Scope = sub_matches
        .get_one::<String>("scope")
        .map(String::as_str)
        .unwrap_or("host")
        .parse()?;

    let workers = *sub_matches.get_one::<usize>("threads").unwrap_or(&1);
    if workers == 0 {
        bail!("--threads must be at least 1");
    }

    let mut options = MirrorOptions::new(url, expand_output_dir(output));
    options.max_depth = *sub_matches.get_one::<usize>("depth").unwrap_or(&1);
    options.scope = scope;
    options.extensions = sub_matches
        .get_one::<String>("extensions")
        .cloned()
        .unwrap_or_else(|| "png,jpg".to_string());
    options.workers = workers;
    options.timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    options.show_progress_bars = !quiet;

    Ok(options)
}

/// Render the summary and either print it or write it to `report_path`
pub fn emit_report(
    summary: &CrawlSummary,
    format: ReportFormat,
    report_path: Option<&Path>,
) -> anyhow::Result<()> {
    let report = generate_mirror_report(summary, format).context("Failed to render report")?;

    match report_path {
        Some(path) => {
            save_report(path, &report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }

    Ok(())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_configuration(options: &MirrorOptions) {
    print_divider();
    println!("Seed: {}", options.url.bright_white());
    println!("Output: {}", options.output_dir.display());
    println!("Max depth: {}", options.max_depth);
    println!("Scope: {}", options.scope);
    println!("Extensions: {}", options.extensions);
    println!("Workers: {}", options.workers);
    print_divider();
    println!();
}

pub async fn handle_mirror(sub_matches: &ArgMatches, quiet: bool) {
    init_tracing(sub_matches.get_flag("verbose"));

    let options = match mirror_options_from_args(sub_matches, quiet) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| f.parse::<ReportFormat>().ok())
        .unwrap_or(ReportFormat::Text);
    let report_path = sub_matches.get_one::<PathBuf>("report").cloned();
    debug!("Mirror options: {:?}", options);

    if !quiet {
        print_configuration(&options);
    }

    // Ctrl-C cancels the session, including requests already in flight
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let progress_callback = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| println!("{}", msg.bright_black()))
            as webmirror_core::mirror::MirrorProgressCallback)
    };

    match execute_mirror(options, cancel, progress_callback, None).await {
        Ok(summary) => {
            if let Err(e) = emit_report(&summary, format, report_path.as_deref()) {
                eprintln!("{} {:#}", "✗".red().bold(), e);
                std::process::exit(1);
            }
        }
        Err(ScanError::Cancelled) => {
            eprintln!("{} Mirror cancelled", "✗".yellow().bold());
            std::process::exit(EXIT_CANCELLED);
        }
        Err(e) => {
            eprintln!("{} Mirror failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
