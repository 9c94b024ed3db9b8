use clap::{Parser, ValueEnum};
use soaper_dl::{
    Config, DEFAULT_BASE_URI, DEFAULT_SUBTITLE_LANGUAGE, DownloadPlan, ExternalDownloader,
    HttpTransport, ProgressEvent, SelectorType, SoaperError, TaskKind, build_plan,
    default_download_root, execute_plan, prepare_destinations, selector,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Interactive selection backend
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SelectorArg {
    /// Built-in terminal prompts
    Builtin,
    /// External fzf fuzzy finder
    Fzf,
}

impl From<SelectorArg> for SelectorType {
    fn from(arg: SelectorArg) -> Self {
        match arg {
            SelectorArg::Builtin => SelectorType::Builtin,
            SelectorArg::Fzf => SelectorType::Fzf,
        }
    }
}

/// Search a streaming catalog and download movies or episodes with subtitles
#[derive(Debug, Parser)]
#[command(name = "soaper-dl", version, about)]
struct Cli {
    /// Search term; leave empty to browse new releases
    term: Vec<String>,

    /// Directory downloads are written to (defaults to your home directory)
    #[arg(short = 'o', long, env = "SOAPER_DL_PATH")]
    download_dir: Option<PathBuf>,

    /// Subtitle language code, matched against subtitle names
    #[arg(
        short = 'l',
        long,
        env = "SOAPER_DL_SUB_LANG",
        default_value = DEFAULT_SUBTITLE_LANGUAGE,
        value_parser = parse_language
    )]
    sub_lang: String,

    /// Catalog host
    #[arg(long, env = "SOAPER_DL_BASE_URI", default_value = DEFAULT_BASE_URI)]
    base_uri: String,

    /// Selection backend
    #[arg(long, value_enum, default_value_t = SelectorArg::Builtin)]
    selector: SelectorArg,

    /// Print the download plan instead of executing it; nothing is written to disk
    #[arg(long)]
    dry_run: bool,
}

/// Rejects blank language codes, which would match every subtitle
fn parse_language(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("language code must not be empty".to_string());
    }
    Ok(value.to_string())
}

/// Exit code for a command line that could not be parsed
///
/// Help and version output are successful runs; everything else is an error.
fn parse_error_exit_code(error: &clap::Error) -> i32 {
    if error.use_stderr() { 1 } else { 0 }
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Searching { term } => {
            println!("[soaper-dl] Searching for '{}'...", term);
        }
        ProgressEvent::FetchingNewReleases => {
            println!("[soaper-dl] No search term given, fetching new releases...");
        }
        ProgressEvent::ListingsFound { count } => {
            if count > 0 {
                println!("[soaper-dl] Found {} title(s)", count);
            }
        }
        ProgressEvent::FetchingEpisodes { series } => {
            println!("[soaper-dl] Fetching episodes of {}...", series);
        }
        ProgressEvent::EpisodesFound { count } => {
            println!("[soaper-dl] Found {} episode(s)", count);
        }
        ProgressEvent::Resolving {
            index,
            total,
            label,
        } => {
            println!("[{}/{}] Resolving {}", index + 1, total, label);
        }
        ProgressEvent::ResolutionFailed { label, error } => {
            eprintln!("[soaper-dl-error] Skipping {}: {}", label, error);
        }
        ProgressEvent::PlanReady {
            task_count,
            skipped,
        } => {
            if skipped > 0 {
                println!("[soaper-dl] Planned {} download(s), skipped {} item(s)", task_count, skipped);
            } else {
                println!("[soaper-dl] Planned {} download(s)", task_count);
            }
        }
        ProgressEvent::DownloadStarted {
            index,
            total,
            kind,
            destination,
        } => {
            let what = match kind {
                TaskKind::Subtitle => "subtitles",
                TaskKind::Media => "media",
            };
            println!(
                "[{}/{}] Downloading {} {}",
                index + 1,
                total,
                what,
                destination.display()
            );
        }
        ProgressEvent::DownloadFailed { destination, error } => {
            eprintln!(
                "[soaper-dl-error] Download of {} failed: {}",
                destination.display(),
                error
            );
        }
    }
}

/// Prints a plan without executing it
fn print_plan(plan: &DownloadPlan) {
    println!("\n=== Download Plan ===\n");
    for (index, task) in plan.tasks.iter().enumerate() {
        println!("{:>3}. [{}] {}", index + 1, task.kind, task.source_url);
        println!("     -> {}", task.destination_path().display());
    }
    for skipped in &plan.skipped {
        println!("  skipped {}: {}", skipped.label, skipped.reason);
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(parse_error_exit_code(&e));
        }
    };
    let term = cli.term.join(" ");

    let Some(download_root) = cli.download_dir.or_else(default_download_root) else {
        eprintln!("Error: Could not determine your home directory, please pass --download-dir");
        process::exit(1);
    };

    let config = Config::new(download_root)
        .with_base_uri(&cli.base_uri)
        .with_subtitle_language(&cli.sub_lang);
    let ui = selector(cli.selector.into());

    let plan = match build_plan(&term, &config, HttpTransport::new(), &ui, handle_progress_event) {
        Ok(plan) => plan,
        Err(SoaperError::UserCanceled) => process::exit(0),
        Err(e) if e.is_benign() => {
            println!("[soaper-dl] {}", e);
            process::exit(e.exit_code());
        }
        Err(e) => {
            eprintln!("\n[soaper-dl-error] {}", e);
            process::exit(e.exit_code());
        }
    };

    if plan.tasks.is_empty() {
        println!("[soaper-dl] Nothing to download.");
        process::exit(if plan.skipped.is_empty() { 0 } else { 1 });
    }

    if cli.dry_run {
        print_plan(&plan);
        return;
    }

    if let Err(e) = prepare_destinations(&plan.tasks) {
        let e = SoaperError::from(e);
        eprintln!("\n[soaper-dl-error] {}", e);
        process::exit(e.exit_code());
    }

    let report = execute_plan(&plan.tasks, &ExternalDownloader::new(), handle_progress_event);

    println!(
        "\n[soaper-dl] Completed {} of {} download(s)",
        report.completed,
        plan.tasks.len()
    );

    if !report.failed.is_empty() {
        for failed in &report.failed {
            eprintln!(
                "  failed: {} ({})",
                failed.task.destination_path().display(),
                failed.error
            );
        }
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_argument_exits_with_one() {
        let error = Cli::try_parse_from(["soaper-dl", "--bogus"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&error), 1);
    }

    #[test]
    fn test_help_exits_with_zero() {
        let error = Cli::try_parse_from(["soaper-dl", "--help"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&error), 0);
    }

    #[test]
    fn test_blank_subtitle_language_is_rejected() {
        let error = Cli::try_parse_from(["soaper-dl", "--sub-lang", " ", "Dune"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&error), 1);

        let cli = Cli::try_parse_from(["soaper-dl", "-l", "de", "Dune", "Part", "Two"]).unwrap();
        assert_eq!(cli.sub_lang, "de");
        assert_eq!(cli.term.join(" "), "Dune Part Two");
    }
}
