use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use flexi_logger::{Logger, LoggerHandle};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::loader::{self, HttpTransport};
use crate::output::{self, OutputFormat};
use crate::paginator;
use crate::view::{Frame, View, ViewEvent};

#[derive(Clone, Debug)]
pub(crate) struct RunConfig {
    pub(crate) url: String,
    pub(crate) page_size: usize,
    pub(crate) page: usize,
    pub(crate) timeout: u64,
    pub(crate) proxy: Option<String>,
    pub(crate) output: Option<String>,
    pub(crate) format: OutputFormat,
    pub(crate) interactive: bool,
    pub(crate) no_color: bool,
}

/// What the reader typed at the page prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Go(ViewEvent),
    Quit,
    Unknown,
}

fn log_spec(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_logging(verbose: u8) -> Result<LoggerHandle, String> {
    Logger::try_with_env_or_str(log_spec(verbose))
        .map_err(|e| format!("invalid log specification: {e}"))?
        .log_to_stderr()
        .start()
        .map_err(|e| format!("failed to start logger: {e}"))
}

pub(crate) fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let url = args
        .url
        .or(cfg.url)
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| loader::DEFAULT_URL.to_string());
    reqwest::Url::parse(&url).map_err(|e| format!("invalid url '{url}': {e}"))?;

    let page_size = args
        .page_size
        .or(cfg.page_size)
        .unwrap_or(paginator::DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }
    let page = args.page.or(cfg.page).unwrap_or(1);
    if page == 0 {
        return Err("invalid page, pages are numbered from 1".to_string());
    }
    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(config::DEFAULT_TIMEOUT_SECONDS);
    if timeout == 0 {
        return Err("invalid timeout, expected positive number of seconds".to_string());
    }

    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));

    let format = match args.format.or(cfg.format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid format '{raw}', expected text, json, or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let interactive = !args.no_interactive
        && cfg.interactive.unwrap_or(true)
        && output.is_none()
        && format == OutputFormat::Text;
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    Ok(RunConfig {
        url,
        page_size,
        page,
        timeout,
        proxy,
        output,
        format,
        interactive,
        no_color,
    })
}

/// Maps prompt input to a page change. Only pages the selector offers are
/// accepted, so every event the view sees is in range.
pub(crate) fn parse_command(input: &str, current_page: usize, page_numbers: &[usize]) -> Command {
    let input = input.trim().to_lowercase();
    let target = match input.as_str() {
        "q" | "quit" | "exit" => return Command::Quit,
        "n" | "next" => current_page.checked_add(1),
        "p" | "prev" | "previous" => current_page.checked_sub(1),
        other => other.parse::<usize>().ok(),
    };
    match target {
        Some(n) if page_numbers.contains(&n) => Command::Go(ViewEvent::SetPage(n)),
        _ => Command::Unknown,
    }
}

fn loading_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(output::LOADING_MESSAGE);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn print_frame(frame: &Frame) {
    print!("{}", output::render_text(frame));
    let _ = std::io::stdout().flush();
}

async fn write_output(path: &str, rendered: &[u8]) -> Result<(), String> {
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))?;
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let transport = HttpTransport::build(run.proxy.as_deref(), run.timeout)
        .map_err(|e| e.to_string())?;
    let view = View::start(Arc::new(transport), run.url.clone(), run.page_size);

    let pb = loading_spinner();
    view.resolved().await;
    pb.finish_and_clear();

    if run.page != 1 {
        if let Frame::Table { total_pages, .. } = view.frame().await {
            if run.page > total_pages {
                return Err(format!(
                    "page {} out of range, {} page(s) available",
                    run.page, total_pages
                ));
            }
            view.apply(ViewEvent::SetPage(run.page)).await;
        }
    }

    let frame = view.frame().await;
    if let Some(path) = run.output.as_deref() {
        write_output(path, &output::render(&frame, run.format)).await?;
        info!("wrote page to {path}");
        println!(":: Saved :: {}", path);
        return Ok(());
    }
    if run.format != OutputFormat::Text {
        print!("{}", String::from_utf8_lossy(&output::render(&frame, run.format)));
        return Ok(());
    }

    print_frame(&frame);
    if !run.interactive {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let (current_page, page_numbers) = match view.frame().await {
            Frame::Table {
                current_page,
                page_numbers,
                ..
            } if !page_numbers.is_empty() => (current_page, page_numbers),
            _ => return Ok(()),
        };

        print!("{} ", "page (number, n, p, q) >".dimmed());
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(()),
            Err(e) => return Err(format!("failed to read input: {e}")),
        };

        match parse_command(&line, current_page, &page_numbers) {
            Command::Quit => return Ok(()),
            Command::Unknown => {
                debug!("ignoring prompt input '{}'", line.trim());
                println!(
                    "{}",
                    format!("expected a page between 1 and {}", page_numbers.len()).yellow()
                );
            }
            Command::Go(event) => {
                view.apply(event).await;
                println!();
                print_frame(&view.frame().await);
            }
        }
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let _logger = init_logging(args.verbose)?;

    let config_path = match args.config.as_deref() {
        Some(p) => Some((config::expand_tilde(p), false)),
        None => config::default_config_path().map(|p| (p, true)),
    };

    if args.init_config {
        let (path, _) = config_path.ok_or("unable to determine config path")?;
        if config::ensure_default_config_file(&path)? {
            println!(":: Created :: {}", path.display());
        } else {
            println!(":: Exists :: {}", path.display());
        }
        return Ok(());
    }

    let cfg = match config_path.as_ref() {
        Some((path, allow_missing)) => config::load_config(path, *allow_missing)?,
        None => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;
    debug!("run config: {run:?}");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
