//! vramterm - play a byte stream through a virtual text framebuffer
//!
//! Reads raw bytes (a capture from a serial console, a script's output, or a
//! pipe), feeds them one by one into a terminal instance, and shows the
//! resulting framebuffer on the host console.
//!
//! # Quick Start
//!
//! ```text
//! vramterm capture.bin            # Colored view of the final screen
//! some-tool | vramterm --plain    # Text dump with cursor marker
//! vramterm --vram capture.bin     # Packed video memory words
//! ```

use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vramterm::config::Config;
use vramterm::core::term::{PairSwapped, RowMajor};
use vramterm::core::{Session, SessionEvent, Terminal};
use vramterm::ui::{DebugRenderer, Renderer};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the final framebuffer is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Console,
    Plain,
    Vram,
}

/// Command line options
#[derive(Debug)]
struct Options {
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    rows: Option<u16>,
    cols: Option<u16>,
    mode: OutputMode,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config_path: None,
            input: None,
            rows: None,
            cols: None,
            mode: OutputMode::Console,
        }
    }
}

fn print_version() {
    eprintln!("vramterm {}", VERSION);
}

fn print_help() {
    eprintln!("vramterm {} - virtual text framebuffer terminal", VERSION);
    eprintln!();
    eprintln!("Usage: vramterm [OPTIONS] [INPUT]");
    eprintln!();
    eprintln!("Reads INPUT (or stdin) as a raw byte stream.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Config file (default: ~/.vramterm/config.toml)");
    eprintln!("  -r, --rows <N>        Override grid rows");
    eprintln!("      --cols <N>        Override grid columns");
    eprintln!("      --plain           Print a text dump instead of drawing");
    eprintln!("      --vram            Print packed video memory words");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
}

/// Parse command line arguments. `Ok(None)` means help/version was shown.
fn parse_args() -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            "-v" | "--version" => {
                print_version();
                return Ok(None);
            }
            "-c" | "--config" => {
                let path = args.next().ok_or("--config requires a path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "-r" | "--rows" => {
                options.rows = Some(parse_number(args.next(), "--rows")?);
            }
            "--cols" => {
                options.cols = Some(parse_number(args.next(), "--cols")?);
            }
            "--plain" => options.mode = OutputMode::Plain,
            "--vram" => options.mode = OutputMode::Vram,
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            other => {
                if options.input.is_some() {
                    return Err("Only one input file may be given".to_string());
                }
                options.input = Some(PathBuf::from(other));
            }
        }
    }

    Ok(Some(options))
}

fn parse_number(value: Option<String>, flag: &str) -> Result<u16, String> {
    let value = value.ok_or_else(|| format!("{} requires a number", flag))?;
    value
        .parse()
        .map_err(|_| format!("Invalid value for {}: {}", flag, value))
}

fn init_logging() {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("vramterm.log"))
        .unwrap_or_else(|| PathBuf::from("vramterm.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("VRAMTERM_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args() {
        Ok(Some(options)) => options,
        Ok(None) => return Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("vramterm starting...");

    let mut config = match &options.config_path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(rows) = options.rows {
        config.terminal.rows = rows;
    }
    if let Some(cols) = options.cols {
        config.terminal.cols = cols;
    }
    config.terminal.validate()?;

    let source: Box<dyn Read + Send> = match &options.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };

    let mut terminal = Terminal::new(&config.terminal);
    let mut session = Session::spawn(source).context("starting reader thread")?;

    match options.mode {
        OutputMode::Plain => {
            session
                .drain_blocking(&mut terminal)
                .map_err(anyhow::Error::msg)?;
            print!("{}", DebugRenderer::render(&terminal));
        }
        OutputMode::Vram => {
            session
                .drain_blocking(&mut terminal)
                .map_err(anyhow::Error::msg)?;
            let fb = terminal.framebuffer();
            let words = if PairSwapped::fits(fb.cols()) {
                fb.to_vram(&PairSwapped)?
            } else {
                warn!("{} columns cannot be pair-swapped, using row-major", fb.cols());
                fb.to_vram(&RowMajor)?
            };
            print!("{}", DebugRenderer::render_vram(&words, config.terminal.cols));
        }
        OutputMode::Console => {
            let mut renderer = Renderer::new(config.get_color_scheme());
            renderer.init()?;
            let result = run_console(&mut session, &mut terminal, &mut renderer);
            renderer.cleanup()?;
            result?;
        }
    }

    info!("vramterm exiting");
    Ok(())
}

/// Redraw while bytes arrive; after the source closes, wait for `q`/Esc
fn run_console(
    session: &mut Session,
    terminal: &mut Terminal,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    loop {
        let mut events = session.pump(terminal);
        events.extend(session.pump_timeout(terminal, Duration::from_millis(16)));

        if let Some(SessionEvent::Error(e)) = events
            .iter()
            .find(|e| matches!(e, SessionEvent::Error(_)))
        {
            anyhow::bail!("input failed: {}", e);
        }
        if !events.is_empty() {
            renderer.render(terminal)?;
        }

        if !session.is_running() && event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    return Ok(());
                }
            }
        }
    }
}
