mod app;
mod indicator;
mod ui;

use anchored_selection_config::Config;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    env, fs,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

use crate::app::App;

const WELCOME_TEXT: &str = "\
Anchored selection

Press Ctrl-Space to drop an anchor at the caret, then move the caret with
the arrow keys, Home and End. The selection always spans from the anchor to
the caret. Press Ctrl-Space or Esc to raise the anchor again, or Ctrl-C to
copy the selection, which also raises it.

Both panes show this text and keep their own anchors. Edits move anchors
along with the text; deleting the text around an anchor removes it.
";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", config_path.display());
            process::exit(1);
        }
    };

    init_logging(&config)?;
    log::info!("anchored-selection starting up");

    let (name, text) = match args.len() {
        1 => ("welcome".to_string(), WELCOME_TEXT.to_string()),
        2 => {
            let path = PathBuf::from(&args[1]);
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| args[1].clone());
            (name, text)
        }
        _ => {
            eprintln!("Usage: {} [file]", args[0]);
            process::exit(1);
        }
    };

    let mut app = App::new(&name, &text, config.indicator)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

/// Log to the configured file; the terminal belongs to the UI
fn init_logging(config: &Config) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    match &config.log_file {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .filter_level(config.log_level_filter()?)
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && !app.handle_key(key)?
        {
            return Ok(());
        }
    }
}
