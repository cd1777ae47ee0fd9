use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hangr::{
    accounts::UserDb,
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    words::{import_file, WordDb, WordList, WordSource},
    TICK_RATE_MS,
};

/// terminal hangman with accounts, timed and multiplayer modes
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// default time limit for timed mode, in seconds
    #[clap(short = 't', long)]
    time_limit: Option<u64>,

    /// directory for the word and user databases and the log file
    #[clap(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// import `word;category` lines from a file into the dictionary and exit
    #[clap(short = 'i', long, value_name = "FILE")]
    import: Option<PathBuf>,

    /// merge the bundled word lists into the dictionary and exit
    #[clap(long)]
    seed: bool,
}

fn init_logging(dirs: &AppDirs) -> io::Result<()> {
    fs::create_dir_all(dirs.data_dir())?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dirs.log_file())?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Handles the non-interactive flags.
fn run_maintenance(cli: &Cli, dirs: &AppDirs) -> Result<(), Box<dyn Error>> {
    let mut words = WordDb::open(dirs.words_db())?;
    if cli.seed {
        let added = words.import_bundled()?;
        println!("Added {added} bundled words.");
    }
    if let Some(path) = &cli.import {
        let added = import_file(&words, path)?;
        println!("Added {added} new words with categories.");
    }
    Ok(())
}

fn open_words(dirs: &AppDirs) -> Box<dyn WordSource> {
    let opened = WordDb::open(dirs.words_db()).and_then(|mut db| {
        db.seed_defaults()?;
        Ok(db)
    });
    match opened {
        Ok(db) => Box::new(db),
        Err(e) => {
            warn!(error = %e, "word database unavailable, using bundled words");
            Box::new(WordList::bundled())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let dirs = cli
        .data_dir
        .as_ref()
        .map(AppDirs::with_data_dir)
        .unwrap_or_else(AppDirs::resolve);
    init_logging(&dirs)?;

    if cli.seed || cli.import.is_some() {
        return run_maintenance(&cli, &dirs);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = match &cli.data_dir {
        Some(dir) => FileConfigStore::with_path(dir.join("config.json")),
        None => FileConfigStore::new(),
    };
    let config = config_store.load().with_time_limit(cli.time_limit);
    let users = UserDb::open(dirs.users_db())?;
    let mut app = App::new(open_words(&dirs), Box::new(users), config);
    info!(data_dir = %dirs.data_dir().display(), "starting hangr");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = config_store.save(&app.config) {
        warn!(error = %e, path = %config_store.path().display(), "failed to save config");
    }
    info!("exiting hangr");

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            GameEvent::Tick => {
                // only a running game changes between ticks
                if app.session.is_playing() {
                    app.on_tick();
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            GameEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            GameEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}
