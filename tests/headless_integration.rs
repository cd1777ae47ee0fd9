use std::fs;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::tempdir;

use hangr::accounts::{CredentialStore, UserDb};
use hangr::app::{App, Flow, Screen};
use hangr::config::Config;
use hangr::runtime::{ChannelEventSource, FixedTicker, GameEvent, Runner};
use hangr::timer::ManualClock;
use hangr::words::{import_file, WordDb, WordList};
use hangr::{GameSession, Mode};

fn key(code: KeyCode) -> GameEvent {
    GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn send_text(tx: &mpsc::Sender<GameEvent>, text: &str) {
    for c in text.chars() {
        tx.send(key(KeyCode::Char(c))).unwrap();
    }
}

// Drives the full App (register, login, play, export) through the runtime
// Runner with a channel-fed event source instead of a terminal.
#[test]
fn headless_normal_game_and_export() {
    let dir = tempdir().unwrap();
    let list = dir.path().join("words.txt");
    fs::write(&list, "cat;animals\n").unwrap();

    let words = WordDb::open(dir.path().join("words.db")).unwrap();
    assert_eq!(import_file(&words, &list).unwrap(), 1);
    let users = UserDb::open(dir.path().join("users.db")).unwrap();
    let mut app = App::new(Box::new(words), Box::new(users), Config::default());

    let export = dir.path().join("out").join("history.txt");
    let (tx, rx) = mpsc::channel();

    // register, then log in with the prefilled username
    tx.send(key(KeyCode::F(2))).unwrap();
    send_text(&tx, "ann");
    tx.send(key(KeyCode::Enter)).unwrap();
    send_text(&tx, "Secret1");
    tx.send(key(KeyCode::Enter)).unwrap();
    send_text(&tx, "Secret1");
    tx.send(key(KeyCode::Enter)).unwrap();
    send_text(&tx, "Secret1");
    tx.send(key(KeyCode::Enter)).unwrap();

    // singleplayer -> normal, win once, then lose
    send_text(&tx, "1");
    tx.send(key(KeyCode::Down)).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    send_text(&tx, "cat");
    send_text(&tx, "xyzqwe");

    // back to the menu and export the history
    tx.send(key(KeyCode::Enter)).unwrap();
    send_text(&tx, "5");
    for _ in 0.."history.txt".len() {
        tx.send(key(KeyCode::Backspace)).unwrap();
    }
    send_text(&tx, &export.display().to_string());
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Esc)).unwrap();
    drop(tx);

    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    let mut quit = false;
    for _ in 0..1000u32 {
        match runner.step() {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    quit = true;
                    break;
                }
            }
        }
    }

    assert!(quit, "escape on the menu should quit");
    assert_eq!(app.session.user(), Some("ann"));
    assert_eq!(app.config.last_username.as_deref(), Some("ann"));
    assert_eq!(app.screen, Screen::Menu { selected: 0 });
    assert_eq!(
        app.session.history().lines(),
        ["Mode: Singleplayer (Normal) | Player: ann | Score: 1"]
    );
    assert_eq!(
        fs::read_to_string(&export).unwrap(),
        "Mode: Singleplayer (Normal) | Player: ann | Score: 1"
    );
}

// Timed game paced by Runner ticks, with each tick advancing a manual clock
// by one second.
#[test]
fn headless_timed_game_expires_after_limit() {
    let users = UserDb::open_in_memory().unwrap();
    users.register("ann", "Secret1").unwrap();

    let clock = ManualClock::new();
    let mut session = GameSession::with_clock(WordList::bundled(), clock.clone());
    session.login(&users, "ann", "Secret1").unwrap();
    session.start_singleplayer(true, Some(10)).unwrap();

    let (tx, rx) = mpsc::channel();
    send_text(&tx, "etaoin");
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let mut ticks = 0;
    let mut summary = None;
    for _ in 0..1000u32 {
        match runner.step() {
            GameEvent::Tick => {
                ticks += 1;
                clock.advance(Duration::from_secs(1));
                if let Some(done) = session.tick() {
                    summary = Some(done);
                    break;
                }
            }
            GameEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    session.submit_guess(&c.to_string()).unwrap();
                }
            }
            GameEvent::Resize => {}
        }
    }

    let summary = summary.expect("timer should expire");
    assert_eq!(ticks, 10);
    assert_eq!(summary.mode, Mode::Timed { limit_secs: 10 });
    assert!(!session.is_playing());
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.tick(), None);
}
