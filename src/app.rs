use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::accounts::{check_registration, CredentialStore};
use crate::config::Config;
use crate::error::GameError;
use crate::round::GuessOutcome;
use crate::session::{GameSession, GameSummary, Transition};
use crate::words::{import_file, WordSource};

/// Top-level menu entries, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum MenuItem {
    Singleplayer,
    Multiplayer,
    #[strum(serialize = "Import words from file")]
    ImportWords,
    #[strum(serialize = "View session history")]
    ViewHistory,
    #[strum(serialize = "Export session history")]
    ExportHistory,
    #[strum(serialize = "Log out")]
    Logout,
    Exit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 7] = [
        MenuItem::Singleplayer,
        MenuItem::Multiplayer,
        MenuItem::ImportWords,
        MenuItem::ViewHistory,
        MenuItem::ExportHistory,
        MenuItem::Logout,
        MenuItem::Exit,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SingleplayerItem {
    Timed,
    Normal,
    Back,
}

impl SingleplayerItem {
    pub const ALL: [SingleplayerItem; 3] = [
        SingleplayerItem::Timed,
        SingleplayerItem::Normal,
        SingleplayerItem::Back,
    ];
}

/// Single-line text input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

impl TextField {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Default::default()
        }
    }

    fn masked(label: &'static str) -> Self {
        Self {
            label,
            masked: true,
            ..Default::default()
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Text as it should appear on screen
    pub fn shown(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    fn edit(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => {
                self.value.push(c);
                true
            }
            KeyCode::Backspace => {
                self.value.pop();
                true
            }
            _ => false,
        }
    }
}

/// A group of fields with one focused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub fields: Vec<TextField>,
    pub focus: usize,
}

impl Form {
    fn new(fields: Vec<TextField>) -> Self {
        Self { fields, focus: 0 }
    }

    fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map_or("", |f| f.value.as_str())
    }

    fn on_last_field(&self) -> bool {
        self.focus + 1 >= self.fields.len()
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    fn edit(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus_next();
                true
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_prev();
                true
            }
            _ => self
                .fields
                .get_mut(self.focus)
                .is_some_and(|field| field.edit(key)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    TimeLimit,
    PlayerCount,
    /// Collecting the name for seat `seat` of `count`; `names` holds the
    /// seats filled so far, starting with the host.
    PlayerName {
        seat: usize,
        count: usize,
        names: Vec<String>,
    },
    ImportPath,
    ExportPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub field: TextField,
}

impl Prompt {
    pub fn title(&self) -> String {
        match &self.kind {
            PromptKind::TimeLimit => "Timed Mode".into(),
            PromptKind::PlayerCount => "Multiplayer".into(),
            PromptKind::PlayerName { seat, .. } => format!("Player {}", seat + 1),
            PromptKind::ImportPath => "Import words".into(),
            PromptKind::ExportPath => "Export history".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login(Form),
    Register(Form),
    Menu { selected: usize },
    Singleplayer { selected: usize },
    Prompt(Prompt),
    Playing,
    History { scroll: usize },
    FinalScores(GameSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn login_form(username: &str) -> Form {
    let mut form = Form::new(vec![
        TextField::new("Username").with_value(username),
        TextField::masked("Password"),
    ]);
    if !username.is_empty() {
        form.focus = 1;
    }
    form
}

fn register_form() -> Form {
    Form::new(vec![
        TextField::new("Username"),
        TextField::masked("Password"),
        TextField::masked("Confirm Password"),
    ])
}

fn cycle(selected: usize, len: usize, forward: bool) -> usize {
    if forward {
        (selected + 1) % len
    } else {
        (selected + len - 1) % len
    }
}

/// Terminal application state: screens around a [`GameSession`]
pub struct App {
    pub session: GameSession<Box<dyn WordSource>>,
    pub accounts: Box<dyn CredentialStore>,
    pub config: Config,
    pub screen: Screen,
    pub status: Option<Status>,
}

impl App {
    pub fn new(
        words: Box<dyn WordSource>,
        accounts: Box<dyn CredentialStore>,
        config: Config,
    ) -> Self {
        let username = config.last_username.clone().unwrap_or_default();
        Self {
            session: GameSession::new(words),
            accounts,
            config,
            screen: Screen::Login(login_form(&username)),
            status: None,
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Info,
            text: text.into(),
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Error,
            text: text.into(),
        });
    }

    /// Drives the timed-mode countdown
    pub fn on_tick(&mut self) {
        if self.screen != Screen::Playing {
            return;
        }
        if let Some(summary) = self.session.tick() {
            let score = summary.standings.first().map_or(0, |(_, s)| *s);
            self.info(format!("Time's up! Your score: {score}"));
            self.screen = Screen::FinalScores(summary);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        let screen = std::mem::replace(&mut self.screen, Screen::Playing);
        let (screen, flow) = match screen {
            Screen::Login(form) => self.on_login_key(form, key),
            Screen::Register(form) => (self.on_register_key(form, key), Flow::Continue),
            Screen::Menu { selected } => self.on_menu_key(selected, key),
            Screen::Singleplayer { selected } => {
                (self.on_singleplayer_key(selected, key), Flow::Continue)
            }
            Screen::Prompt(prompt) => (self.on_prompt_key(prompt, key), Flow::Continue),
            Screen::Playing => (self.on_playing_key(key), Flow::Continue),
            Screen::History { scroll } => (self.on_history_key(scroll, key), Flow::Continue),
            Screen::FinalScores(summary) => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                    self.status = None;
                    (Screen::Menu { selected: 0 }, Flow::Continue)
                }
                _ => (Screen::FinalScores(summary), Flow::Continue),
            },
        };
        self.screen = screen;
        flow
    }

    fn on_login_key(&mut self, mut form: Form, key: KeyEvent) -> (Screen, Flow) {
        match key.code {
            KeyCode::Esc => return (Screen::Login(form), Flow::Quit),
            KeyCode::F(2) => {
                self.status = None;
                return (Screen::Register(register_form()), Flow::Continue);
            }
            KeyCode::Enter if !form.on_last_field() => form.focus_next(),
            KeyCode::Enter => {
                let username = form.value(0).trim().to_string();
                let password = form.value(1).trim().to_string();
                if username.is_empty() || password.is_empty() {
                    self.error("Please enter username and password.");
                    return (Screen::Login(form), Flow::Continue);
                }
                match self
                    .session
                    .login(self.accounts.as_ref(), &username, &password)
                {
                    Ok(()) => {
                        self.info(format!("Welcome, {username}!"));
                        self.config.last_username = Some(username);
                        return (Screen::Menu { selected: 0 }, Flow::Continue);
                    }
                    Err(e) => {
                        self.error(e.to_string());
                        form.fields[1].value.clear();
                    }
                }
            }
            _ => {
                form.edit(&key);
            }
        }
        (Screen::Login(form), Flow::Continue)
    }

    fn on_register_key(&mut self, mut form: Form, key: KeyEvent) -> Screen {
        match key.code {
            KeyCode::Esc => {
                self.status = None;
                let username = self.config.last_username.clone().unwrap_or_default();
                return Screen::Login(login_form(&username));
            }
            KeyCode::Enter if !form.on_last_field() => form.focus_next(),
            KeyCode::Enter => {
                let (username, password, confirm) = (form.value(0), form.value(1), form.value(2));
                let registered = check_registration(username, password, confirm)
                    .and_then(|()| self.accounts.register(username, password));
                match registered {
                    Ok(()) => {
                        let username = username.trim().to_string();
                        self.info("Registration successful! Please log in.");
                        return Screen::Login(login_form(&username));
                    }
                    Err(e) => self.error(e.to_string()),
                }
            }
            _ => {
                form.edit(&key);
            }
        }
        Screen::Register(form)
    }

    fn on_menu_key(&mut self, selected: usize, key: KeyEvent) -> (Screen, Flow) {
        let item = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let selected = cycle(selected, MenuItem::ALL.len(), false);
                return (Screen::Menu { selected }, Flow::Continue);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let selected = cycle(selected, MenuItem::ALL.len(), true);
                return (Screen::Menu { selected }, Flow::Continue);
            }
            KeyCode::Esc => MenuItem::Exit,
            KeyCode::Enter => MenuItem::ALL[selected.min(MenuItem::ALL.len() - 1)],
            KeyCode::Char(c) => match c.to_digit(10).map(|d| d as usize) {
                Some(n) if (1..=MenuItem::ALL.len()).contains(&n) => MenuItem::ALL[n - 1],
                _ => return (Screen::Menu { selected }, Flow::Continue),
            },
            _ => return (Screen::Menu { selected }, Flow::Continue),
        };

        self.status = None;
        let screen = match item {
            MenuItem::Singleplayer => Screen::Singleplayer { selected: 0 },
            MenuItem::Multiplayer => self.prompt(PromptKind::PlayerCount, "2"),
            MenuItem::ImportWords => self.prompt(PromptKind::ImportPath, ""),
            MenuItem::ViewHistory if self.session.history().is_empty() => {
                self.info("No history to show.");
                Screen::Menu { selected }
            }
            MenuItem::ViewHistory => Screen::History { scroll: 0 },
            MenuItem::ExportHistory if self.session.history().is_empty() => {
                self.info("No history to export.");
                Screen::Menu { selected }
            }
            MenuItem::ExportHistory => self.prompt(PromptKind::ExportPath, "history.txt"),
            MenuItem::Logout => {
                self.session.logout();
                let username = self.config.last_username.clone().unwrap_or_default();
                Screen::Login(login_form(&username))
            }
            MenuItem::Exit => return (Screen::Menu { selected }, Flow::Quit),
        };
        (screen, Flow::Continue)
    }

    fn prompt(&self, kind: PromptKind, value: impl Into<String>) -> Screen {
        Screen::Prompt(Prompt {
            kind,
            field: TextField::new("").with_value(value),
        })
    }

    fn on_singleplayer_key(&mut self, selected: usize, key: KeyEvent) -> Screen {
        let item = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                return Screen::Singleplayer {
                    selected: cycle(selected, SingleplayerItem::ALL.len(), false),
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                return Screen::Singleplayer {
                    selected: cycle(selected, SingleplayerItem::ALL.len(), true),
                }
            }
            KeyCode::Esc => SingleplayerItem::Back,
            KeyCode::Enter => SingleplayerItem::ALL[selected.min(SingleplayerItem::ALL.len() - 1)],
            _ => return Screen::Singleplayer { selected },
        };

        match item {
            SingleplayerItem::Timed => {
                let limit = self.config.time_limit_secs.to_string();
                self.prompt(PromptKind::TimeLimit, limit)
            }
            SingleplayerItem::Normal => self.start_singleplayer(false, None),
            SingleplayerItem::Back => Screen::Menu { selected: 0 },
        }
    }

    fn start_singleplayer(&mut self, timed: bool, limit: Option<u64>) -> Screen {
        match self.session.start_singleplayer(timed, limit) {
            Ok(()) => {
                self.status = None;
                Screen::Playing
            }
            Err(GameError::NotAuthenticated) => {
                self.error(GameError::NotAuthenticated.to_string());
                Screen::Login(login_form(""))
            }
            Err(e) => {
                self.error(e.to_string());
                Screen::Menu { selected: 0 }
            }
        }
    }

    fn on_prompt_key(&mut self, mut prompt: Prompt, key: KeyEvent) -> Screen {
        match key.code {
            KeyCode::Esc => {
                self.status = None;
                Screen::Menu { selected: 0 }
            }
            KeyCode::Enter => self.submit_prompt(prompt),
            _ => {
                prompt.field.edit(&key);
                Screen::Prompt(prompt)
            }
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) -> Screen {
        let answer = prompt.field.value.trim().to_string();
        match prompt.kind.clone() {
            PromptKind::TimeLimit => match answer.parse::<u64>() {
                Ok(secs) => {
                    let screen = self.start_singleplayer(true, Some(secs));
                    if screen == Screen::Playing {
                        self.config.time_limit_secs = secs;
                    }
                    screen
                }
                Err(_) => {
                    self.error("Enter the time limit in whole seconds.");
                    Screen::Prompt(prompt)
                }
            },
            PromptKind::PlayerCount => match answer.parse::<usize>() {
                Ok(count) if count >= 2 => self.name_prompt(1, count, Vec::new()),
                Ok(count) => {
                    self.error(GameError::InvalidPlayerCount(count).to_string());
                    Screen::Prompt(prompt)
                }
                Err(_) => {
                    self.error("Enter the number of players (2+).");
                    Screen::Prompt(prompt)
                }
            },
            PromptKind::PlayerName {
                seat,
                count,
                mut names,
            } => {
                if names.is_empty() {
                    names.push(self.session.user().unwrap_or_default().to_string());
                }
                names.push(answer);
                if seat + 1 < count {
                    self.name_prompt(seat + 1, count, names)
                } else {
                    self.start_multiplayer(names)
                }
            }
            PromptKind::ImportPath => {
                match import_file(self.session.words(), &answer) {
                    Ok(added) => self.info(format!("Added {added} new words with categories.")),
                    Err(e) => self.error(format!("Failed to load words: {e}")),
                }
                Screen::Menu { selected: 0 }
            }
            PromptKind::ExportPath => {
                match self.session.history().export(&answer) {
                    Ok(_) => self.info(format!("History saved to {answer}")),
                    Err(e) => self.error(format!("Failed to save history: {e}")),
                }
                Screen::Menu { selected: 0 }
            }
        }
    }

    fn name_prompt(&self, seat: usize, count: usize, names: Vec<String>) -> Screen {
        let remembered = self
            .config
            .player_names
            .get(seat - 1)
            .cloned()
            .unwrap_or_default();
        self.prompt(PromptKind::PlayerName { seat, count, names }, remembered)
    }

    fn start_multiplayer(&mut self, names: Vec<String>) -> Screen {
        let guests: Vec<String> = names.iter().skip(1).cloned().collect();
        match self.session.start_multiplayer(names, true) {
            Ok(first) => {
                self.config.player_names = guests;
                self.announce_turn(first);
                Screen::Playing
            }
            Err(e) => {
                self.error(e.to_string());
                Screen::Menu { selected: 0 }
            }
        }
    }

    fn announce_turn(&mut self, player: usize) {
        let name = self
            .session
            .player_names()
            .and_then(|names| names.get(player))
            .cloned()
            .unwrap_or_default();
        self.info(format!("{name}'s turn"));
    }

    fn on_playing_key(&mut self, key: KeyEvent) -> Screen {
        let letter = match key.code {
            KeyCode::Esc => {
                self.session.abandon();
                self.status = None;
                return Screen::Menu { selected: 0 };
            }
            KeyCode::Char(c) => c.to_string(),
            _ => return Screen::Playing,
        };

        let report = match self.session.submit_guess(&letter) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "guess without a running game");
                return Screen::Menu { selected: 0 };
            }
        };

        match report.transition {
            Transition::Continue => {
                if report.outcome == GuessOutcome::AlreadyGuessed {
                    self.info(format!("You already guessed '{letter}'."));
                } else {
                    self.status = None;
                }
                Screen::Playing
            }
            Transition::NextRound { won: true, word } => {
                self.info(format!("Correct! The word was: {word}"));
                Screen::Playing
            }
            Transition::NextRound { won: false, word } => {
                self.error(format!("You lost! The word was: {word}"));
                Screen::Playing
            }
            Transition::NextTurn { won, word, player } => {
                let name = self
                    .session
                    .player_names()
                    .and_then(|names| names.get(player))
                    .cloned()
                    .unwrap_or_default();
                let verdict = if won { "Correct" } else { "Out" };
                self.info(format!("{verdict}! The word was: {word}. {name}'s turn"));
                Screen::Playing
            }
            Transition::GameOver(summary) => {
                info!(line = %summary.history_line, "showing final scores");
                self.error(format!("Game over! The word was: {}", summary.final_word));
                Screen::FinalScores(summary)
            }
        }
    }

    fn on_history_key(&mut self, scroll: usize, key: KeyEvent) -> Screen {
        let max = self.session.history().len().saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Screen::History {
                scroll: scroll.saturating_sub(1),
            },
            KeyCode::Down | KeyCode::Char('j') => Screen::History {
                scroll: (scroll + 1).min(max),
            },
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('b') => Screen::Menu { selected: 0 },
            _ => Screen::History { scroll },
        }
    }
}
