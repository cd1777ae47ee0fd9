use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Form, MenuItem, Prompt, PromptKind, Screen, SingleplayerItem, StatusKind};
use crate::session::{GameSummary, Mode};
use crate::MAX_TRIES;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn selected() -> Style {
    bold().fg(Color::Yellow)
}

/// Gallows drawing for the given number of wrong guesses
pub fn gallows(wrong: u8) -> Vec<String> {
    let head = if wrong >= 1 { "  O   |" } else { "      |" };
    let body = match wrong {
        0 | 1 => "      |",
        2 => "  |   |",
        3 => " /|   |",
        _ => " /|\\  |",
    };
    let legs = match wrong {
        0..=4 => "      |",
        5 => " /    |",
        _ => " / \\  |",
    };
    ["  +---+", "  |   |", head, body, legs, "========="]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Pads every row to the widest one so a centered block keeps its shape.
fn pad_rows(rows: Vec<(String, Style)>) -> Vec<Line<'static>> {
    let width = rows.iter().map(|(r, _)| r.width()).max().unwrap_or(0);
    rows.into_iter()
        .map(|(r, style)| {
            let pad = " ".repeat(width - r.width());
            Line::styled(format!("{r}{pad}"), style)
        })
        .collect()
}

fn render_centered(lines: Vec<Line<'_>>, area: Rect, buf: &mut Buffer) {
    let height = (lines.len() as u16).min(area.height);
    let top = area.y + (area.height - height) / 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(Rect::new(area.x, top, area.width, height), buf);
}

fn form_lines(title: &str, form: &Form) -> Vec<Line<'static>> {
    let rows = form
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            if idx == form.focus {
                (format!("> {}: {}_", field.label, field.shown()), selected())
            } else {
                (format!("  {}: {} ", field.label, field.shown()), Style::default())
            }
        })
        .collect();

    let mut lines = vec![Line::styled(title.to_string(), bold()), Line::default()];
    lines.extend(pad_rows(rows));
    lines
}

fn menu_lines<T: ToString>(title: &str, items: &[T], current: usize) -> Vec<Line<'static>> {
    let rows = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            if idx == current {
                (format!("> {}. {}", idx + 1, item.to_string()), selected())
            } else {
                (format!("  {}. {}", idx + 1, item.to_string()), Style::default())
            }
        })
        .collect();

    let mut lines = vec![Line::styled(title.to_string(), bold()), Line::default()];
    lines.extend(pad_rows(rows));
    lines
}

pub fn prompt_question(kind: &PromptKind) -> String {
    match kind {
        PromptKind::TimeLimit => format!(
            "Time limit in seconds (min {}):",
            crate::timer::MIN_TIME_LIMIT_SECS
        ),
        PromptKind::PlayerCount => "Number of players (2+):".into(),
        PromptKind::PlayerName { seat, count, .. } => format!(
            "Name for player {} of {count} (blank for \"Player {}\"):",
            seat + 1,
            seat + 1
        ),
        PromptKind::ImportPath => "File with one word;category per line:".into(),
        PromptKind::ExportPath => "Save history to:".into(),
    }
}

fn prompt_lines(prompt: &Prompt) -> Vec<Line<'static>> {
    vec![
        Line::styled(prompt.title(), bold()),
        Line::default(),
        Line::from(prompt_question(&prompt.kind)),
        Line::styled(format!("{}_", prompt.field.value), selected()),
    ]
}

fn mode_label(mode: Mode) -> String {
    match mode {
        Mode::Normal => "Singleplayer (Normal)".into(),
        Mode::Timed { limit_secs } => format!("Singleplayer (Timed, {limit_secs}s)"),
        Mode::Multiplayer => "Multiplayer".into(),
    }
}

fn playing_lines(app: &App) -> Vec<Line<'static>> {
    let session = &app.session;
    let Some(round) = session.round() else {
        return vec![Line::from("No game is running.")];
    };

    let mut lines = Vec::new();
    if let Some(mode) = session.mode() {
        lines.push(Line::styled(mode_label(mode), dim()));
    }

    match (session.player_names(), session.scores(), session.active_players()) {
        (Some(names), Some(scores), Some(active)) => {
            let current = session.current_player();
            let spans = names
                .iter()
                .zip(scores)
                .zip(active)
                .enumerate()
                .map(|(idx, ((name, score), alive))| {
                    let style = if Some(idx) == current {
                        selected()
                    } else if !alive {
                        dim().add_modifier(Modifier::CROSSED_OUT)
                    } else {
                        Style::default()
                    };
                    Span::styled(format!("{name}: {score}"), style)
                });
            let spans = Itertools::intersperse(spans, Span::raw("   ")).collect::<Vec<_>>();
            lines.push(Line::from(spans));
        }
        _ => {
            let mut spans = vec![Span::styled(
                format!("Score: {}", session.score().unwrap_or(0)),
                bold(),
            )];
            if let Some(secs) = session.remaining_secs() {
                let style = if secs <= 10 {
                    bold().fg(Color::Red)
                } else {
                    bold()
                };
                spans.push(Span::raw("   "));
                spans.push(Span::styled(format!("Time left: {secs}s"), style));
            }
            lines.push(Line::from(spans));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(format!("Category: {}", round.category())));
    lines.push(Line::default());
    lines.extend(pad_rows(
        gallows(round.wrong_guesses())
            .into_iter()
            .map(|row| (row, Style::default()))
            .collect(),
    ));
    lines.push(Line::default());
    lines.push(Line::styled(
        round.display_mask(),
        bold().fg(Color::Green),
    ));
    lines.push(Line::default());

    let misses = round
        .guessed()
        .iter()
        .filter(|c| !round.word().contains(**c))
        .sorted()
        .join(" ");
    lines.push(Line::styled(
        format!("Wrong guesses: {misses}"),
        Style::default().fg(Color::Red),
    ));
    lines.push(Line::from(format!(
        "Tries left: {}/{MAX_TRIES}",
        round.tries_remaining()
    )));
    lines
}

fn history_lines(app: &App, scroll: usize, height: u16) -> Vec<Line<'static>> {
    let history = app.session.history();
    let mut lines = vec![
        Line::styled("Session History".to_string(), bold()),
        Line::default(),
    ];
    let room = usize::from(height).saturating_sub(lines.len()).max(1);
    lines.extend(
        history
            .lines()
            .iter()
            .enumerate()
            .skip(scroll)
            .take(room)
            .map(|(idx, line)| Line::from(format!("{}. {line}", idx + 1))),
    );
    lines
}

fn final_lines(summary: &GameSummary) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled("Game Over".to_string(), bold()),
        Line::styled(mode_label(summary.mode), dim()),
        Line::default(),
        Line::from(format!("The last word was: {}", summary.final_word)),
        Line::default(),
    ];

    let best = summary.standings.iter().map(|(_, s)| *s).max().unwrap_or(0);
    let rows = summary
        .standings
        .iter()
        .map(|(name, score)| {
            let style = if summary.standings.len() > 1 && *score == best {
                selected()
            } else {
                bold()
            };
            (format!("{name}: {score}"), style)
        })
        .collect();
    lines.extend(pad_rows(rows));
    lines
}

fn legend(screen: &Screen) -> &'static str {
    match screen {
        Screen::Login(_) => "(enter) log in / (tab) next field / (f2) register / (esc) quit",
        Screen::Register(_) => "(enter) register / (tab) next field / (esc) back",
        Screen::Menu { .. } => "(↑/↓) move / (enter) select / (1-7) shortcut / (esc) exit",
        Screen::Singleplayer { .. } => "(↑/↓) move / (enter) select / (esc) back",
        Screen::Prompt(_) => "(enter) confirm / (esc) cancel",
        Screen::Playing => "(a-z) guess a letter / (esc) leave game",
        Screen::History { .. } => "(↑/↓) scroll / (esc) back",
        Screen::FinalScores(_) => "(enter) back to menu",
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(1), // title
                    Constraint::Min(1),    // body
                    Constraint::Length(1), // status
                    Constraint::Length(1), // legend
                ]
                .as_ref(),
            )
            .split(area);

        let title = match self.session.user() {
            Some(user) => format!("HANGMAN · {user}"),
            None => "HANGMAN".to_string(),
        };
        Paragraph::new(Span::styled(title, bold().fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let body = match &self.screen {
            Screen::Login(form) => form_lines("Login", form),
            Screen::Register(form) => form_lines("Register", form),
            Screen::Menu { selected } => menu_lines("Main Menu", &MenuItem::ALL, *selected),
            Screen::Singleplayer { selected } => {
                menu_lines("Singleplayer", &SingleplayerItem::ALL, *selected)
            }
            Screen::Prompt(prompt) => prompt_lines(prompt),
            Screen::Playing => playing_lines(self),
            Screen::History { scroll } => history_lines(self, *scroll, chunks[1].height),
            Screen::FinalScores(summary) => final_lines(summary),
        };
        render_centered(body, chunks[1], buf);

        if let Some(status) = &self.status {
            let style = match status.kind {
                StatusKind::Info => Style::default().fg(Color::Cyan),
                StatusKind::Error => bold().fg(Color::Red),
            };
            Paragraph::new(Span::styled(status.text.clone(), style))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[2], buf);
        }

        Paragraph::new(Span::styled(
            legend(&self.screen),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{CredentialStore, UserDb};
    use crate::config::Config;
    use crate::words::{Word, WordList};

    fn create_test_app() -> App {
        let users = UserDb::open_in_memory().unwrap();
        users.register("ann", "Secret1").unwrap();
        let mut app = App::new(
            Box::new(WordList::new(vec![Word::new("dog", "Animals")])),
            Box::new(users),
            Config::default(),
        );
        app.session
            .login(app.accounts.as_ref(), "ann", "Secret1")
            .unwrap();
        app
    }

    fn rendered(app: &App) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_gallows_grows_with_misses() {
        assert_eq!(gallows(0).len(), 6);
        assert!(!gallows(0).concat().contains('O'));
        assert!(gallows(1).concat().contains('O'));
        assert!(gallows(MAX_TRIES).concat().contains("/ \\"));
    }

    #[test]
    fn test_login_screen() {
        let users = UserDb::open_in_memory().unwrap();
        let app = App::new(
            Box::new(WordList::default()),
            Box::new(users),
            Config::default(),
        );
        let screen = rendered(&app);

        assert!(screen.contains("Login"));
        assert!(screen.contains("Username"));
        assert!(screen.contains("(f2) register"));
    }

    #[test]
    fn test_playing_screen() {
        let mut app = create_test_app();
        app.session.start_singleplayer(false, None).unwrap();
        app.session.submit_guess("d").unwrap();
        app.session.submit_guess("z").unwrap();
        app.screen = Screen::Playing;

        let screen = rendered(&app);
        assert!(screen.contains("Category: Animals"));
        assert!(screen.contains("d _ _"));
        assert!(screen.contains("Wrong guesses: z"));
        assert!(screen.contains("Tries left: 5/6"));
        assert!(screen.contains("Score: 0"));
    }

    #[test]
    fn test_timed_screen_shows_countdown() {
        let mut app = create_test_app();
        app.session.start_singleplayer(true, Some(60)).unwrap();
        app.screen = Screen::Playing;

        let screen = rendered(&app);
        assert!(screen.contains("Time left:"));
        assert!(screen.contains("Timed, 60s"));
    }

    #[test]
    fn test_multiplayer_screen_lists_players() {
        let mut app = create_test_app();
        app.session
            .start_multiplayer(vec![String::new(), "bob".into()], true)
            .unwrap();
        app.screen = Screen::Playing;

        let screen = rendered(&app);
        assert!(screen.contains("ann: 0"));
        assert!(screen.contains("bob: 0"));
    }

    #[test]
    fn test_final_scores_screen() {
        let mut app = create_test_app();
        app.screen = Screen::FinalScores(GameSummary {
            mode: Mode::Multiplayer,
            standings: vec![("ann".into(), 7), ("bob".into(), 3)],
            final_word: "otter".into(),
            history_line: "Mode: Multiplayer | ann: 7, bob: 3".into(),
        });

        let screen = rendered(&app);
        assert!(screen.contains("Game Over"));
        assert!(screen.contains("otter"));
        assert!(screen.contains("ann: 7"));
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let mut app = create_test_app();
        app.session.start_singleplayer(false, None).unwrap();
        app.screen = Screen::Playing;

        let area = Rect::new(0, 0, 20, 5);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }

    #[test]
    fn test_prompt_questions() {
        assert_eq!(
            prompt_question(&PromptKind::TimeLimit),
            "Time limit in seconds (min 10):"
        );
        let kind = PromptKind::PlayerName {
            seat: 1,
            count: 3,
            names: vec![],
        };
        assert_eq!(
            prompt_question(&kind),
            "Name for player 2 of 3 (blank for \"Player 2\"):"
        );
    }
}
