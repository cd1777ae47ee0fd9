use itertools::Itertools;
use tracing::{debug, info};

use crate::accounts::CredentialStore;
use crate::error::GameError;
use crate::history::HistoryLog;
use crate::round::{GuessOutcome, RoundState, RoundStatus};
use crate::timer::{Clock, SystemClock, TimerController, TimerEvent};
use crate::turns::{Turn, TurnRotator};
use crate::words::WordSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Timed { limit_secs: u64 },
    Multiplayer,
}

/// What a resolved (or unresolved) guess did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The round is still going, or the guess changed nothing.
    Continue,
    /// Single-player: the round ended and a fresh word was dealt.
    NextRound { won: bool, word: String },
    /// Multiplayer: the round ended and `player` was dealt a fresh word.
    NextTurn { won: bool, word: String, player: usize },
    /// The game is over; its history line has been recorded.
    GameOver(GameSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessReport {
    pub outcome: GuessOutcome,
    pub transition: Transition,
}

/// Final result of one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub mode: Mode,
    /// (player, score) in seating order; a single entry in single-player.
    pub standings: Vec<(String, u32)>,
    /// Word of the round that was in play when the game ended.
    pub final_word: String,
    pub history_line: String,
}

#[derive(Debug, Clone)]
struct Roster {
    names: Vec<String>,
    scores: Vec<u32>,
    active: Vec<bool>,
    rotator: TurnRotator,
}

#[derive(Debug, Clone)]
enum Play<C: Clock> {
    Normal { score: u32 },
    Timed { score: u32, timer: TimerController<C> },
    Multiplayer(Roster),
}

#[derive(Debug, Clone)]
struct Game<C: Clock> {
    play: Play<C>,
    round: RoundState,
}

enum Resolution {
    Deal { player: Option<usize> },
    Finish,
}

fn deal<W: WordSource>(words: &W) -> RoundState {
    let word = words.draw_random_word();
    debug!(category = %word.category, len = word.text.len(), "dealt word");
    RoundState::start(word.text, word.category)
}

/// Orchestrates login, mode selection, round transitions and history.
///
/// At most one game runs at a time. All state changes go through `&mut self`,
/// so callers that share a session across threads must wrap it in a lock.
#[derive(Debug)]
pub struct GameSession<W, C: Clock = SystemClock> {
    words: W,
    clock: C,
    user: Option<String>,
    game: Option<Game<C>>,
    history: HistoryLog,
}

impl<W: WordSource> GameSession<W> {
    pub fn new(words: W) -> Self {
        Self::with_clock(words, SystemClock)
    }
}

impl<W: WordSource, C: Clock + Clone> GameSession<W, C> {
    pub fn with_clock(words: W, clock: C) -> Self {
        Self {
            words,
            clock,
            user: None,
            game: None,
            history: HistoryLog::new(),
        }
    }

    pub fn words(&self) -> &W {
        &self.words
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn login<S: CredentialStore + ?Sized>(
        &mut self,
        store: &S,
        username: &str,
        password: &str,
    ) -> Result<(), GameError> {
        if !store.authenticate(username, password) {
            info!(username, "login rejected");
            return Err(GameError::InvalidCredentials);
        }
        self.abandon();
        self.user = Some(username.trim().to_string());
        info!(username, "logged in");
        Ok(())
    }

    pub fn logout(&mut self) {
        self.abandon();
        self.user = None;
    }

    fn require_user(&self) -> Result<&str, GameError> {
        self.user.as_deref().ok_or(GameError::NotAuthenticated)
    }

    pub fn start_singleplayer(
        &mut self,
        timed: bool,
        time_limit: Option<u64>,
    ) -> Result<(), GameError> {
        self.require_user()?;

        let play = if timed {
            let limit = time_limit.unwrap_or(0);
            Play::Timed {
                score: 0,
                timer: TimerController::start(self.clock.clone(), limit)?,
            }
        } else {
            Play::Normal { score: 0 }
        };

        self.abandon();
        self.game = Some(Game {
            play,
            round: deal(&self.words),
        });
        info!(timed, ?time_limit, "singleplayer game started");
        Ok(())
    }

    /// Starts a round-robin game in the given seating order and returns the
    /// index of the first player. Blank names become "Player <n>"; with
    /// `first_is_current_user` the first seat belongs to the logged-in user.
    pub fn start_multiplayer(
        &mut self,
        player_names: Vec<String>,
        first_is_current_user: bool,
    ) -> Result<usize, GameError> {
        let user = self.require_user()?.to_string();
        if player_names.len() < 2 {
            return Err(GameError::InvalidPlayerCount(player_names.len()));
        }

        let names: Vec<String> = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| match name.trim() {
                _ if i == 0 && first_is_current_user => user.clone(),
                "" => format!("Player {}", i + 1),
                trimmed => trimmed.to_string(),
            })
            .collect();

        let count = names.len();
        let mut roster = Roster {
            names,
            scores: vec![0; count],
            active: vec![true; count],
            rotator: TurnRotator::new(),
        };
        let first = match roster.rotator.advance(&roster.active) {
            Turn::Next(idx) => idx,
            Turn::AllEliminated => return Err(GameError::InvalidPlayerCount(0)),
        };

        self.abandon();
        self.game = Some(Game {
            play: Play::Multiplayer(roster),
            round: deal(&self.words),
        });
        info!(players = count, first, "multiplayer game started");
        Ok(first)
    }

    /// Feeds one guess into the current round and applies the round
    /// resolution policy of the running mode.
    pub fn submit_guess(&mut self, input: &str) -> Result<GuessReport, GameError> {
        let game = self.game.as_mut().ok_or(GameError::NoActiveGame)?;
        let outcome = game.round.guess(input);
        let status = game.round.status();

        let transition = match (outcome, status) {
            (GuessOutcome::Accepted, RoundStatus::Won) => self.resolve_round(true),
            (GuessOutcome::Accepted, RoundStatus::Lost) => self.resolve_round(false),
            _ => Transition::Continue,
        };

        Ok(GuessReport {
            outcome,
            transition,
        })
    }

    fn resolve_round(&mut self, won: bool) -> Transition {
        let Some(game) = self.game.as_mut() else {
            return Transition::Continue;
        };
        let word = game.round.word().to_string();
        let tries = u32::from(game.round.tries_remaining());
        info!(won, %word, "round finished");

        let resolution = match &mut game.play {
            Play::Normal { score } => {
                if won {
                    *score += 1;
                    Resolution::Deal { player: None }
                } else {
                    Resolution::Finish
                }
            }
            // Only the timer ends a timed game; a lost round just deals again.
            Play::Timed { score, .. } => {
                if won {
                    *score += 1;
                }
                Resolution::Deal { player: None }
            }
            Play::Multiplayer(roster) => {
                let current = roster.rotator.current().unwrap_or(0);
                if won {
                    roster.scores[current] += tries;
                } else {
                    roster.active[current] = false;
                    info!(player = %roster.names[current], "player eliminated");
                }
                match roster.rotator.advance(&roster.active) {
                    Turn::Next(idx) => Resolution::Deal { player: Some(idx) },
                    Turn::AllEliminated => Resolution::Finish,
                }
            }
        };

        match resolution {
            Resolution::Deal { player } => {
                let round = deal(&self.words);
                if let Some(game) = self.game.as_mut() {
                    game.round = round;
                }
                match player {
                    Some(player) => Transition::NextTurn { won, word, player },
                    None => Transition::NextRound { won, word },
                }
            }
            Resolution::Finish => match self.game.take() {
                Some(game) => Transition::GameOver(self.finish(game)),
                None => Transition::Continue,
            },
        }
    }

    /// Polls the countdown of a timed game; returns the summary when it
    /// expires on this tick.
    pub fn tick(&mut self) -> Option<GameSummary> {
        let expired = match self.game.as_mut() {
            Some(Game {
                play: Play::Timed { timer, .. },
                ..
            }) => timer.tick() == TimerEvent::Expired,
            _ => false,
        };
        if expired {
            self.on_timer_expired()
        } else {
            None
        }
    }

    /// Ends a running timed game. Does nothing in other modes.
    pub fn on_timer_expired(&mut self) -> Option<GameSummary> {
        match self.game.take() {
            Some(game) if matches!(game.play, Play::Timed { .. }) => Some(self.finish(game)),
            other => {
                self.game = other;
                None
            }
        }
    }

    /// Leaves the running game without recording history. Returns whether a
    /// game was running.
    pub fn abandon(&mut self) -> bool {
        match self.game.take() {
            Some(mut game) => {
                if let Play::Timed { timer, .. } = &mut game.play {
                    timer.stop();
                }
                info!("game abandoned");
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, mut game: Game<C>) -> GameSummary {
        let user = self.user.clone().unwrap_or_default();
        let (mode, standings, history_line) = match &mut game.play {
            Play::Normal { score } => (
                Mode::Normal,
                vec![(user.clone(), *score)],
                format!("Mode: Singleplayer (Normal) | Player: {user} | Score: {score}"),
            ),
            Play::Timed { score, timer } => {
                timer.stop();
                let limit_secs = timer.limit_secs();
                (
                    Mode::Timed { limit_secs },
                    vec![(user.clone(), *score)],
                    format!(
                        "Mode: Singleplayer (Timed, {limit_secs}s) | Player: {user} | Score: {score}"
                    ),
                )
            }
            Play::Multiplayer(roster) => {
                let standings: Vec<(String, u32)> = roster
                    .names
                    .iter()
                    .cloned()
                    .zip(roster.scores.iter().copied())
                    .collect();
                let line = standings
                    .iter()
                    .map(|(name, score)| format!("{name}: {score}"))
                    .join(", ");
                (
                    Mode::Multiplayer,
                    standings,
                    format!("Mode: Multiplayer | {line}"),
                )
            }
        };

        self.history.push(history_line.clone());
        info!(%history_line, "game over");

        GameSummary {
            mode,
            standings,
            final_word: game.round.word().to_string(),
            history_line,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.game.is_some()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.game.as_ref().map(|game| match &game.play {
            Play::Normal { .. } => Mode::Normal,
            Play::Timed { timer, .. } => Mode::Timed {
                limit_secs: timer.limit_secs(),
            },
            Play::Multiplayer(_) => Mode::Multiplayer,
        })
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.game.as_ref().map(|game| &game.round)
    }

    /// Single-player score of the running game.
    pub fn score(&self) -> Option<u32> {
        match self.game.as_ref().map(|game| &game.play) {
            Some(Play::Normal { score }) | Some(Play::Timed { score, .. }) => Some(*score),
            _ => None,
        }
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        match self.game.as_ref().map(|game| &game.play) {
            Some(Play::Timed { timer, .. }) => Some(timer.remaining_secs()),
            _ => None,
        }
    }

    fn roster(&self) -> Option<&Roster> {
        match self.game.as_ref().map(|game| &game.play) {
            Some(Play::Multiplayer(roster)) => Some(roster),
            _ => None,
        }
    }

    pub fn current_player(&self) -> Option<usize> {
        self.roster().and_then(|roster| roster.rotator.current())
    }

    pub fn player_names(&self) -> Option<&[String]> {
        self.roster().map(|roster| roster.names.as_slice())
    }

    pub fn scores(&self) -> Option<&[u32]> {
        self.roster().map(|roster| roster.scores.as_slice())
    }

    pub fn active_players(&self) -> Option<&[bool]> {
        self.roster().map(|roster| roster.active.as_slice())
    }
}
