//! Line-oriented front end: menus, account forms and the game loop.

use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use fluent_bundle::FluentArgs;
use tracing::{debug, warn};

use crate::auth::{AuthError, AuthManager, Registration, Session};
use crate::game::logic::GameState;
use crate::game::session::{GameEvents, GameSession, Phase};
use crate::game::types::{Actor, MoveRecord};
use crate::i18n::I18n;
use crate::stats::StatsRecorder;
use crate::storage::{Settings, UserStore};

/// Collects the visible move log from session events until the shell
/// prints it.
pub struct MoveLog {
    i18n: I18n,
    lines: Vec<String>,
}

impl MoveLog {
    pub fn new(i18n: I18n) -> Self {
        Self {
            i18n,
            lines: Vec::new(),
        }
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl GameEvents for MoveLog {
    fn on_new_game(&mut self, state: &GameState) {
        self.lines.clear();
        self.lines.push(self.i18n.new_game(state.pile()));
    }

    fn on_state_changed(&mut self, state: &GameState, last: MoveRecord) {
        self.lines.push(self.i18n.move_line(last));
        if state.is_active() {
            self.lines.push(self.i18n.bricks_left(state.pile()));
        }
    }

    fn on_game_finished(&mut self, winner: Actor) {
        self.lines.push(self.i18n.game_over(winner));
    }
}

pub struct App<'a, I, O> {
    store: &'a UserStore,
    settings: Settings,
    game: GameSession<MoveLog>,
    input: I,
    out: O,
}

impl<'a, I: BufRead, O: Write> App<'a, I, O> {
    pub fn new(store: &'a UserStore, settings: Settings, i18n: I18n, input: I, out: O) -> Result<Self> {
        let game = GameSession::new(settings.game, MoveLog::new(i18n))?;
        Ok(Self {
            store,
            settings,
            game,
            input,
            out,
        })
    }

    fn i18n(&self) -> &I18n {
        self.game.events().i18n()
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    fn say_id(&mut self, id: &str) -> Result<()> {
        let text = self.i18n().t(id);
        self.say(&text)
    }

    /// Show `prompt` and read one trimmed line; `None` at end of input.
    fn ask(&mut self, prompt_id: &str) -> Result<Option<String>> {
        let prompt = self.i18n().t(prompt_id);
        write!(self.out, "{prompt} ")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn run(&mut self) -> Result<()> {
        let title = self.i18n().t("app-title");
        self.say(&title)?;
        let rules = self.i18n().rules(self.settings.game.min_take, self.settings.game.max_take);
        self.say(&rules)?;

        let mut session: Option<Session> = None;
        loop {
            let menu = if session.is_some() { "menu-player" } else { "menu-guest" };
            let Some(cmd) = self.ask(menu)? else {
                break;
            };
            match (cmd.as_str(), session.clone()) {
                ("q", _) => break,
                ("b", current) => self.show_leaderboard(current.as_ref())?,
                ("l", None) => session = self.log_in()?,
                ("r", None) => session = self.register()?,
                ("n", Some(player)) => self.play(&player)?,
                ("s", Some(player)) => self.show_stats(&player)?,
                ("o", Some(_)) => {
                    // unsaved games stay queued under their own player
                    self.store_pending()?;
                    session = None;
                }
                _ => self.say_id("menu-unknown")?,
            }
        }

        // one last attempt for outcomes that could not be stored earlier
        if !self.store_pending()? {
            warn!(pending = self.game.unrecorded().count(), "outcomes lost on exit");
        }
        Ok(())
    }

    /// Try to store every pending outcome, telling the player when that fails.
    /// Returns whether nothing is left pending.
    fn store_pending(&mut self) -> Result<bool> {
        if self.game.unrecorded().next().is_none() {
            return Ok(true);
        }
        match self.game.record_outcomes(self.store) {
            Ok(_) => Ok(true),
            Err(e) => {
                let text = self.i18n().save_failed(&e);
                self.say(&text)?;
                Ok(false)
            }
        }
    }

    fn log_in(&mut self) -> Result<Option<Session>> {
        let Some(login) = self.ask("prompt-login")? else {
            return Ok(None);
        };
        let Some(password) = self.ask("prompt-password")? else {
            return Ok(None);
        };
        let result = AuthManager::new(self.store).login(&login, &password);
        self.finish_auth(result)
    }

    fn register(&mut self) -> Result<Option<Session>> {
        let mut form = Registration::default();
        for (id, field) in [
            ("prompt-login", &mut form.login),
            ("prompt-password", &mut form.password),
            ("prompt-email", &mut form.email),
            ("prompt-gender", &mut form.gender),
            ("prompt-age", &mut form.age_category),
        ] {
            match self.ask(id)? {
                Some(value) => *field = value,
                None => return Ok(None),
            }
        }
        let result = AuthManager::new(self.store).register(form);
        self.finish_auth(result)
    }

    fn finish_auth(&mut self, result: Result<Session, AuthError>) -> Result<Option<Session>> {
        match result {
            Ok(session) => {
                let mut args = FluentArgs::new();
                args.set("login", session.login().to_string());
                let text = self.i18n().t_args("welcome", &args);
                self.say(&text)?;
                Ok(Some(session))
            }
            Err(e) => {
                let text = self.i18n().auth_error(&e);
                self.say(&text)?;
                Ok(None)
            }
        }
    }

    fn show_stats(&mut self, player: &Session) -> Result<()> {
        let Some(stats) = self.store.stats(player.login()) else {
            return Ok(());
        };
        let line = self.i18n().stats_line(&stats);
        self.say(&line)
    }

    /// Print the ranking, marking the row of the logged-in player.
    fn show_leaderboard(&mut self, current: Option<&Session>) -> Result<()> {
        self.say_id("leaderboard-title")?;
        let rows = self.store.leaderboard();
        if rows.is_empty() {
            return self.say_id("leaderboard-empty");
        }
        for (rank, row) in rows.iter().enumerate() {
            let mark = if current.is_some_and(|p| p.login() == row.login) { '*' } else { ' ' };
            let line = format!(
                "{mark}{:>2}. {:<16} {:>4} {:>4} {:>4} {:>6.1}%",
                rank + 1,
                row.login,
                row.games,
                row.wins,
                row.losses,
                row.win_rate
            );
            self.say(&line)?;
        }
        Ok(())
    }

    fn flush_log(&mut self) -> Result<()> {
        for line in self.game.events_mut().drain() {
            self.say(&line)?;
        }
        Ok(())
    }

    fn play(&mut self, player: &Session) -> Result<()> {
        self.game.start(player)?;
        self.flush_log()?;

        loop {
            match self.game.phase() {
                Phase::HumanTurn => {
                    let Some(answer) = self.ask("turn-human")? else {
                        return Ok(());
                    };
                    if answer == "q" {
                        return self.say_id("game-abandoned");
                    }
                    let Ok(amount) = answer.parse::<u32>() else {
                        self.say_id("not-a-number")?;
                        continue;
                    };
                    if let Err(e) = self.game.human_move(amount) {
                        let text = self.i18n().move_error(&e);
                        self.say(&text)?;
                    }
                    self.flush_log()?;
                }
                Phase::ComputerTurn => {
                    let text = self.i18n().turn(Actor::Computer);
                    self.say(&text)?;
                    thread::sleep(Duration::from_millis(self.settings.computer_delay_ms));
                    if let Err(e) = self.game.computer_move() {
                        let text = self.i18n().session_error(&e);
                        self.say(&text)?;
                        return Ok(());
                    }
                    self.flush_log()?;
                }
                Phase::Finished { winner } => {
                    debug!(%winner, "recording outcome");
                    // on failure the outcome stays queued and is retried later
                    if self.store_pending()? {
                        if let Some(stats) = self.store.stats(player.login()) {
                            let line = self.i18n().stats_line(&stats);
                            self.say(&line)?;
                        }
                    }
                    return Ok(());
                }
                Phase::NotStarted => return Ok(()),
            }
        }
    }
}
