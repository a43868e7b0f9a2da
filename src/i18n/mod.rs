use fluent_bundle::{FluentArgs, FluentBundle, FluentResource};
use fluent_syntax::parser::ParserError;
use tracing::warn;
use unic_langid::LanguageIdentifier;

use crate::ai::PolicyError;
use crate::auth::{AuthError, MIN_LOGIN_LEN, MIN_PASSWORD_LEN};
use crate::game::logic::MoveError;
use crate::game::session::SessionError;
use crate::game::types::{Actor, MoveRecord};
use crate::stats::UserStats;

const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../resources/en.ftl")),
    ("ru", include_str!("../../resources/ru.ftl")),
];

/// Fluent-based message catalog for everything shown to the player.
pub struct I18n {
    bundle: FluentBundle<FluentResource>,
    lang: String,
}

impl I18n {
    /// Pick `preferred` if given, otherwise the system language, falling
    /// back to English.
    pub fn load(preferred: Option<&str>) -> Self {
        let requested = preferred
            .map(str::to_string)
            .or_else(sys_locale::get_locale)
            .unwrap_or_else(|| "en".to_string())
            .to_lowercase();
        let lang_code = if requested.starts_with("ru") { "ru" } else { "en" };

        if let Some(i18n) = Self::try_load(lang_code) {
            return i18n;
        }
        if lang_code != "en" {
            if let Some(i18n) = Self::try_load("en") {
                return i18n;
            }
        }

        // Empty fallback: every lookup returns its message id.
        Self {
            bundle: FluentBundle::new(vec![LanguageIdentifier::default()]),
            lang: "en".to_string(),
        }
    }

    fn try_load(lang: &str) -> Option<Self> {
        let (_, source) = CATALOGS.iter().find(|(code, _)| *code == lang)?;
        let resource = match FluentResource::try_new(source.to_string()) {
            Ok(resource) => resource,
            Err((_, errors)) => {
                log_parse_errors(lang, &errors);
                return None;
            }
        };
        let langid: LanguageIdentifier = lang.parse().ok()?;
        let mut bundle = FluentBundle::new(vec![langid]);
        // plain text output, no bidi isolation marks around arguments
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).ok()?;
        Some(Self {
            bundle,
            lang: lang.to_string(),
        })
    }

    /// Get a translated message by its identifier.
    pub fn t(&self, id: &str) -> String {
        self.format(id, None)
    }

    /// Get a translated message with arguments.
    pub fn t_args(&self, id: &str, args: &FluentArgs) -> String {
        self.format(id, Some(args))
    }

    fn format(&self, id: &str, args: Option<&FluentArgs>) -> String {
        let msg = match self.bundle.get_message(id) {
            Some(m) => m,
            None => return id.to_string(),
        };
        let pattern = match msg.value() {
            Some(p) => p,
            None => return id.to_string(),
        };
        let mut errors = vec![];
        let text = self
            .bundle
            .format_pattern(pattern, args, &mut errors)
            .to_string();
        if !errors.is_empty() {
            warn!(id, ?errors, "message formatted with errors");
        }
        text
    }

    pub fn current_language(&self) -> &str {
        &self.lang
    }

    pub fn rules(&self, min: u32, max: u32) -> String {
        let mut args = FluentArgs::new();
        args.set("min", min);
        args.set("max", max);
        self.t_args("rules", &args)
    }

    pub fn new_game(&self, pile: u32) -> String {
        self.count("new-game", pile)
    }

    pub fn bricks_left(&self, pile: u32) -> String {
        self.count("bricks-left", pile)
    }

    fn count(&self, id: &str, count: u32) -> String {
        let mut args = FluentArgs::new();
        args.set("count", count);
        self.t_args(id, &args)
    }

    /// Move-log line such as "You took 2 bricks".
    pub fn move_line(&self, record: MoveRecord) -> String {
        let id = match record.actor {
            Actor::Human => "human-took",
            Actor::Computer => "computer-took",
        };
        let mut args = FluentArgs::new();
        args.set("amount", record.amount);
        self.t_args(id, &args)
    }

    pub fn turn(&self, actor: Actor) -> String {
        match actor {
            Actor::Human => self.t("turn-human"),
            Actor::Computer => self.t("turn-computer"),
        }
    }

    pub fn game_over(&self, winner: Actor) -> String {
        match winner {
            Actor::Human => self.t("you-won"),
            Actor::Computer => self.t("you-lost"),
        }
    }

    pub fn move_error(&self, err: &MoveError) -> String {
        let mut args = FluentArgs::new();
        let id = match *err {
            MoveError::GameInactive => "error-game-inactive",
            MoveError::OutOfTurn { .. } => "error-out-of-turn",
            MoveError::IllegalAmount { min, max, .. } => {
                args.set("min", min);
                args.set("max", max);
                "error-illegal-amount"
            }
            MoveError::InsufficientPile { remaining, .. } => {
                args.set("remaining", remaining);
                "error-insufficient-pile"
            }
        };
        self.t_args(id, &args)
    }

    pub fn session_error(&self, err: &SessionError) -> String {
        match err {
            SessionError::Move(e) => self.move_error(e),
            SessionError::Policy(PolicyError::NoLegalMove { .. }) => self.t("error-no-legal-move"),
            SessionError::Policy(e) => e.to_string(),
        }
    }

    pub fn auth_error(&self, err: &AuthError) -> String {
        let mut args = FluentArgs::new();
        let id = match err {
            AuthError::InvalidLogin => {
                args.set("min", MIN_LOGIN_LEN);
                "auth-invalid-login"
            }
            AuthError::LoginTaken => "auth-login-taken",
            AuthError::InvalidPassword => {
                args.set("min", MIN_PASSWORD_LEN);
                "auth-invalid-password"
            }
            AuthError::InvalidEmail => "auth-invalid-email",
            AuthError::UnknownUser => "auth-unknown-user",
            AuthError::WrongPassword => "auth-wrong-password",
            AuthError::Persistence(e) => return self.save_failed(e),
        };
        self.t_args(id, &args)
    }

    pub fn save_failed(&self, reason: &dyn std::error::Error) -> String {
        self.with_reason("error-save-failed", reason)
    }

    pub fn store_load_failed(&self, reason: &dyn std::error::Error) -> String {
        self.with_reason("store-load-failed", reason)
    }

    fn with_reason(&self, id: &str, reason: &dyn std::error::Error) -> String {
        let mut args = FluentArgs::new();
        args.set("reason", reason.to_string());
        self.t_args(id, &args)
    }

    pub fn stats_line(&self, stats: &UserStats) -> String {
        let mut args = FluentArgs::new();
        args.set("games", stats.games_played);
        args.set("wins", stats.wins);
        args.set("losses", stats.losses);
        args.set("rate", format!("{:.1}", stats.win_rate()));
        self.t_args("stats-line", &args)
    }
}

fn log_parse_errors(lang: &str, errors: &[ParserError]) {
    for e in errors {
        warn!(lang, error = ?e.kind, "bad message catalog entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn took(actor: Actor, amount: u32) -> MoveRecord {
        MoveRecord { actor, amount }
    }

    #[test]
    fn english_plurals() {
        let i18n = I18n::load(Some("en-US"));
        assert_eq!(i18n.current_language(), "en");
        assert_eq!(i18n.move_line(took(Actor::Human, 1)), "You took 1 brick");
        assert_eq!(i18n.move_line(took(Actor::Computer, 3)), "Computer took 3 bricks");
    }

    #[test]
    fn russian_plurals() {
        let i18n = I18n::load(Some("ru_RU"));
        assert_eq!(i18n.current_language(), "ru");
        assert_eq!(i18n.move_line(took(Actor::Human, 1)), "Вы взяли 1 кирпич");
        assert_eq!(i18n.move_line(took(Actor::Human, 3)), "Вы взяли 3 кирпича");
        assert_eq!(i18n.move_line(took(Actor::Computer, 5)), "Компьютер взял 5 кирпичей");
    }

    #[test]
    fn unknown_language_is_english() {
        let i18n = I18n::load(Some("de"));
        assert_eq!(i18n.current_language(), "en");
        assert_eq!(i18n.game_over(Actor::Human), "You won!");
    }

    #[test]
    fn errors_carry_bounds() {
        let i18n = I18n::load(Some("en"));
        let msg = i18n.move_error(&MoveError::IllegalAmount {
            amount: 4,
            min: 1,
            max: 3,
        });
        assert_eq!(msg, "You can take from 1 to 3 bricks.");
    }

    #[test]
    fn auth_errors_are_translated() {
        let i18n = I18n::load(Some("ru"));
        assert_eq!(
            i18n.auth_error(&AuthError::InvalidPassword),
            "Пароль должен содержать минимум 4 символа."
        );
    }

    #[test]
    fn missing_id_echoes_id() {
        let i18n = I18n::load(Some("en"));
        assert_eq!(i18n.t("no-such-message"), "no-such-message");
    }

    #[test]
    fn stats_line_formats_rate() {
        let i18n = I18n::load(Some("en"));
        let stats = UserStats {
            games_played: 3,
            wins: 1,
            losses: 2,
        };
        assert_eq!(
            i18n.stats_line(&stats),
            "Games: 3  Wins: 1  Losses: 2  Win rate: 33.3%"
        );
    }
}
