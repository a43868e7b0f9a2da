use std::io;

use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use bricks::i18n::I18n;
use bricks::storage::{self, UserStore};
use bricks::ui::app::App;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let settings = storage::load_settings();
    // write back so a fresh install gets an editable file
    if let Err(e) = storage::save_settings(&settings) {
        warn!(error = %e, "could not save settings");
    }
    let i18n = I18n::load(settings.language.as_deref());

    let users_path = storage::users_path().context("no place to keep the user store")?;
    let (store, load_error) = UserStore::open_or_default(&users_path);
    if let Some(e) = load_error {
        eprintln!("{}", i18n.store_load_failed(&e));
    }

    let stdin = io::stdin();
    let mut app = App::new(&store, settings, i18n, stdin.lock(), io::stdout())?;
    app.run()
}
