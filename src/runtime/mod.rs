use std::env;
use std::path::Path;
use std::sync::{Arc, mpsc};

use anyhow::Context;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{AudioPlayer, PlayerDeps};
use crate::events::Topic;
use crate::library::LibraryProvider;
use crate::logging;
use crate::mpris::{ControlCmd, NullBridge, TransportBridge};
use crate::persist::{StateStore, TomlStateStore};

mod event_loop;
mod settings;
mod startup;

#[cfg(test)]
mod tests;

pub fn run() -> anyhow::Result<()> {
    let settings = settings::load_settings();

    let _log_guard = match logging::init_logging(&settings.logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("reprise: logging disabled: {e}");
            None
        }
    };

    let dir = env::args().nth(1).unwrap_or_else(|| {
        env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });
    info!(dir = %dir, "starting");

    let store = if settings.state.enabled {
        TomlStateStore::from_settings(&settings.state)
            .inspect_err(|e| warn!("state persistence disabled: {e}"))
            .ok()
    } else {
        None
    };

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let bridge: Box<dyn TransportBridge> = if settings.audio.mpris {
        Box::new(crate::mpris::spawn_mpris(control_tx.clone()))
    } else {
        Box::new(NullBridge)
    };

    let deps = PlayerDeps {
        provider: Arc::new(LibraryProvider::new(settings.lyrics.sidecar_extension.clone())),
        bridge,
        store: store
            .clone()
            .map(|s| Box::new(s) as Box<dyn StateStore>),
    };
    let audio_player =
        AudioPlayer::with_rodio(deps, &settings).context("failed to start audio output")?;
    let failures = audio_player.subscribe(&[Topic::Failure]);

    startup::load_library(
        Path::new(&dir),
        &settings,
        &audio_player,
        store.as_ref().map(|s| s as &dyn StateStore),
    )
    .context("failed to queue library")?;

    let mut app = App::new(audio_player.playback_handle(), audio_player.queue_handle());
    app.follow_playback = settings.ui.follow_playback;
    app.show_lyrics = settings.ui.show_lyrics;
    app.set_current_dir(dir);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &audio_player,
        &control_tx,
        &control_rx,
        &failures,
        &mut state,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting");
    run_result
}
