use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::App;
use crate::audio::{AudioCmd, AudioPlayer};
use crate::config;
use crate::events::PlayerEvent;
use crate::mpris::ControlCmd;
use crate::ui;

const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

/// Two-key prefix state kept across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// `g` pressed once; a second `g` jumps to the top.
    pub pending_gg: bool,
    /// `z` pressed once; a second `z` jumps to the playing entry.
    pub pending_zz: bool,
}

/// Main terminal event loop: draws, forwards transport commands and maps
/// keys to player commands. Returns when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    events: &mpsc::Receiver<PlayerEvent>,
    state: &mut EventLoopState,
) -> anyhow::Result<()> {
    loop {
        for event in events.try_iter() {
            app.on_event(&event);
        }
        app.refresh();

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, settings, app, audio_player)? {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, audio_player, control_tx, state)? {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Translate a media-transport command. Returns true on quit.
pub fn handle_control_cmd(
    cmd: ControlCmd,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
) -> anyhow::Result<bool> {
    let audio_cmd = match cmd {
        ControlCmd::Quit => {
            audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
            return Ok(true);
        }
        ControlCmd::Play => AudioCmd::Play,
        ControlCmd::Pause => AudioCmd::Pause,
        ControlCmd::PlayPause => AudioCmd::TogglePause,
        ControlCmd::Stop => AudioCmd::Stop,
        ControlCmd::Next => AudioCmd::Next,
        ControlCmd::Prev => AudioCmd::Prev,
    };
    debug!(?cmd, "transport command");
    app.follow_playback_on();
    audio_player.send(audio_cmd)?;
    Ok(false)
}

fn step_volume(current: u8, step: u8, up: bool) -> u8 {
    if up {
        current.saturating_add(step).min(100)
    } else {
        current.saturating_sub(step)
    }
}

fn step_speed(current: f32, step: f32, up: bool) -> f32 {
    let next = if up { current + step } else { current - step };
    // Snap to two decimals so repeated steps do not drift.
    ((next * 100.0).round() / 100.0).clamp(MIN_SPEED, MAX_SPEED)
}

/// Returns true on quit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> anyhow::Result<bool> {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    if key.code != KeyCode::Char('z') {
        state.pending_zz = false;
    }

    let controls = &settings.controls;
    match key.code {
        KeyCode::Char('q') => {
            audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
            return Ok(true);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('z') => {
            if state.pending_zz {
                state.pending_zz = false;
                app.follow_playback_on();
                app.select_playing();
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Enter => {
            if app.has_tracks() {
                let already_playing = app.playback().index == Some(app.selected)
                    && app.playback().state == crate::audio::PlaybackState::Playing;
                if !already_playing {
                    app.follow_index(app.selected);
                    audio_player.send(AudioCmd::PlayIndex(app.selected))?;
                }
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            // Behave like MPRIS PlayPause.
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => {
            let secs = i64::try_from(controls.scrub_seconds).unwrap_or(i64::MAX);
            audio_player.send(AudioCmd::SeekBy(secs))?;
        }
        KeyCode::Char('H') => {
            let secs = i64::try_from(controls.scrub_seconds).unwrap_or(i64::MAX);
            audio_player.send(AudioCmd::SeekBy(-secs))?;
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let volume = step_volume(app.playback().volume, controls.volume_step, true);
            audio_player.send(AudioCmd::SetVolume(volume))?;
        }
        KeyCode::Char('-') => {
            let volume = step_volume(app.playback().volume, controls.volume_step, false);
            audio_player.send(AudioCmd::SetVolume(volume))?;
        }
        KeyCode::Char('m') => audio_player.send(AudioCmd::ToggleMute)?,
        KeyCode::Char(']') => {
            let speed = step_speed(app.playback().speed, controls.speed_step, true);
            audio_player.send(AudioCmd::SetSpeed(speed))?;
        }
        KeyCode::Char('[') => {
            let speed = step_speed(app.playback().speed, controls.speed_step, false);
            audio_player.send(AudioCmd::SetSpeed(speed))?;
        }
        KeyCode::Char('r') => audio_player.send(AudioCmd::CycleRepeat)?,
        KeyCode::Char('s') => {
            app.follow_playback_on();
            audio_player.send(AudioCmd::ToggleShuffle)?;
        }
        KeyCode::Char('a') => {
            if let Some(track) = app.selected_track().cloned() {
                audio_player.send(AudioCmd::AddNext(vec![track]))?;
            }
        }
        KeyCode::Char('d') => {
            if app.has_tracks() {
                audio_player.send(AudioCmd::Remove(app.selected))?;
            }
        }
        KeyCode::Char('K') => {
            if app.selected > 0 {
                audio_player.send(AudioCmd::MoveUp(app.selected))?;
                app.follow_playback_off();
                app.selected -= 1;
            }
        }
        KeyCode::Char('J') => {
            if app.selected + 1 < app.len() {
                audio_player.send(AudioCmd::MoveDown(app.selected))?;
                app.follow_playback_off();
                app.selected += 1;
            }
        }
        KeyCode::Char('C') => {
            app.notice = None;
            audio_player.send(AudioCmd::ClearQueue)?;
        }
        KeyCode::Char('S') => audio_player.send(AudioCmd::SaveState)?,
        KeyCode::Char('y') => app.toggle_lyrics(),
        _ => {}
    }

    Ok(false)
}
