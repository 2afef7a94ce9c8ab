//! UI rendering helpers for the terminal user interface.
//!
//! This module renders the TUI using `ratatui`. It only reads from `App`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::App;
use crate::audio::{PlaybackInfo, PlaybackState};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::display_from_fields;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("zz", "to playing");
    map.insert("enter", "play selected");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next");
    map.insert("+/-", "volume");
    map.insert("m", "mute");
    map.insert("[/]", "speed");
    map.insert("r", "repeat");
    map.insert("s", "shuffle");
    map.insert("a", "play next");
    map.insert("d", "remove");
    map.insert("J/K", "move down/up");
    map.insert("C", "clear");
    map.insert("S", "save");
    map.insert("y", "lyrics");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(controls: &ControlsSettings) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "gg/G", "zz", "+/-", "m", "[/]", "r", "s",
        "a", "d", "J/K", "C", "S", "y", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", controls.scrub_seconds))
            } else {
                CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}"))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    parts.push(format!("-{}", format_mmss(t.saturating_sub(elapsed))));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn state_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Stopped => "Stopped",
        PlaybackState::Loading => "Loading",
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
    }
}

fn status_text(app: &App, ui: &UiSettings) -> String {
    let info = app.playback();
    let mut parts: Vec<String> = Vec::new();

    parts.push(if app.follow_playback {
        "CURSOR: Follow".to_string()
    } else {
        "CURSOR: Free-roam".to_string()
    });
    parts.push(format!("REPEAT: {}", info.repeat.label()));
    parts.push(format!("Shuffle: {}", if info.shuffle { "ON" } else { "OFF" }));

    if let Some(track) = &info.track {
        let song = display_from_fields(
            track,
            &ui.now_playing_track_fields,
            &ui.now_playing_track_separator,
        );
        match now_playing_time_text(info.position, info.duration, ui) {
            Some(time) => parts.push(format!("Song: {song} [{time}]")),
            None => parts.push(format!("Song: {song}")),
        }
    }
    parts.push(state_label(info.state).to_string());

    if info.muted {
        parts.push(format!("Vol: {}% (muted)", info.volume));
    } else {
        parts.push(format!("Vol: {}%", info.volume));
    }
    if (info.speed - 1.0).abs() > f32::EPSILON {
        parts.push(format!("Speed: {:.2}x", info.speed));
    }

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {dir}"));
    }
    if let Some(notice) = &app.notice {
        parts.push(format!("! {notice}"));
    }

    parts.join(" • ")
}

/// Visible window `[start, end)` of `total` rows of `height`, centred on `selected`.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize) {
    if total <= height || height == 0 {
        return (0, total);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn draw_queue(frame: &mut Frame, app: &App, area: Rect) {
    let entries = &app.queue().entries;
    let playing = app.playback().index;
    let (start, end) = visible_window(entries.len(), area.height.saturating_sub(2) as usize, app.selected);

    // Only build items for the visible window.
    let items: Vec<ListItem> = entries[start..end]
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let i = start + offset;
            let marker = if Some(i) == playing {
                "♪ "
            } else if !entry.track.can_play() {
                "✗ "
            } else {
                "  "
            };
            let item = ListItem::new(format!("{marker}{}", entry.track.display));
            if entry.track.can_play() {
                item
            } else {
                item.style(Style::default().add_modifier(Modifier::DIM))
            }
        })
        .collect();

    let title = if app.queue().name.is_empty() {
        " queue ".to_string()
    } else {
        format!(" queue: {} ({}) ", app.queue().name, entries.len())
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !entries.is_empty() {
        state.select(Some(app.selected - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_lyrics(frame: &mut Frame, info: &PlaybackInfo, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" lyrics ")
        .padding(Padding::horizontal(1));

    if info.lyrics.is_empty() {
        let empty = Paragraph::new("no lyrics")
            .alignment(Alignment::Center)
            .italic()
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let current = info.lyric_index.unwrap_or(0);
    let (start, end) = visible_window(info.lyrics.len(), height, current);
    let lines: Vec<Line> = info.lyrics[start..end]
        .iter()
        .enumerate()
        .map(|(offset, slice)| {
            let line = Line::from(slice.text.clone());
            if info.lyric_index == Some(start + offset) {
                line.style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            } else {
                line.style(Style::default().add_modifier(Modifier::DIM))
            }
        })
        .collect();

    let lyrics = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(lyrics, area);
}

fn draw_progress(frame: &mut Frame, info: &PlaybackInfo, area: Rect) {
    let label = match info.duration {
        Some(total) => format!("{} / {}", format_mmss(info.position), format_mmss(total)),
        None => format_mmss(info.position),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .ratio((info.percent / 100.0).clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" reprise ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app, ui_settings))
        .block(
            Block::bordered()
                .padding(Padding::left(1))
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    if app.show_lyrics {
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[2]);
        draw_queue(frame, app, main[0]);
        draw_lyrics(frame, app.playback(), main[1]);
    } else {
        draw_queue(frame, app, chunks[2]);
    }

    draw_progress(frame, app.playback(), chunks[3]);

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding::left(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
