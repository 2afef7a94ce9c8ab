use std::path::Path;

use tracing::{info, warn};

use crate::audio::{AudioCmd, AudioPlayer};
use crate::config;
use crate::error::Result;
use crate::library::{TrackRef, scan};
use crate::persist::{PersistedQueues, PersistedSession, StateStore};

/// Name of the queue built from a scanned directory.
pub fn queue_name(dir: &Path) -> String {
    format!("Folder:{}", dir.display())
}

/// Commands that put the freshly scanned library into the engine.
///
/// A saved session is restored only when it belongs to the same queue. The
/// scanned tracks are sent afterwards; the engine ignores them when the
/// saved queue already has the same name and length.
pub fn initial_commands(
    name: &str,
    tracks: Vec<TrackRef>,
    settings: &config::Settings,
    saved: Option<(PersistedQueues, PersistedSession)>,
) -> Vec<AudioCmd> {
    let mut cmds = Vec::new();

    let restorable = saved.filter(|(queues, _)| queues.name == name && !queues.main.is_empty());
    let restored = restorable.is_some();
    if let Some((queues, session)) = restorable {
        info!(name, len = queues.main.len(), "restoring saved session");
        cmds.push(AudioCmd::Restore { queues, session });
    }

    let name = name.to_string();
    if settings.playback.shuffle && !restored {
        cmds.push(AudioCmd::SetShuffledQueue { name, tracks });
    } else {
        cmds.push(AudioCmd::SetQueue { name, tracks });
    }
    cmds
}

/// Scan `dir` and hand the result (plus any saved session) to the player.
pub fn load_library(
    dir: &Path,
    settings: &config::Settings,
    player: &AudioPlayer,
    store: Option<&dyn StateStore>,
) -> Result<()> {
    let tracks = scan(dir, &settings.library);
    if tracks.is_empty() {
        warn!(dir = %dir.display(), "no playable files found");
    }

    let saved = store
        .filter(|_| settings.playback.restore_session)
        .map(|s| s.load_or_default());

    for cmd in initial_commands(&queue_name(dir), tracks, settings, saved) {
        player.send(cmd)?;
    }
    Ok(())
}
