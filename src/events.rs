//! Player change notifications.
//!
//! The engine publishes a `PlayerEvent` for every observable change.
//! Subscribers pick the topics they care about and get their own channel.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crate::audio::{FailureAction, FailureKind, PlaybackState, RepeatMode};
use crate::library::{TrackRef, TrackSource};

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    TrackChanged {
        index: Option<usize>,
        track: Option<TrackRef>,
    },
    PositionChanged {
        position: Duration,
        percent: f64,
    },
    LyricChanged {
        index: Option<usize>,
        text: Option<String>,
    },
    QueueChanged {
        len: usize,
        shuffle: bool,
    },
    ModeChanged {
        repeat: RepeatMode,
        shuffle: bool,
    },
    VolumeChanged {
        volume: u8,
        muted: bool,
    },
    SpeedChanged(f32),
    TrackFailed {
        track: TrackSource,
        kind: FailureKind,
        action: FailureAction,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    State,
    Track,
    Position,
    Lyric,
    Queue,
    Mode,
    Volume,
    Speed,
    Failure,
}

impl Topic {
    pub const ALL: [Topic; 9] = [
        Topic::State,
        Topic::Track,
        Topic::Position,
        Topic::Lyric,
        Topic::Queue,
        Topic::Mode,
        Topic::Volume,
        Topic::Speed,
        Topic::Failure,
    ];
}

impl PlayerEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::StateChanged(_) => Topic::State,
            Self::TrackChanged { .. } => Topic::Track,
            Self::PositionChanged { .. } => Topic::Position,
            Self::LyricChanged { .. } => Topic::Lyric,
            Self::QueueChanged { .. } => Topic::Queue,
            Self::ModeChanged { .. } => Topic::Mode,
            Self::VolumeChanged { .. } => Topic::Volume,
            Self::SpeedChanged(_) => Topic::Speed,
            Self::TrackFailed { .. } => Topic::Failure,
        }
    }
}

struct Subscriber {
    topics: Vec<Topic>,
    tx: Sender<PlayerEvent>,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every future event whose topic is in `topics`.
    pub fn subscribe(&self, topics: &[Topic]) -> Receiver<PlayerEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(Subscriber {
                topics: topics.to_vec(),
                tx,
            });
        }
        rx
    }

    /// Deliver to interested subscribers, forgetting those whose receiver
    /// was dropped.
    pub fn publish(&self, event: PlayerEvent) {
        let topic = event.topic();
        let Ok(mut subs) = self.subscribers.lock() else {
            return;
        };
        subs.retain(|s| !s.topics.contains(&topic) || s.tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_only_receive_their_topics() {
        let bus = EventBus::new();
        let volume = bus.subscribe(&[Topic::Volume]);
        let all = bus.subscribe(&Topic::ALL);

        bus.publish(PlayerEvent::SpeedChanged(1.5));
        bus.publish(PlayerEvent::VolumeChanged {
            volume: 40,
            muted: false,
        });

        assert_eq!(
            volume.try_iter().collect::<Vec<_>>(),
            vec![PlayerEvent::VolumeChanged {
                volume: 40,
                muted: false
            }]
        );
        assert_eq!(all.try_iter().count(), 2);
    }

    #[test]
    fn dropped_receivers_are_pruned_on_publish() {
        let bus = EventBus::new();
        let keep = bus.subscribe(&[Topic::State]);
        drop(bus.subscribe(&[Topic::State]));
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(PlayerEvent::StateChanged(PlaybackState::Playing));
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(
            keep.recv().unwrap(),
            PlayerEvent::StateChanged(PlaybackState::Playing)
        );
    }
}
