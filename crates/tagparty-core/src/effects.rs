use serde::{Deserialize, Serialize};

use crate::mode_trait::{ModeEvent, PlayerId};

/// Status effects the host client knows how to apply to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    TaggedTime,
    JoinedTaggedTime,
    SetSlowedTime,
    UnTagged,
    FrozenTime,
}

/// Who hears a sound effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundTarget {
    Player(PlayerId),
    All,
}

/// A sound id and volume, as configured per mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub id: u32,
    pub volume: f32,
}

/// Feedback a mode asks the host to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectRequest {
    Status {
        effect: StatusEffect,
        target: PlayerId,
    },
    Sound {
        sound_id: u32,
        volume: f32,
        target: SoundTarget,
        stop_current: bool,
    },
}

impl EffectRequest {
    pub fn sound(cue: SoundCue, target: SoundTarget) -> Self {
        Self::Sound {
            sound_id: cue.id,
            volume: cue.volume,
            target,
            stop_current: false,
        }
    }
}

/// Host capability for delivering status and sound effects to peers.
pub trait EffectDispatcher: Send {
    fn send_status(&mut self, effect: StatusEffect, target: PlayerId);

    fn send_sound(&mut self, sound_id: u32, volume: f32, target: SoundTarget, stop_current: bool);
}

/// Route every effect in `events` through `dispatcher`. Returns how many were sent.
pub fn dispatch_events(events: &[ModeEvent], dispatcher: &mut dyn EffectDispatcher) -> usize {
    let mut sent = 0;
    for event in events {
        let ModeEvent::Effect(request) = event else {
            continue;
        };
        match *request {
            EffectRequest::Status { effect, target } => dispatcher.send_status(effect, target),
            EffectRequest::Sound {
                sound_id,
                volume,
                target,
                stop_current,
            } => dispatcher.send_sound(sound_id, volume, target, stop_current),
        }
        sent += 1;
    }
    sent
}

/// Dispatcher used when no host bridge is available: logs and does nothing else.
#[derive(Debug, Default)]
pub struct TracingDispatcher;

impl EffectDispatcher for TracingDispatcher {
    fn send_status(&mut self, effect: StatusEffect, target: PlayerId) {
        tracing::info!(?effect, target, "Status effect (no host bridge)");
    }

    fn send_sound(&mut self, sound_id: u32, volume: f32, target: SoundTarget, stop_current: bool) {
        tracing::info!(
            sound_id,
            volume,
            ?target,
            stop_current,
            "Sound effect (no host bridge)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        statuses: Vec<(StatusEffect, PlayerId)>,
        sounds: Vec<(u32, SoundTarget)>,
    }

    impl EffectDispatcher for Counting {
        fn send_status(&mut self, effect: StatusEffect, target: PlayerId) {
            self.statuses.push((effect, target));
        }

        fn send_sound(&mut self, sound_id: u32, _volume: f32, target: SoundTarget, _stop: bool) {
            self.sounds.push((sound_id, target));
        }
    }

    #[test]
    fn dispatch_routes_only_effect_events() {
        let events = vec![
            ModeEvent::RolesAssigned,
            ModeEvent::Effect(EffectRequest::Status {
                effect: StatusEffect::SetSlowedTime,
                target: 4,
            }),
            ModeEvent::TagAccepted {
                tagger: 1,
                tagged: 2,
            },
            ModeEvent::Effect(EffectRequest::sound(
                SoundCue { id: 9, volume: 0.5 },
                SoundTarget::All,
            )),
        ];
        let mut d = Counting::default();
        assert_eq!(dispatch_events(&events, &mut d), 2);
        assert_eq!(d.statuses, vec![(StatusEffect::SetSlowedTime, 4)]);
        assert_eq!(d.sounds, vec![(9, SoundTarget::All)]);
    }

    #[test]
    fn tracing_dispatcher_accepts_everything() {
        let mut d = TracingDispatcher;
        d.send_status(StatusEffect::FrozenTime, 1);
        d.send_sound(3, 1.0, SoundTarget::Player(1), true);
    }
}
