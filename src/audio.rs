//! Audio plumbing between the game loop and the playback thread
//!
//! Decoding and mixing live elsewhere. This module only carries messages:
//! - sound effects go out through a bounded queue the game never waits on
//! - the moment a track really starts playing comes back as a beat anchor

use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TryRecvError, TrySendError};
use std::time::Instant;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Weapon discharge
    LaserFire,
    /// Laser ricochets off a wall
    LaserBounce,
    /// Laser lands on an enemy
    EnemyHit,
    /// Enemy health ran out
    EnemyDeath,
    /// Enemy touched the player
    PlayerHurt,
    /// Player health ran out
    PlayerDeath,
}

/// One queued effect with the volume it should play at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRequest {
    pub effect: SoundEffect,
    pub volume: f32,
}

/// Game-side handle for triggering sound effects
#[derive(Debug, Clone)]
pub struct SfxQueue {
    tx: SyncSender<SoundRequest>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

/// Audio-side end of the effect queue
#[derive(Debug)]
pub struct SfxReceiver {
    rx: Receiver<SoundRequest>,
}

/// Bounded effect queue holding at most `capacity` pending effects
pub fn sfx_queue(capacity: usize) -> (SfxQueue, SfxReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (
        SfxQueue {
            tx,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        },
        SfxReceiver { rx },
    )
}

impl SfxQueue {
    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all effects
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Queue an effect without blocking. Returns whether it was queued.
    pub fn play(&self, effect: SoundEffect) -> bool {
        let volume = self.effective_volume();
        if volume <= 0.0 {
            return false;
        }

        match self.tx.try_send(SoundRequest { effect, volume }) {
            Ok(()) => true,
            Err(TrySendError::Full(req)) => {
                log::debug!("sfx queue full, dropping {:?}", req.effect);
                false
            }
            Err(TrySendError::Disconnected(req)) => {
                log::debug!("audio thread gone, dropping {:?}", req.effect);
                false
            }
        }
    }
}

impl SfxReceiver {
    /// Everything queued so far
    pub fn drain(&self) -> Vec<SoundRequest> {
        self.rx.try_iter().collect()
    }

    /// Block for the next effect. `None` once every sender is gone.
    pub fn recv(&self) -> Option<SoundRequest> {
        self.rx.recv().ok()
    }
}

/// Sends the instant playback actually began
#[derive(Debug, Clone)]
pub struct AnchorSender {
    tx: Sender<Instant>,
}

/// Receives playback start instants
#[derive(Debug)]
pub struct AnchorReceiver {
    rx: Receiver<Instant>,
}

pub fn anchor_channel() -> (AnchorSender, AnchorReceiver) {
    let (tx, rx) = mpsc::channel();
    (AnchorSender { tx }, AnchorReceiver { rx })
}

impl AnchorSender {
    /// Call from the playback thread once output has started (and again on
    /// every loop restart). Returns false if the game side is gone.
    pub fn notify_started(&self, at: Instant) -> bool {
        self.tx.send(at).is_ok()
    }
}

impl AnchorReceiver {
    /// Newest start instant received since the last call
    pub fn latest(&self) -> Option<Instant> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(at) => latest = Some(at),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        latest
    }
}

/// A music track and its tempo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub name: &'static str,
    /// Asset path, resolved by the playback side
    pub path: &'static str,
    pub bpm: f64,
    /// Extra plays after the first; negative loops forever
    pub loops: i32,
}

pub const ACID_JAZZ: Track = Track {
    name: "acid-jazz",
    path: "audio/tracks/Kevin_MacLeod_-_AcidJazz.mp3",
    bpm: 110.724,
    loops: -1,
};

pub const BACKED_VIBES: Track = Track {
    name: "backed-vibes",
    path: "audio/tracks/Kevin_MacLeod_Backed_Vibes_Clean.mp3",
    bpm: 102.230,
    loops: -1,
};

pub const NIGHT_ON_THE_DOCKS: Track = Track {
    name: "night-on-the-docks",
    path: "audio/tracks/Kevin_MacLeod_-_Night_on_the_Docks_-_Sax.mp3",
    bpm: 139.658,
    loops: -1,
};

pub const TRACKS: [Track; 3] = [ACID_JAZZ, BACKED_VIBES, NIGHT_ON_THE_DOCKS];

impl Track {
    pub fn by_name(name: &str) -> Option<Track> {
        let name = name.to_lowercase();
        TRACKS.into_iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let (sfx, rx) = sfx_queue(2);
        assert!(sfx.play(SoundEffect::LaserFire));
        assert!(sfx.play(SoundEffect::EnemyHit));
        assert!(!sfx.play(SoundEffect::EnemyDeath));

        let queued = rx.drain();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].effect, SoundEffect::LaserFire);
        assert!((queued[0].volume - 0.8).abs() < 1e-6);

        // Room again once drained
        assert!(sfx.play(SoundEffect::EnemyDeath));
    }

    #[test]
    fn test_muted_and_disconnected() {
        let (mut sfx, rx) = sfx_queue(4);
        sfx.set_muted(true);
        assert!(!sfx.play(SoundEffect::LaserFire));
        sfx.set_muted(false);

        drop(rx);
        assert!(!sfx.play(SoundEffect::LaserFire));
    }

    #[test]
    fn test_recv_ends_when_game_side_drops() {
        let (sfx, rx) = sfx_queue(4);
        sfx.play(SoundEffect::PlayerHurt);
        drop(sfx);
        assert_eq!(rx.recv().map(|r| r.effect), Some(SoundEffect::PlayerHurt));
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn test_anchor_latest_wins() {
        let (tx, rx) = anchor_channel();
        assert_eq!(rx.latest(), None);

        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(3);
        tx.notify_started(t0);
        tx.notify_started(t1);
        assert_eq!(rx.latest(), Some(t1));
        assert_eq!(rx.latest(), None);
    }

    #[test]
    fn test_track_lookup() {
        assert_eq!(Track::by_name("Acid-Jazz"), Some(ACID_JAZZ));
        assert_eq!(Track::by_name("night-on-the-docks").map(|t| t.bpm), Some(139.658));
        assert!(Track::by_name("silence").is_none());
    }
}
