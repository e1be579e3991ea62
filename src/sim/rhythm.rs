//! Beat window detection and the score multiplier
//!
//! The beat grid is anchored to the instant the music actually started
//! playing (plus a small output-latency offset). Each frame the keeper works
//! out whether "now" sits close enough to a beat boundary; each shot is then
//! scored against that window.
//!
//! Multiplier rules:
//! - on-beat shot: counter +1, at 8 the multiplier goes up and the counter
//!   restarts at 0
//! - off-beat shot: counter -2, at 0 or below the multiplier goes down and
//!   the counter restarts at 8
//! - the multiplier always stays within 1..=8

use std::fmt;
use std::time::{Duration, Instant};

use crate::audio::{AnchorReceiver, Track};

pub const MIN_MULTIPLIER: u8 = 1;
pub const MAX_MULTIPLIER: u8 = 8;
/// On-beat shots needed per multiplier step
pub const INCREMENT_THRESHOLD: i32 = 8;
/// Counter penalty for an off-beat shot
pub const OFF_BEAT_PENALTY: i32 = 2;

const NANOS_PER_MINUTE: f64 = 60_000_000_000.0;

/// Display colours for multipliers 1 through 8
pub const MULTIPLIER_PALETTE: [[u8; 3]; 8] = [
    [0, 255, 255],   // aqua
    [0, 0, 255],     // blue
    [138, 43, 226],  // blue violet
    [128, 0, 128],   // purple
    [255, 20, 147],  // deep pink
    [255, 127, 80],  // coral
    [255, 69, 0],    // orange red
    [255, 0, 0],     // red
];

/// Rejected rhythm configuration
#[derive(Debug, Clone, PartialEq)]
pub enum RhythmError {
    /// Tempo must be a finite, positive number of beats per minute
    InvalidTempo(f64),
}

impl fmt::Display for RhythmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RhythmError::InvalidTempo(bpm) => write!(f, "invalid tempo: {bpm} bpm"),
        }
    }
}

impl std::error::Error for RhythmError {}

/// Fixed-tempo beat grid with an asymmetric tolerance window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatClock {
    bpm: f64,
    period_ns: i128,
    early_ns: i128,
    late_ns: i128,
}

impl BeatClock {
    /// `early` is how long after a beat still counts, `late` how long before
    /// the next beat already counts.
    pub fn new(bpm: f64, early: Duration, late: Duration) -> Result<Self, RhythmError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(RhythmError::InvalidTempo(bpm));
        }
        let period_ns = (NANOS_PER_MINUTE / bpm) as i128;
        if period_ns < 1 {
            return Err(RhythmError::InvalidTempo(bpm));
        }

        let early_ns = early.as_nanos() as i128;
        let late_ns = late.as_nanos() as i128;
        if early_ns + late_ns >= period_ns {
            log::warn!(
                "beat tolerances ({early:?} + {late:?}) cover the whole {bpm} bpm period; \
                 every shot is on beat"
            );
        }

        Ok(Self {
            bpm,
            period_ns,
            early_ns,
            late_ns,
        })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn period(&self) -> Duration {
        Duration::from_nanos(self.period_ns as u64)
    }

    /// Position within the current beat, in `[0, period)`
    pub fn phase(&self, elapsed_ns: i128) -> i128 {
        elapsed_ns.rem_euclid(self.period_ns)
    }

    /// Whether a moment `elapsed_ns` after the anchor is near a beat
    pub fn in_window(&self, elapsed_ns: i128) -> bool {
        let phase = self.phase(elapsed_ns);
        phase <= self.early_ns || phase >= self.period_ns - self.late_ns
    }

    /// Same tolerances at a different tempo
    pub fn with_bpm(&self, bpm: f64) -> Result<Self, RhythmError> {
        Self::new(
            bpm,
            Duration::from_nanos(self.early_ns as u64),
            Duration::from_nanos(self.late_ns as u64),
        )
    }

    pub fn in_window_at(&self, anchor: Instant, now: Instant) -> bool {
        self.in_window(signed_nanos_between(anchor, now))
    }
}

/// `now - anchor` in nanoseconds, negative when `now` is earlier
fn signed_nanos_between(anchor: Instant, now: Instant) -> i128 {
    match now.checked_duration_since(anchor) {
        Some(d) => d.as_nanos() as i128,
        None => -(anchor.duration_since(now).as_nanos() as i128),
    }
}

/// Running score plus the beat-synced multiplier
#[derive(Debug)]
pub struct ScoreKeeper {
    score: f64,
    multiplier: u8,
    increment: i32,
    clock: BeatClock,
    latency_offset: Duration,
    anchor: Option<Instant>,
    anchor_rx: Option<AnchorReceiver>,
    time_window: bool,
    on_beat: bool,
}

impl ScoreKeeper {
    pub fn new(clock: BeatClock, latency_offset: Duration) -> Self {
        Self {
            score: 0.0,
            multiplier: MIN_MULTIPLIER,
            increment: 0,
            clock,
            latency_offset,
            anchor: None,
            anchor_rx: None,
            time_window: false,
            on_beat: false,
        }
    }

    /// Listen for playback-start notifications from the audio side
    pub fn attach_anchor(&mut self, rx: AnchorReceiver) {
        self.anchor_rx = Some(rx);
    }

    /// Playback began at `started`; beats are counted from there
    pub fn set_anchor(&mut self, started: Instant) {
        self.anchor = Some(started + self.latency_offset);
        log::info!("beat anchor set ({} bpm)", self.clock.bpm());
    }

    /// Pick up the newest start notification, if any arrived
    pub fn poll_anchor(&mut self) {
        let latest = self.anchor_rx.as_ref().and_then(|rx| rx.latest());
        if let Some(started) = latest {
            self.set_anchor(started);
        }
    }

    /// Per-frame: refresh the anchor and recompute the beat window
    pub fn update(&mut self, now: Instant) {
        self.poll_anchor();
        self.time_window = self
            .anchor
            .is_some_and(|anchor| self.clock.in_window_at(anchor, now));
    }

    /// Score a shot against the current window. Returns whether it was on beat.
    ///
    /// Shots before the music has started are not scored.
    pub fn register_fire(&mut self) -> bool {
        if self.anchor.is_none() {
            self.on_beat = false;
            return false;
        }

        if self.time_window {
            self.on_beat = true;
            self.increment += 1;

            if self.increment >= INCREMENT_THRESHOLD {
                self.multiplier = (self.multiplier + 1).min(MAX_MULTIPLIER);
                self.increment = 0;
            }
        } else {
            self.on_beat = false;
            self.increment -= OFF_BEAT_PENALTY;

            if self.increment <= 0 {
                self.multiplier = self.multiplier.saturating_sub(1).max(MIN_MULTIPLIER);
                self.increment = INCREMENT_THRESHOLD;
            }
        }

        self.on_beat
    }

    pub fn increment_score(&mut self, by: f64) {
        self.score += by;
    }

    /// Force the multiplier. Values below the floor are ignored.
    pub fn set_multiplier(&mut self, multiplier: u8) {
        if multiplier < MIN_MULTIPLIER {
            return;
        }
        self.multiplier = multiplier.min(MAX_MULTIPLIER);
    }

    /// Back to a fresh session on the same track
    pub fn reset(&mut self) {
        self.reset_run();
        self.anchor = None;
        self.time_window = false;
    }

    /// New run while the music keeps playing: the beat grid survives
    pub fn reset_run(&mut self) {
        self.score = 0.0;
        self.multiplier = MIN_MULTIPLIER;
        self.increment = 0;
        self.on_beat = false;
    }

    /// Switch tempo; the grid waits for the new track's start notification
    pub fn change_track(&mut self, track: &Track) -> Result<(), RhythmError> {
        self.clock = self.clock.with_bpm(track.bpm)?;
        self.anchor = None;
        self.time_window = false;
        log::info!("track changed to {} ({} bpm)", track.name, track.bpm);
        Ok(())
    }

    /// Palette index for the current multiplier
    pub fn band(&self) -> usize {
        (self.multiplier - MIN_MULTIPLIER) as usize
    }

    pub fn color(&self) -> [u8; 3] {
        MULTIPLIER_PALETTE[self.band()]
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn multiplier(&self) -> u8 {
        self.multiplier
    }

    pub fn increment(&self) -> i32 {
        self.increment
    }

    pub fn in_window(&self) -> bool {
        self.time_window
    }

    pub fn on_beat(&self) -> bool {
        self.on_beat
    }

    pub fn has_anchor(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }
}
