//! Beat Phaser headless runner
//!
//! Plays the house level with a simple autopilot and logs what happens.
//! A background thread stands in for the audio backend: it reports when
//! the track started and consumes the sound effect queue.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use beat_phaser::audio::{AnchorSender, SfxReceiver, anchor_channel, sfx_queue};
use beat_phaser::consts::*;
use beat_phaser::settings::Settings;
use beat_phaser::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(author, version, about = "Beat Phaser headless runner", long_about = None)]
struct Args {
    // Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    // Write the effective settings to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    // Frames to simulate
    #[arg(short, long, default_value = "3600")]
    frames: u64,

    // Spawn seed (overrides the settings file)
    #[arg(short, long)]
    seed: Option<u64>,

    // Track name (overrides the settings file)
    #[arg(short, long)]
    track: Option<String>,

    // Pace frames against the wall clock instead of running flat out
    #[arg(long)]
    realtime: bool,
}

// ============================================================================
// Game loop
// ============================================================================

/// Game instance holding all state
struct Game {
    state: GameState,
    accumulator: f32,
    input: TickInput,
    /// Frames since the last shot
    cooldown: u32,
    /// Frames spent dead
    dead_frames: u32,
    kills: u32,
    shots_on_beat: u32,
    shots: u32,
}

impl Game {
    fn new(state: GameState) -> Self {
        Self {
            state,
            accumulator: 0.0,
            input: TickInput::default(),
            cooldown: 0,
            dead_frames: 0,
            kills: 0,
            shots_on_beat: 0,
            shots: 0,
        }
    }

    /// Advance by `dt` seconds of wall time in fixed steps
    fn update(&mut self, dt: f32, now: Instant) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.autopilot(substeps);
            let events = tick(&mut self.state, &self.input, now, SIM_DT);
            self.record(&events);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.fire = false;
            self.input.restart = false;
        }
    }

    /// Aim at the closest enemy, shoot when the window opens, dodge
    /// sideways, and restart shortly after dying.
    fn autopilot(&mut self, substep: u32) {
        if self.state.phase == GamePhase::Dead {
            self.dead_frames += 1;
            if self.dead_frames > 60 {
                self.input.restart = true;
                self.dead_frames = 0;
            }
            return;
        }

        let me = self.state.character_center();
        let target = self
            .state
            .enemy_centers()
            .min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)));

        self.cooldown = self.cooldown.saturating_add(1);
        if let Some(target) = target {
            self.input.aim_angle = beat_phaser::aim_angle(me, target);
            if substep == 0 && self.cooldown > 10 && self.state.score.in_window() {
                self.input.fire = true;
                self.cooldown = 0;
            }
        }

        let phase = (self.state.time_ticks / 90) % 4;
        self.input.movement = match phase {
            0 => glam::Vec2::new(0.0, 1.0),
            1 => glam::Vec2::new(-1.0, 0.0),
            2 => glam::Vec2::new(0.0, -1.0),
            _ => glam::Vec2::new(1.0, 0.0),
        };
    }

    fn record(&mut self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::LaserFired { on_beat, .. } => {
                    self.shots += 1;
                    if on_beat {
                        self.shots_on_beat += 1;
                    }
                }
                GameEvent::EnemyKilled { at, .. } => {
                    self.kills += 1;
                    log::info!("enemy down at ({:.0}, {:.0})", at.x, at.y);
                }
                GameEvent::PlayerHurt { health, .. } => {
                    log::debug!("player hurt, health {health}");
                }
                GameEvent::PlayerDied => {
                    log::info!("{}", self.state.death_message());
                }
                GameEvent::EnemyHit { .. } => {}
            }
        }
    }
}

// ============================================================================
// Stand-in audio backend
// ============================================================================

fn spawn_audio_thread(
    started: Instant,
    anchor: AnchorSender,
    sfx: SfxReceiver,
    music_volume: f32,
) -> Result<thread::JoinHandle<usize>> {
    thread::Builder::new()
        .name("audio".into())
        .spawn(move || {
            log::info!("music playing at volume {music_volume:.2}");
            anchor.notify_started(started);

            let mut played = 0;
            while let Some(request) = sfx.recv() {
                log::trace!("sfx {:?} at {:.2}", request.effect, request.volume);
                played += 1;
            }
            played
        })
        .context("failed to spawn audio thread")
}

/// Simulated clock reading after `frame` fixed steps
fn frame_instant(start: Instant, frame: u64) -> Instant {
    start + Duration::from_secs_f64(f64::from(SIM_DT) * frame as f64)
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(track) = &args.track {
        settings.track = track.clone();
    }
    settings.validate().context("invalid settings")?;

    if let Some(path) = &args.write_config {
        settings
            .save_to(path)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        return Ok(());
    }

    let track = settings.track()?;
    log::info!(
        "Beat Phaser starting: {} at {} bpm, seed {}",
        track.name,
        settings.bpm()?,
        settings.seed
    );

    let (mut sfx, sfx_rx) = sfx_queue(settings.sfx_queue_capacity.max(1));
    sfx.set_master_volume(settings.master_volume);
    sfx.set_sfx_volume(settings.sfx_volume);
    sfx.set_muted(settings.muted);

    let (anchor_tx, anchor_rx) = anchor_channel();
    let mut state = GameState::from_settings(&settings, sfx)?;
    state.score.attach_anchor(anchor_rx);

    let start = Instant::now();
    let audio = spawn_audio_thread(start, anchor_tx, sfx_rx, settings.music_volume)?;

    let mut game = Game::new(state);
    let frame = Duration::from_secs_f32(SIM_DT);
    let mut last = start;
    for i in 0..args.frames {
        let now = if args.realtime {
            thread::sleep(frame);
            Instant::now()
        } else {
            frame_instant(start, i + 1)
        };
        game.update((now - last).as_secs_f32(), now);
        last = now;
    }

    log::info!(
        "done after {} runs: score {:.0}, multiplier x{}, {} kills, {}/{} shots on beat",
        game.state.run,
        game.state.score.score(),
        game.state.score.multiplier(),
        game.kills,
        game.shots_on_beat,
        game.shots
    );

    // Closing the queue lets the audio thread finish
    drop(game);
    let played = audio
        .join()
        .map_err(|_| anyhow::anyhow!("audio thread panicked"))?;
    log::info!("{played} sound effects played");

    Ok(())
}
