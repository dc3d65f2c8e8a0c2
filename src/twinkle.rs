//! Per-star opacity oscillation
//!
//! Every star gets its own tokio task that keeps picking a new opacity
//! target and a new duration, forever, until the scheduler is cancelled.
//! Tasks only record the current transition in a shared table; the actual
//! opacity is interpolated when the field is sampled for a frame.

use crate::starfield::Star;
use log::debug;
use rand::Rng;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

const BASE_MS: f64 = 1000.0;
const STAGGER_MS: f64 = 500.0;
const STAGGER_SLOTS: usize = 5;
const JITTER_MS: f64 = 2000.0;
const MIN_TARGET: f32 = 0.4;
const MAX_TARGET: f32 = 1.0;

/// Whether a star is currently moving toward a target opacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwinklePhase {
    Idle,
    Animating,
}

/// One opacity transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twinkle {
    pub from: f32,
    pub to: f32,
    pub started: Instant,
    pub duration: Duration,
}

impl Twinkle {
    /// A transition that has already settled on `opacity`
    pub fn settled(opacity: f32, now: Instant) -> Self {
        Self {
            from: opacity,
            to: opacity,
            started: now,
            duration: Duration::ZERO,
        }
    }

    /// Linear progress in [0, 1]
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn opacity_at(&self, now: Instant) -> f32 {
        let t = self.progress(now);
        if t >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * ease_cubic_in_out(t)
    }

    pub fn phase(&self, now: Instant) -> TwinklePhase {
        if self.progress(now) < 1.0 {
            TwinklePhase::Animating
        } else {
            TwinklePhase::Idle
        }
    }
}

/// Symmetric cubic easing, slow at both ends
pub fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// Duration of the first transition for the star at `index`, staggered in five groups
pub fn first_duration<R: Rng>(rng: &mut R, index: usize) -> Duration {
    let stagger = (index % STAGGER_SLOTS) as f64 * STAGGER_MS;
    millis(BASE_MS + stagger + rng.random_range(0.0..JITTER_MS))
}

/// Duration of every transition after the first
pub fn next_duration<R: Rng>(rng: &mut R) -> Duration {
    millis(BASE_MS + rng.random_range(0.0..JITTER_MS))
}

pub fn next_target<R: Rng>(rng: &mut R) -> f32 {
    rng.random_range(MIN_TARGET..MAX_TARGET)
}

fn millis(ms: f64) -> Duration {
    Duration::from_secs_f64(ms / 1000.0)
}

type TwinkleTable = Arc<Mutex<Vec<Twinkle>>>;

/// Owns the twinkle tasks of one star field
///
/// Must be started from within a tokio runtime. Cancelling (or dropping)
/// the scheduler stops every task at its next timer boundary.
pub struct TwinkleScheduler {
    table: TwinkleTable,
    cancel: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl TwinkleScheduler {
    /// Spawn one task per star, starting from the given opacities
    pub fn start(initial: &[f32]) -> Self {
        let now = Instant::now();
        let table: TwinkleTable = Arc::new(Mutex::new(
            initial.iter().map(|&o| Twinkle::settled(o, now)).collect(),
        ));
        let (cancel, _) = watch::channel(false);

        let tasks = (0..initial.len())
            .map(|index| {
                let table = Arc::clone(&table);
                let token = cancel.subscribe();
                tokio::spawn(run_star(index, table, token))
            })
            .collect();

        debug!("Started twinkle tasks for {} stars", initial.len());

        Self {
            table,
            cancel,
            tasks,
        }
    }

    /// Stop every task; the table keeps its last transitions
    pub fn cancel(&self) {
        if !*self.cancel.borrow() {
            debug!("Cancelling {} twinkle tasks", self.tasks.len());
        }
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Number of tasks that have not exited yet
    pub fn active_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Current transition of the star at `index`
    pub fn twinkle(&self, index: usize) -> Option<Twinkle> {
        self.table.lock().ok()?.get(index).copied()
    }

    /// Write the opacity at `now` into each star, in paint order
    pub fn sample(&self, now: Instant, stars: &mut [Star]) {
        let Ok(table) = self.table.lock() else {
            return;
        };
        for (star, twinkle) in stars.iter_mut().zip(table.iter()) {
            star.opacity = twinkle.opacity_at(now);
        }
    }
}

impl Drop for TwinkleScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_star(index: usize, table: TwinkleTable, mut token: watch::Receiver<bool>) {
    let mut duration = first_duration(&mut rand::rng(), index);

    loop {
        if *token.borrow() {
            break;
        }

        let now = Instant::now();
        let to = next_target(&mut rand::rng());
        {
            let Ok(mut table) = table.lock() else {
                break;
            };
            let Some(slot) = table.get_mut(index) else {
                break;
            };
            let from = slot.opacity_at(now);
            *slot = Twinkle {
                from,
                to,
                started: now,
                duration,
            };
        }

        tokio::select! {
            _ = tokio::time::sleep_until(now + duration) => {}
            // Sender dropped or flipped: either way this star is done
            _ = token.changed() => break,
        }

        duration = next_duration(&mut rand::rng());
    }
}
