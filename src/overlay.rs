//! Overlay session
//!
//! Owns everything attached to one map view: the star field and its
//! twinkle tasks, the rolling camera baseline, the glow circle and the
//! visual config. Host events are applied one at a time through
//! [`OverlaySession::handle`].

use crate::camera::{CameraDelta, CameraDeltaTracker, CameraObservation, CameraSource, Projection};
use crate::config::{ConfigChanges, VisualConfig, VisualConfigUpdate};
use crate::error::OverlayError;
use crate::glow::{GlowState, gradient};
use crate::renderer::{GlowCircle, RenderSink, StarSprite};
use crate::starfield::{MotionFactors, StarField};
use crate::twinkle::TwinkleScheduler;
use log::{debug, info, warn};
use serde::Deserialize;
use std::io;
use tokio::time::Instant;

/// Pixel size of a host surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Events delivered by the host, in order
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The camera moved
    Move {
        observation: CameraObservation,
        projection: Option<Projection>,
    },
    /// Zoom changed; only the glow needs resizing
    Zoom { projection: Option<Projection> },
    /// The map settled
    Idle { projection: Option<Projection> },
    /// Map style finished loading
    StyleLoaded { projection: Option<Projection> },
    /// Surfaces changed size; the star field is rebuilt
    Resize {
        stars: Viewport,
        glow: Viewport,
        projection: Option<Projection>,
    },
    /// Visual parameters changed
    Configure(VisualConfigUpdate),
}

pub struct OverlaySession {
    config: VisualConfig,
    factors: MotionFactors,
    glow_viewport: Viewport,
    field: StarField,
    twinkle: TwinkleScheduler,
    tracker: CameraDeltaTracker,
    glow: GlowState,
    gradient_dirty: bool,
}

impl OverlaySession {
    /// Build the star field and glow for a map and seed the camera baseline.
    ///
    /// Must be called from within a tokio runtime (twinkle tasks are spawned).
    pub fn attach<C: CameraSource>(
        camera: &C,
        config: VisualConfig,
        factors: MotionFactors,
        stars: Viewport,
        glow: Viewport,
    ) -> Self {
        let field = StarField::new(config.star_count, stars.width, stars.height);
        let twinkle = TwinkleScheduler::start(&field.opacities());
        let projection = camera.projection();
        let glow_state = GlowState::new(
            glow.width,
            glow.height,
            projection.as_ref(),
            config.glow_intensity,
        );

        let mut tracker = CameraDeltaTracker::new();
        tracker.seed(camera.observation());

        info!(
            "Overlay attached: {} stars on {}x{}, glow {}x{} r={}",
            field.len(),
            stars.width,
            stars.height,
            glow.width,
            glow.height,
            glow_state.radius
        );

        Self {
            config,
            factors,
            glow_viewport: glow,
            field,
            twinkle,
            tracker,
            glow: glow_state,
            gradient_dirty: true,
        }
    }

    /// Apply one host event
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::Move {
                observation,
                projection,
            } => {
                if let Err(e) = self.on_move(observation, projection.as_ref()) {
                    warn!("Skipping star update: {}", e);
                }
            }
            HostEvent::Zoom { projection }
            | HostEvent::Idle { projection }
            | HostEvent::StyleLoaded { projection } => {
                self.refresh_glow(projection.as_ref());
            }
            HostEvent::Resize {
                stars,
                glow,
                projection,
            } => {
                self.regenerate(stars, glow, projection.as_ref());
            }
            HostEvent::Configure(update) => {
                self.update_config(update);
            }
        }
    }

    /// Shift the stars by the camera motion since the last event and resize the glow.
    ///
    /// The baseline advances even if the star surface is empty.
    pub fn on_move(
        &mut self,
        observation: CameraObservation,
        projection: Option<&Projection>,
    ) -> Result<CameraDelta, OverlayError> {
        let delta = self.tracker.observe(observation)?;
        self.refresh_glow(projection);
        self.field.apply(&delta, &self.factors)?;
        Ok(delta)
    }

    /// Recenter and resize the glow from the current projection
    pub fn refresh_glow(&mut self, projection: Option<&Projection>) {
        self.glow.refresh(
            self.glow_viewport.width,
            self.glow_viewport.height,
            projection,
        );
    }

    /// Replace the star field and glow for new surface sizes.
    ///
    /// Prior twinkle tasks are cancelled before the new ones start.
    pub fn regenerate(&mut self, stars: Viewport, glow: Viewport, projection: Option<&Projection>) {
        self.twinkle.cancel();

        self.field = StarField::new(self.config.star_count, stars.width, stars.height);
        self.twinkle = TwinkleScheduler::start(&self.field.opacities());
        self.glow_viewport = glow;
        self.glow = GlowState::new(glow.width, glow.height, projection, self.config.glow_intensity);
        self.refresh_glow(projection);
        self.gradient_dirty = true;

        info!(
            "Regenerated {} stars on {}x{}",
            self.field.len(),
            stars.width,
            stars.height
        );
    }

    /// Merge a partial config update and apply its live effects
    pub fn update_config(&mut self, update: VisualConfigUpdate) -> ConfigChanges {
        let changes = self.config.update(update);

        if changes.glow_intensity {
            self.glow.opacity = self.config.glow_intensity;
        }
        if changes.color_stops {
            self.gradient_dirty = true;
        }
        if changes.star_count {
            debug!(
                "Star count set to {}, applied on next regeneration",
                self.config.star_count
            );
        }

        changes
    }

    /// Push the current visual state into a sink
    pub fn render<S: RenderSink + ?Sized>(&mut self, sink: &mut S, now: Instant) -> io::Result<()> {
        self.twinkle.sample(now, self.field.stars_mut());

        sink.begin_frame()?;
        if self.gradient_dirty {
            sink.gradient(&gradient(&self.config.color_stops))?;
            self.gradient_dirty = false;
        }
        for star in self.field.stars() {
            sink.star(&StarSprite::from(star))?;
        }
        sink.glow(&GlowCircle::from(&self.glow))?;
        sink.end_frame()
    }

    pub fn config(&self) -> &VisualConfig {
        &self.config
    }

    pub fn field(&self) -> &StarField {
        &self.field
    }

    pub fn glow(&self) -> &GlowState {
        &self.glow
    }

    pub fn twinkle(&self) -> &TwinkleScheduler {
        &self.twinkle
    }

    pub fn baseline(&self) -> Option<&CameraObservation> {
        self.tracker.baseline()
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        self.twinkle.cancel();
        debug!("Overlay detached");
    }
}
