//! Scripted host for the preview
//!
//! Stands in for a map widget: a camera that slowly spins the globe and a
//! feed loop that turns its motion into host events at a fixed rate.

use crate::camera::{CameraSource, LngLat, Projection};
use crate::config::{DemoConfig, ViewportConfig, VisualConfigUpdate};
use crate::overlay::HostEvent;
use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::{self, Duration};

/// Camera following a fixed path as a function of elapsed time
#[derive(Debug, Clone)]
pub struct ScriptedCamera {
    path: DemoConfig,
    elapsed: f64,
}

impl ScriptedCamera {
    pub fn new(path: DemoConfig) -> Self {
        Self { path, elapsed: 0.0 }
    }

    /// Move along the path by `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        self.elapsed += dt;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// Wrap degrees into [-180, 180), the way map widgets report bearing and longitude
pub fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

impl CameraSource for ScriptedCamera {
    fn bearing(&self) -> f64 {
        wrap_degrees(self.path.bearing_rate * self.elapsed)
    }

    fn pitch(&self) -> f64 {
        self.path.pitch_amplitude * (1.0 - (self.elapsed * 0.5).cos()) / 2.0
    }

    fn center(&self) -> LngLat {
        LngLat {
            lng: wrap_degrees(self.path.lng_rate * self.elapsed),
            lat: self.path.lat,
        }
    }

    fn projection(&self) -> Option<Projection> {
        if self.path.world_size <= 0.0 {
            return None;
        }
        let zoom = 1.0 + self.path.zoom_wobble * (self.elapsed * 0.3).sin();
        Some(Projection {
            world_size: self.path.world_size * zoom,
            center_lat: self.path.lat,
        })
    }
}

/// Drive the camera along its path and emit host events until the receiver goes away.
///
/// A style-loaded signal goes out first. Every tick then sends a move (plus
/// a zoom while the path wobbles); once per second an idle refresh follows,
/// and the optional glow pulse and periodic regeneration are layered on top.
pub async fn run_feed(
    mut camera: ScriptedCamera,
    viewport: ViewportConfig,
    base_intensity: f32,
    rate: u32,
    tx: mpsc::Sender<HostEvent>,
) {
    let rate = rate.max(1);
    let dt = 1.0 / rate as f64;
    let pulse = camera.path.glow_pulse;
    let regenerate_every = camera.path.regenerate_secs;

    info!(
        "Camera feed started: {} Hz, bearing {}°/s, lng {}°/s",
        rate, camera.path.bearing_rate, camera.path.lng_rate
    );

    if tx
        .send(HostEvent::StyleLoaded {
            projection: camera.projection(),
        })
        .await
        .is_err()
    {
        return;
    }

    let mut interval = time::interval(Duration::from_secs_f64(dt));
    let mut tick: u64 = 0;

    loop {
        interval.tick().await;
        camera.advance(dt);
        tick += 1;

        let mut events = vec![HostEvent::Move {
            observation: camera.observation(),
            projection: camera.projection(),
        }];
        if camera.path.zoom_wobble != 0.0 {
            events.push(HostEvent::Zoom {
                projection: camera.projection(),
            });
        }

        if tick % rate as u64 == 0 {
            let second = tick / rate as u64;
            debug!("Camera at t={:.1}s bearing={:.1}", camera.elapsed(), camera.bearing());

            events.push(HostEvent::Idle {
                projection: camera.projection(),
            });

            if pulse > 0.0 {
                let phase = (camera.elapsed() * 0.5).sin() as f32;
                let intensity = (base_intensity * (1.0 - pulse * (1.0 - phase) / 2.0)).clamp(0.0, 1.0);
                events.push(HostEvent::Configure(VisualConfigUpdate {
                    glow_intensity: Some(intensity),
                    ..Default::default()
                }));
            }

            if regenerate_every > 0 && second % regenerate_every == 0 {
                events.push(HostEvent::Resize {
                    stars: viewport.stars,
                    glow: viewport.glow,
                    projection: camera.projection(),
                });
            }
        }

        for event in events {
            if tx.send(event).await.is_err() {
                debug!("Event receiver closed, stopping camera feed");
                return;
            }
        }
    }
}
