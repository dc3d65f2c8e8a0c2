//! Camera observations and incremental deltas
//!
//! The overlay never reprojects geometry; it only needs to know how much
//! the camera moved since the previous motion event.

use crate::error::OverlayError;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// Snapshot of the camera taken on a motion event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraObservation {
    /// Degrees
    pub bearing: f64,
    /// Degrees
    pub pitch: f64,
    pub center: LngLat,
}

/// Projective state of the map transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// World size in pixels at the current zoom
    pub world_size: f64,
    /// Latitude of the transform center in degrees
    pub center_lat: f64,
}

/// Difference between two consecutive observations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraDelta {
    pub bearing: f64,
    pub pitch: f64,
    pub lng: f64,
}

/// Read access to the live camera of a map view
pub trait CameraSource {
    fn bearing(&self) -> f64;

    fn pitch(&self) -> f64;

    fn center(&self) -> LngLat;

    /// Current projective state, `None` while the transform is unavailable
    fn projection(&self) -> Option<Projection>;

    fn observation(&self) -> CameraObservation {
        CameraObservation {
            bearing: self.bearing(),
            pitch: self.pitch(),
            center: self.center(),
        }
    }
}

/// Converts absolute observations into deltas against a rolling baseline.
///
/// Differences are taken as-is: a bearing crossing +/-180 degrees shows up
/// as a jump of almost a full turn.
#[derive(Debug, Default)]
pub struct CameraDeltaTracker {
    baseline: Option<CameraObservation>,
}

impl CameraDeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the attach-time observation
    pub fn seed(&mut self, observation: CameraObservation) {
        self.baseline = Some(observation);
    }

    /// Delta from the stored baseline to `current`; `current` becomes the new baseline
    pub fn observe(&mut self, current: CameraObservation) -> Result<CameraDelta, OverlayError> {
        let last = self.baseline.ok_or(OverlayError::BaselineNotSeeded)?;
        let delta = CameraDelta {
            bearing: current.bearing - last.bearing,
            pitch: current.pitch - last.pitch,
            lng: current.center.lng - last.center.lng,
        };
        self.baseline = Some(current);
        Ok(delta)
    }

    pub fn baseline(&self) -> Option<&CameraObservation> {
        self.baseline.as_ref()
    }
}
