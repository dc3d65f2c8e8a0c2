//! Camera-synchronized star field and atmospheric glow for globe map views
//!
//! The crate computes visual state only: star positions, twinkle opacity
//! and glow geometry. Drawing is delegated to a [`renderer::RenderSink`]
//! and camera access to a [`camera::CameraSource`].

pub mod camera;
pub mod color;
pub mod config;
pub mod demo;
pub mod error;
pub mod glow;
pub mod overlay;
pub mod renderer;
pub mod starfield;
pub mod twinkle;
