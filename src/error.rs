//! Error types for the overlay core

/// Precondition violations raised by the core transforms.
///
/// An unavailable camera projection is not represented here: the glow
/// falls back to a fixed radius instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OverlayError {
    /// A camera delta was requested before an initial observation was stored.
    #[error("camera baseline has not been seeded")]
    BaselineNotSeeded,

    /// A surface with a zero dimension was handed to a position update.
    #[error("viewport has zero area ({width}x{height})")]
    EmptyViewport { width: u32, height: u32 },
}
