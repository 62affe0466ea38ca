//! Events surfaced to the embedder, drained once per frame.

/// Notifications emitted by the engine. Each completed transition produces
/// exactly one `ImageReady`, whether the swarm reconciled or the fallback
/// view engaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ImageReady {
        /// Source path or URL the transition targeted.
        source: String,
        /// Number of points the swarm now aims at (0 in fallback).
        points: usize,
        /// True when the image is shown as a bitmap or placeholder instead
        /// of particles.
        fallback: bool,
    },
}
