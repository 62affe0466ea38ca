//! Particle state and packed draw data

/// Opacity below which a particle with no live target counts as dead
pub const DEAD_ALPHA: f32 = 0.01;

/// One swarm particle. Positions are screen pixels; targets are normalized
/// (u, v) so the live layout box can move under the swarm between frames.
/// Colors are kept as floats for smooth interpolation.
#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    /// Current opacity in [0, 1]
    pub a: f32,
    pub target_u: f32,
    pub target_v: f32,
    pub target_r: f32,
    pub target_g: f32,
    pub target_b: f32,
    /// 1 while the particle has a live target, 0 once retiring
    pub target_a: f32,
    pub vx: f32,
    pub vy: f32,
    /// Velocity retention per frame, in (0, 1)
    pub friction: f32,
    /// Spring coefficient toward the target
    pub ease: f32,
    /// Draw radius while in transit; reverts to the base radius on arrival
    pub radius_var: f32,
    /// True from reconciliation until the particle settles on its target
    pub moving: bool,
}

impl Particle {
    /// A particle is dead once it has faded out with no live target.
    /// Dead particles are reclaimed by the next compaction pass.
    pub fn is_alive(&self) -> bool {
        self.a >= DEAD_ALPHA || self.target_a > 0.0
    }
}

/// Packed draw data for one visible particle, consumed by the painter
#[derive(Clone, Copy, Debug)]
pub struct DotInstance {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}
