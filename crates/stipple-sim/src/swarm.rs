//! The particle swarm: index-paired reconciliation and the per-frame integrator

use crate::curves::lerp_f32;
use crate::particle::{DotInstance, Particle};
use crate::rand::SwarmRng;
use crate::tuning::Tuning;
use stipple_core::{Rect, SamplePoint, Vec2};

/// How hard color and opacity chase their targets each frame
const COLOR_LERP: f32 = 0.25;
const ALPHA_LERP: f32 = 0.2;

/// Particles fainter than this are integrated but not drawn
pub const DRAW_ALPHA: f32 = 0.05;

/// Velocity kicks applied at reconciliation, in pixels/frame
const RETARGET_IMPULSE: f32 = 5.0;
const RETIRE_IMPULSE: f32 = 5.0;
const SPAWN_IMPULSE: f32 = 2.0;

/// Newborn particles appear on a ring around the spawn center
const SPAWN_DIST_MIN: f32 = 10.0;
const SPAWN_DIST_SPAN: f32 = 40.0;

/// One particle in four travels at a random radius up to this
const TRANSIT_RADIUS_CHANCE: f32 = 0.25;
const TRANSIT_RADIUS_MAX: f32 = 4.0;

/// Within this distance of the target a particle counts as settled
const SETTLE_DISTANCE: f32 = 0.3;

/// Radius blending runs over this fraction of the layout box's longer side
const RADIUS_BLEND_SPAN: f32 = 0.3;

/// Per-frame inputs the integrator resolves against. Callers rebuild this
/// every frame so layout moves and pointer motion take effect immediately.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    /// Where the image currently sits on screen
    pub layout: Rect,
    /// Latest pointer position in screen pixels
    pub pointer: Vec2,
}

/// A persistent pool of particles morphing between point clouds.
///
/// The pool survives transitions: `reconcile` pairs existing particles with
/// new targets by index, spawning or retiring the remainder, and `step`
/// advances the spring physics one frame at a time.
#[derive(Default)]
pub struct Swarm {
    particles: Vec<Particle>,
    /// Reused each frame by `step`
    dots: Vec<DotInstance>,
}

impl Swarm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Drop every particle immediately (fallback path)
    pub fn clear(&mut self) {
        self.particles.clear();
        self.dots.clear();
    }

    /// Reclaim dead particles via swap-remove. Order is not preserved.
    pub fn compact(&mut self) {
        let mut i = 0;
        while i < self.particles.len() {
            if !self.particles[i].is_alive() {
                self.particles.swap_remove(i);
                // The swapped-in particle needs checking too
            } else {
                i += 1;
            }
        }
    }

    /// Point the swarm at a new target cloud. Runs once per transition.
    ///
    /// Pairing is by index: particle i chases target i. Surplus targets spawn
    /// new particles near `spawn_center`; surplus particles fade out in place.
    /// Dead particles are compacted away first so the pool cannot grow without
    /// bound across transitions.
    pub fn reconcile(
        &mut self,
        targets: &[SamplePoint],
        spawn_center: Vec2,
        rng: &mut SwarmRng,
        tuning: &Tuning,
    ) {
        self.compact();

        let existing = self.particles.len();
        let total = existing.max(targets.len());

        for i in 0..total {
            if i < existing && i < targets.len() {
                retarget(&mut self.particles[i], &targets[i], rng, tuning);
            } else if i < targets.len() {
                self.particles
                    .push(spawn(&targets[i], spawn_center, rng, tuning));
            } else {
                retire(&mut self.particles[i], rng);
            }
        }
    }

    /// Advance every particle one frame and pack the visible ones for drawing.
    ///
    /// The order per particle: color/opacity chase, dead skip, target resolve
    /// against the live layout, pointer repulsion, spring, friction, Euler
    /// step, then radius selection for the draw list.
    pub fn step(&mut self, input: &FrameInput, tuning: &Tuning) {
        self.dots.clear();
        let blend_span = (input.layout.max_side() * RADIUS_BLEND_SPAN).max(1.0);
        let repel_sq = tuning.mouse_radius * tuning.mouse_radius;

        for p in &mut self.particles {
            p.r = lerp_f32(p.r, p.target_r, COLOR_LERP);
            p.g = lerp_f32(p.g, p.target_g, COLOR_LERP);
            p.b = lerp_f32(p.b, p.target_b, COLOR_LERP);
            p.a = lerp_f32(p.a, p.target_a, ALPHA_LERP);

            if !p.is_alive() {
                continue;
            }

            let target = input.layout.point_at(p.target_u, p.target_v);

            // Retiring particles drift freely; only live ones feel the pointer
            if p.target_a > 0.0 {
                let dx = p.x - input.pointer.x;
                let dy = p.y - input.pointer.y;
                if dx.abs() < tuning.mouse_radius && dy.abs() < tuning.mouse_radius {
                    let dist_sq = dx * dx + dy * dy;
                    if dist_sq < repel_sq && dist_sq > 0.0 {
                        let dist = dist_sq.sqrt();
                        let push = (tuning.mouse_radius - dist) / tuning.mouse_radius
                            * tuning.mouse_push;
                        p.vx += dx / dist * push;
                        p.vy += dy / dist * push;
                    }
                }
            }

            p.vx += (target.x - p.x) * p.ease;
            p.vy += (target.y - p.y) * p.ease;
            p.vx *= p.friction;
            p.vy *= p.friction;
            p.x += p.vx;
            p.y += p.vy;

            if p.a < DRAW_ALPHA {
                continue;
            }

            let dx = target.x - p.x;
            let dy = target.y - p.y;
            let dist_to_target = (dx * dx + dy * dy).sqrt();

            let radius = if p.moving {
                let t = (dist_to_target / blend_span).clamp(0.0, 1.0);
                let radius = lerp_f32(tuning.dot_radius, p.radius_var, t);
                if dist_to_target < SETTLE_DISTANCE {
                    p.moving = false;
                    p.radius_var = tuning.dot_radius;
                }
                radius
            } else {
                tuning.dot_radius
            };

            self.dots.push(DotInstance {
                x: p.x,
                y: p.y,
                radius,
                r: p.r as u8,
                g: p.g as u8,
                b: p.b as u8,
                alpha: p.a,
            });
        }
    }

    /// Draw list packed by the last `step`
    pub fn dots(&self) -> &[DotInstance] {
        &self.dots
    }
}

/// Re-aim an existing particle at a new target. Position and velocity carry
/// over so the morph is continuous; a small random kick breaks up lockstep.
fn retarget(p: &mut Particle, t: &SamplePoint, rng: &mut SwarmRng, tuning: &Tuning) {
    p.target_u = t.u;
    p.target_v = t.v;
    p.target_r = t.r as f32;
    p.target_g = t.g as f32;
    p.target_b = t.b as f32;
    p.target_a = 1.0;
    p.friction = rng.range(tuning.friction_min, tuning.friction_max);
    p.ease = rng.range(tuning.ease_min, tuning.ease_max);
    p.radius_var = transit_radius(rng, tuning);
    p.moving = true;
    p.vx += (rng.next_f32() - 0.5) * RETARGET_IMPULSE;
    p.vy += (rng.next_f32() - 0.5) * RETARGET_IMPULSE;
}

/// Materialize a brand-new particle near the spawn center, transparent and
/// already wearing its target color.
fn spawn(t: &SamplePoint, center: Vec2, rng: &mut SwarmRng, tuning: &Tuning) -> Particle {
    let angle = rng.next_f32() * std::f32::consts::TAU;
    let dist = SPAWN_DIST_MIN + rng.next_f32() * SPAWN_DIST_SPAN;

    Particle {
        x: center.x + angle.cos() * dist,
        y: center.y + angle.sin() * dist,
        r: t.r as f32,
        g: t.g as f32,
        b: t.b as f32,
        a: 0.0,
        target_u: t.u,
        target_v: t.v,
        target_r: t.r as f32,
        target_g: t.g as f32,
        target_b: t.b as f32,
        target_a: 1.0,
        vx: (rng.next_f32() - 0.5) * SPAWN_IMPULSE,
        vy: (rng.next_f32() - 0.5) * SPAWN_IMPULSE,
        friction: rng.range(tuning.friction_min, tuning.friction_max),
        ease: rng.range(tuning.ease_min, tuning.ease_max),
        radius_var: transit_radius(rng, tuning),
        moving: true,
    }
}

/// Begin fading a surplus particle out where it stands, with a parting kick
fn retire(p: &mut Particle, rng: &mut SwarmRng) {
    p.target_a = 0.0;
    p.vx += (rng.next_f32() - 0.5) * RETIRE_IMPULSE;
    p.vy += (rng.next_f32() - 0.5) * RETIRE_IMPULSE;
}

fn transit_radius(rng: &mut SwarmRng, tuning: &Tuning) -> f32 {
    if rng.next_f32() < TRANSIT_RADIUS_CHANCE {
        rng.next_f32() * TRANSIT_RADIUS_MAX
    } else {
        tuning.dot_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_points(n: usize) -> Vec<SamplePoint> {
        (0..n)
            .map(|i| SamplePoint {
                u: (i as f32 + 0.5) / n as f32,
                v: 0.5,
                r: 255,
                g: 0,
                b: 0,
            })
            .collect()
    }

    fn test_input() -> FrameInput {
        FrameInput {
            layout: Rect::new(0.0, 0.0, 400.0, 300.0),
            // Parked far away so repulsion stays out of the picture
            pointer: Vec2::new(-9999.0, -9999.0),
        }
    }

    #[test]
    fn reconcile_spawns_for_surplus_targets() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(42);
        let tuning = Tuning::default();
        let center = Vec2::new(200.0, 150.0);

        swarm.reconcile(&red_points(3), center, &mut rng, &tuning);

        assert_eq!(swarm.len(), 3);
        for p in swarm.particles() {
            assert_eq!(p.a, 0.0);
            assert_eq!(p.target_a, 1.0);
            assert!(p.moving);
            let d = Vec2::new(p.x, p.y).distance(&center);
            assert!(d >= SPAWN_DIST_MIN - 1e-3 && d <= SPAWN_DIST_MIN + SPAWN_DIST_SPAN + 1e-3);
            assert!(p.vx.abs() <= SPAWN_IMPULSE / 2.0);
        }
    }

    #[test]
    fn reconcile_retires_surplus_particles() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(42);
        let tuning = Tuning::default();
        let center = Vec2::new(200.0, 150.0);

        swarm.reconcile(&red_points(5), center, &mut rng, &tuning);
        // Make them visible so none compact away
        for p in swarm.particles_mut() {
            p.a = 1.0;
        }

        swarm.reconcile(&red_points(2), center, &mut rng, &tuning);

        assert_eq!(swarm.len(), 5);
        let live = swarm.particles().iter().filter(|p| p.target_a > 0.0).count();
        let retiring = swarm.particles().iter().filter(|p| p.target_a == 0.0).count();
        assert_eq!(live, 2);
        assert_eq!(retiring, 3);
    }

    #[test]
    fn pool_size_is_max_of_old_and_new() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(1);
        let tuning = Tuning::default();
        let center = Vec2::ZERO;

        swarm.reconcile(&red_points(4), center, &mut rng, &tuning);
        assert_eq!(swarm.len(), 4);

        for p in swarm.particles_mut() {
            p.a = 1.0;
        }
        swarm.reconcile(&red_points(7), center, &mut rng, &tuning);
        assert_eq!(swarm.len(), 7);

        for p in swarm.particles_mut() {
            p.a = 1.0;
        }
        swarm.reconcile(&red_points(2), center, &mut rng, &tuning);
        assert_eq!(swarm.len(), 7);
    }

    #[test]
    fn retarget_keeps_position_and_bounds_velocity_kick() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(9);
        let tuning = Tuning::default();
        let center = Vec2::ZERO;

        swarm.reconcile(&red_points(1), center, &mut rng, &tuning);
        {
            let p = &mut swarm.particles_mut()[0];
            p.x = 123.0;
            p.y = 45.0;
            p.vx = 1.0;
            p.vy = -1.0;
            p.a = 1.0;
        }

        swarm.reconcile(&red_points(1), center, &mut rng, &tuning);

        let p = &swarm.particles()[0];
        assert_eq!(p.x, 123.0);
        assert_eq!(p.y, 45.0);
        assert!((p.vx - 1.0).abs() <= RETARGET_IMPULSE / 2.0);
        assert!((p.vy + 1.0).abs() <= RETARGET_IMPULSE / 2.0);
        assert!(p.friction >= 0.50 && p.friction < 0.60);
        assert!(p.ease >= 0.20 && p.ease < 0.30);
    }

    #[test]
    fn compact_reclaims_only_dead_particles() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(3);
        let tuning = Tuning::default();

        swarm.reconcile(&red_points(3), Vec2::ZERO, &mut rng, &tuning);
        {
            let ps = swarm.particles_mut();
            ps[0].a = 1.0; // alive
            ps[1].a = 0.001; // dead once target drops
            ps[1].target_a = 0.0;
            ps[2].a = 0.5; // retiring but visible
            ps[2].target_a = 0.0;
        }

        swarm.compact();
        assert_eq!(swarm.len(), 2);
        assert!(swarm.particles().iter().all(|p| p.is_alive()));
    }

    #[test]
    fn reconcile_compacts_before_pairing() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(3);
        let tuning = Tuning::default();

        swarm.reconcile(&red_points(4), Vec2::ZERO, &mut rng, &tuning);
        {
            let ps = swarm.particles_mut();
            for p in ps.iter_mut() {
                p.a = 1.0;
            }
            ps[1].a = 0.0;
            ps[1].target_a = 0.0;
        }

        // One dead particle is reclaimed, so 3 survivors pair with 3 targets
        swarm.reconcile(&red_points(3), Vec2::ZERO, &mut rng, &tuning);
        assert_eq!(swarm.len(), 3);
        assert!(swarm.particles().iter().all(|p| p.target_a == 1.0));
    }

    #[test]
    fn opacity_chases_target_at_fixed_rate() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(5);
        let tuning = Tuning::default();

        swarm.reconcile(&red_points(1), Vec2::new(200.0, 150.0), &mut rng, &tuning);
        swarm.step(&test_input(), &tuning);

        let p = &swarm.particles()[0];
        assert!((p.a - 0.2).abs() < 1e-6);
    }

    #[test]
    fn springs_converge_and_settle() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(7);
        let tuning = Tuning::default();
        let input = test_input();

        let targets = vec![SamplePoint {
            u: 0.5,
            v: 0.5,
            r: 10,
            g: 200,
            b: 30,
        }];
        swarm.reconcile(&targets, Vec2::new(10.0, 10.0), &mut rng, &tuning);

        for _ in 0..300 {
            swarm.step(&input, &tuning);
        }

        let p = &swarm.particles()[0];
        let target = input.layout.point_at(0.5, 0.5);
        assert!(Vec2::new(p.x, p.y).distance(&target) < 1.0);
        assert!(!p.moving, "settled particles stop size-modulating");
        assert!((p.a - 1.0).abs() < 0.01);
        // Color has converged on the target too
        assert!((p.r - 10.0).abs() < 1.0);
        assert!((p.g - 200.0).abs() < 1.0);
    }

    #[test]
    fn springs_converge_across_the_tuning_range() {
        let input = test_input();
        let tuning = Tuning::default();

        for &(friction, ease) in &[(0.5, 0.2), (0.5, 0.3), (0.6, 0.2), (0.6, 0.3)] {
            let mut swarm = Swarm::new();
            let mut rng = SwarmRng::new(11);
            swarm.reconcile(&red_points(1), Vec2::new(5.0, 5.0), &mut rng, &tuning);
            {
                let p = &mut swarm.particles_mut()[0];
                p.friction = friction;
                p.ease = ease;
            }

            for _ in 0..300 {
                swarm.step(&input, &tuning);
            }

            let p = &swarm.particles()[0];
            let target = input.layout.point_at(p.target_u, p.target_v);
            assert!(
                Vec2::new(p.x, p.y).distance(&target) < 1.0,
                "friction {} ease {} left the spring {} px away",
                friction,
                ease,
                Vec2::new(p.x, p.y).distance(&target)
            );
        }
    }

    #[test]
    fn faint_particles_are_integrated_but_not_drawn() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(11);
        let tuning = Tuning::default();

        swarm.reconcile(&red_points(1), Vec2::new(200.0, 150.0), &mut rng, &tuning);
        // First step: a = 0.2 -> drawn. But rewind opacity to just under the cutoff
        swarm.particles_mut()[0].a = 0.0;
        swarm.particles_mut()[0].target_a = 0.2;

        swarm.step(&test_input(), &tuning);
        assert!(swarm.dots().is_empty());

        swarm.particles_mut()[0].a = 0.9;
        swarm.particles_mut()[0].target_a = 1.0;
        swarm.step(&test_input(), &tuning);
        assert_eq!(swarm.dots().len(), 1);
    }

    #[test]
    fn pointer_pushes_particles_away() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(13);
        let tuning = Tuning::default();

        swarm.reconcile(&red_points(1), Vec2::new(200.0, 150.0), &mut rng, &tuning);
        {
            let p = &mut swarm.particles_mut()[0];
            p.x = 210.0;
            p.y = 150.0;
            p.vx = 0.0;
            p.vy = 0.0;
            p.a = 1.0;
            // Pin the target on the current position so only the pointer acts
            p.target_u = 210.0 / 400.0;
            p.target_v = 150.0 / 300.0;
        }

        let input = FrameInput {
            layout: Rect::new(0.0, 0.0, 400.0, 300.0),
            pointer: Vec2::new(200.0, 150.0),
        };
        swarm.step(&input, &tuning);

        // Particle sits right of the pointer, so it gets shoved further right
        let p = &swarm.particles()[0];
        assert!(p.x > 210.0);
    }

    #[test]
    fn retiring_particles_ignore_the_pointer() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(13);
        let tuning = Tuning::default();

        swarm.reconcile(&red_points(1), Vec2::new(200.0, 150.0), &mut rng, &tuning);
        {
            let p = &mut swarm.particles_mut()[0];
            p.x = 210.0;
            p.y = 150.0;
            p.vx = 0.0;
            p.vy = 0.0;
            p.a = 1.0;
            p.target_a = 0.0;
            p.target_u = 210.0 / 400.0;
            p.target_v = 150.0 / 300.0;
        }

        let input = FrameInput {
            layout: Rect::new(0.0, 0.0, 400.0, 300.0),
            pointer: Vec2::new(200.0, 150.0),
        };
        swarm.step(&input, &tuning);

        // Spring still pulls (target pinned under it), pointer does not
        let p = &swarm.particles()[0];
        assert!((p.x - 210.0).abs() < 0.5);
    }

    #[test]
    fn layout_moves_take_effect_immediately() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(17);
        let tuning = Tuning::default();

        let targets = vec![SamplePoint {
            u: 0.5,
            v: 0.5,
            r: 255,
            g: 255,
            b: 255,
        }];
        swarm.reconcile(&targets, Vec2::ZERO, &mut rng, &tuning);

        let mut input = test_input();
        for _ in 0..200 {
            swarm.step(&input, &tuning);
        }
        let settled_x = swarm.particles()[0].x;
        assert!((settled_x - 200.0).abs() < 1.0);

        // Slide the layout box right; the same particle follows the new rect
        input.layout.x += 500.0;
        for _ in 0..200 {
            swarm.step(&input, &tuning);
        }
        assert!((swarm.particles()[0].x - 700.0).abs() < 1.0);
    }

    #[test]
    fn clear_empties_pool_and_draw_list() {
        let mut swarm = Swarm::new();
        let mut rng = SwarmRng::new(19);
        let tuning = Tuning::default();

        swarm.reconcile(&red_points(4), Vec2::new(200.0, 150.0), &mut rng, &tuning);
        for _ in 0..10 {
            swarm.step(&test_input(), &tuning);
        }
        assert!(!swarm.dots().is_empty());

        swarm.clear();
        assert!(swarm.is_empty());
        assert!(swarm.dots().is_empty());
    }
}
