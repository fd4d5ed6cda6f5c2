use cgmath::Vector3;
use particle_bounce::particles::{self, ParticleState};
use particle_bounce::{physics, SimParams};
use rand::{rngs::SmallRng, SeedableRng};

/// Build a generated state with the default origin and lift used by the app
pub fn generated_state(count: usize, cube_size: f32) -> ParticleState {
  let mut state = ParticleState::new(count);
  let mut rng = SmallRng::seed_from_u64(7);
  particles::generate(
    &mut state,
    Vector3::new(0.0, 0.0, 0.0),
    cube_size + 10.0,
    cube_size,
    &mut rng,
  );
  state
}

/// Zero out all velocities so only gravity moves the particles
pub fn freeze(state: &mut ParticleState) {
  for v in &mut state.velocities {
    *v = 0.0;
  }
}

// ==================================================================================
// Generation
// ==================================================================================

#[test]
fn generation_fills_matching_buffers() {
  for count in [0, 1, 8, 100, 1000, 1331] {
    let state = generated_state(count, 10.0);
    assert_eq!(state.positions.len(), 3 * count);
    assert_eq!(state.velocities.len(), 3 * count);
  }
}

#[test]
fn generation_keeps_cube_above_lift_floor() {
  let cube_size = 10.0;
  let lift = cube_size + 10.0;
  let state = generated_state(1000, cube_size);
  for i in 0..state.count() {
    let y = state.positions[i * 3 + 1];
    assert!(y >= lift - cube_size, "particle {i} below lattice floor: {y}");
  }
}

// ==================================================================================
// Stepping
// ==================================================================================

#[test]
fn stepping_empty_state_does_nothing() {
  let mut state = ParticleState::new(0);
  physics::step(&mut state, &SimParams::default());
  assert!(state.positions.is_empty());
}

#[test]
fn particles_never_fall_through_the_ground() {
  let params = SimParams::default();
  let mut state = generated_state(64, 5.0);
  for _ in 0..2000 {
    physics::step(&mut state, &params);
    for i in 0..state.count() {
      assert!(state.positions[i * 3 + 1] >= 0.0);
    }
  }
}

#[test]
fn one_gravity_step_from_rest() {
  // 8 particles 10 units apart: no pair can collide, so a single step moves
  // every particle down by exactly one gravity increment.
  let params = SimParams::default();
  let mut state = generated_state(8, 10.0);
  freeze(&mut state);
  let before = state.positions.clone();

  physics::step(&mut state, &params);

  for i in 0..state.count() {
    assert_eq!(state.positions[i * 3], before[i * 3]);
    assert_eq!(state.positions[i * 3 + 1], before[i * 3 + 1] + params.gravity);
    assert_eq!(state.positions[i * 3 + 2], before[i * 3 + 2]);
  }
}

#[test]
fn dense_cube_stays_finite() {
  // Small cube with a radius large enough that everything collides with
  // everything; the resolution must still never produce NaN or infinity.
  let params = SimParams {
    particle_radius: 1.0,
    cube_size: 1.0,
    particle_count: 27,
    ..SimParams::default()
  };
  let mut state = generated_state(27, 1.0);
  for _ in 0..500 {
    physics::step(&mut state, &params);
  }
  for v in state.positions.iter().chain(state.velocities.iter()) {
    assert!(v.is_finite());
  }
}

// ==================================================================================
// Live parameter changes
// ==================================================================================

#[test]
fn shrinking_count_then_stepping_is_safe() {
  let params = SimParams::default();
  let mut state = generated_state(1000, 10.0);
  state.resize(100);
  let mut rng = SmallRng::seed_from_u64(7);
  particles::generate(&mut state, Vector3::new(0.0, 0.0, 0.0), 20.0, 10.0, &mut rng);

  physics::step(&mut state, &params);

  assert_eq!(state.positions.len(), 300);
  assert_eq!(state.velocities.len(), 300);
}

#[test]
fn regeneration_resets_a_settled_cube() {
  let params = SimParams::default();
  let mut state = generated_state(125, 5.0);
  for _ in 0..3000 {
    physics::step(&mut state, &params);
  }
  // Settled near the ground by now; regenerating lifts the cube back up.
  let mut rng = SmallRng::seed_from_u64(8);
  particles::generate(&mut state, Vector3::new(0.0, 0.0, 0.0), 15.0, 5.0, &mut rng);
  for i in 0..state.count() {
    assert!(state.positions[i * 3 + 1] >= 10.0);
  }
}
