use cgmath::Vector3;
use rand::{rngs::SmallRng, Rng};

/// Raw simulation state: flat xyz triplets, particle `i` occupies
/// `[3i, 3i + 2]` in both buffers. The render layer only ever reads
/// `positions`; everything that writes goes through the stepper or the
/// generator.
#[derive(Debug, Clone)]
pub struct ParticleState {
  count: usize,
  pub positions: Vec<f32>,
  pub velocities: Vec<f32>,
}

impl ParticleState {
  #[must_use]
  pub fn new(count: usize) -> Self {
    Self {
      count,
      positions: vec![0.0; count * 3],
      velocities: vec![0.0; count * 3],
    }
  }

  #[must_use]
  pub fn count(&self) -> usize {
    self.count
  }

  /// Reallocates both buffers to the new count. Old contents are discarded;
  /// both vectors are replaced together so no reader can observe one buffer
  /// at the old size and the other at the new one.
  pub fn resize(&mut self, count: usize) {
    self.count = count;
    self.positions = vec![0.0; count * 3];
    self.velocities = vec![0.0; count * 3];
  }
}

/// Overwrites `state` with an approximately cubic lattice centered on
/// `origin`, lifted by `lift_height` on y, with half extent `half_extent`.
///
/// Lattice spacing is `2 * half_extent / cbrt(count)`; particle `i` gets grid
/// coordinates by mixed-radix decomposition in base `round(cbrt(count))`.
/// Non-perfect-cube counts leave some rows short, which is fine for a falling
/// blob. Initial velocities are slightly randomized with an upward bias so
/// the cube does not collapse into a single column on the first bounce.
pub fn generate(
  state: &mut ParticleState,
  origin: Vector3<f32>,
  lift_height: f32,
  half_extent: f32,
  rng: &mut SmallRng,
) {
  let count = state.count();
  let side = (count as f32).cbrt();
  let k = (side.round() as usize).max(1);
  let spacing = (half_extent * 2.0) / side;

  for i in 0..count {
    let xi = (i % k) as f32;
    let yi = ((i / k) % k) as f32;
    let zi = (i / (k * k)) as f32;

    state.positions[i * 3] = origin.x + xi * spacing - half_extent;
    state.positions[i * 3 + 1] = origin.y + lift_height + yi * spacing - half_extent;
    state.positions[i * 3 + 2] = origin.z + zi * spacing - half_extent;

    state.velocities[i * 3] = (rng.gen::<f32>() - 0.5) * 0.2;
    state.velocities[i * 3 + 1] = rng.gen::<f32>() * 0.1;
    state.velocities[i * 3 + 2] = (rng.gen::<f32>() - 0.5) * 0.2;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  fn rng() -> SmallRng {
    SmallRng::seed_from_u64(42)
  }

  #[test]
  fn buffers_track_count() {
    let state = ParticleState::new(27);
    assert_eq!(state.positions.len(), 81);
    assert_eq!(state.velocities.len(), 81);
  }

  #[test]
  fn resize_swaps_both_buffers() {
    let mut state = ParticleState::new(1000);
    state.resize(100);
    assert_eq!(state.count(), 100);
    assert_eq!(state.positions.len(), 300);
    assert_eq!(state.velocities.len(), 300);
  }

  #[test]
  fn generate_empty_state() {
    let mut state = ParticleState::new(0);
    generate(&mut state, Vector3::new(0.0, 0.0, 0.0), 20.0, 10.0, &mut rng());
    assert!(state.positions.is_empty());
    assert!(state.velocities.is_empty());
  }

  #[test]
  fn lattice_stays_above_floor() {
    let mut state = ParticleState::new(1000);
    generate(&mut state, Vector3::new(0.0, 0.0, 0.0), 20.0, 10.0, &mut rng());
    for i in 0..state.count() {
      let y = state.positions[i * 3 + 1];
      assert!(y >= 20.0 - 10.0, "particle {i} generated below the lift: {y}");
    }
  }

  #[test]
  fn perfect_cube_spacing() {
    // 8 particles with half extent 10: a 2x2x2 lattice, 10 apart.
    let mut state = ParticleState::new(8);
    generate(&mut state, Vector3::new(0.0, 0.0, 0.0), 20.0, 10.0, &mut rng());
    for i in 0..8 {
      let expected = if i % 2 == 0 { -10.0 } else { 0.0 };
      assert!((state.positions[i * 3] - expected).abs() < 1e-4);
    }
    assert!((state.positions[1] - 10.0).abs() < 1e-4); // first particle y
    assert!((state.positions[7 * 3 + 1] - 20.0).abs() < 1e-4); // last particle y
  }

  #[test]
  fn velocity_ranges() {
    let mut state = ParticleState::new(500);
    generate(&mut state, Vector3::new(0.0, 0.0, 0.0), 20.0, 10.0, &mut rng());
    for i in 0..state.count() {
      let vx = state.velocities[i * 3];
      let vy = state.velocities[i * 3 + 1];
      let vz = state.velocities[i * 3 + 2];
      assert!((-0.1..=0.1).contains(&vx));
      assert!((0.0..=0.1).contains(&vy), "y velocity has an upward bias");
      assert!((-0.1..=0.1).contains(&vz));
    }
  }
}
