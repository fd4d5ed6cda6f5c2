use crate::{particles::ParticleState, SimParams};

/// Two coincident particles have no usable contact normal; pairs closer than
/// this are skipped for the step rather than dividing by zero.
const MIN_SEPARATION: f32 = 1e-6;

/// Advances every particle by one unit time step.
///
/// Pass 1 integrates gravity and resolves ground contact per particle; pass 2
/// walks all unordered pairs, pushing overlapping particles apart along the
/// contact normal and swapping their velocities (equal-mass elastic response,
/// tangential components included). Pass 2 is O(n²), which bounds practical
/// counts at the panel's 10k ceiling.
pub fn step(state: &mut ParticleState, params: &SimParams) {
  let count = state.count();
  let pos = &mut state.positions;
  let vel = &mut state.velocities;

  for i in 0..count {
    let idx = i * 3;

    vel[idx + 1] += params.gravity;

    pos[idx] += vel[idx];
    pos[idx + 1] += vel[idx + 1];
    pos[idx + 2] += vel[idx + 2];

    if pos[idx + 1] < 0.0 {
      pos[idx + 1] = 0.0;
      vel[idx + 1] = -vel[idx + 1] * params.bounce_factor;
    }
  }

  let min_distance = params.particle_radius * 2.0;
  for i in 0..count {
    for j in (i + 1)..count {
      let a = i * 3;
      let b = j * 3;

      let dx = pos[a] - pos[b];
      let dy = pos[a + 1] - pos[b + 1];
      let dz = pos[a + 2] - pos[b + 2];
      let distance = (dx * dx + dy * dy + dz * dz).sqrt();

      if distance >= min_distance || distance < MIN_SEPARATION {
        continue;
      }

      let overlap = min_distance - distance;
      let nx = dx / distance;
      let ny = dy / distance;
      let nz = dz / distance;

      pos[a] += nx * (overlap / 2.0);
      pos[a + 1] += ny * (overlap / 2.0);
      pos[a + 2] += nz * (overlap / 2.0);
      pos[b] -= nx * (overlap / 2.0);
      pos[b + 1] -= ny * (overlap / 2.0);
      pos[b + 2] -= nz * (overlap / 2.0);

      vel.swap(a, b);
      vel.swap(a + 1, b + 1);
      vel.swap(a + 2, b + 2);
    }
  }

  // Overlap resolution can shove a grounded particle through the floor;
  // position-only clamp, the next step's ground contact handles velocity.
  for i in 0..count {
    let y = &mut pos[i * 3 + 1];
    if *y < 0.0 {
      *y = 0.0;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn single(pos: [f32; 3], vel: [f32; 3]) -> ParticleState {
    let mut state = ParticleState::new(1);
    state.positions.copy_from_slice(&pos);
    state.velocities.copy_from_slice(&vel);
    state
  }

  fn pair(p0: [f32; 3], v0: [f32; 3], p1: [f32; 3], v1: [f32; 3]) -> ParticleState {
    let mut state = ParticleState::new(2);
    state.positions[..3].copy_from_slice(&p0);
    state.positions[3..].copy_from_slice(&p1);
    state.velocities[..3].copy_from_slice(&v0);
    state.velocities[3..].copy_from_slice(&v1);
    state
  }

  #[test]
  fn empty_state_is_a_noop() {
    let mut state = ParticleState::new(0);
    step(&mut state, &SimParams::default());
    assert_eq!(state.count(), 0);
  }

  #[test]
  fn gravity_integrates_into_position() {
    let params = SimParams::default();
    let mut state = single([1.0, 5.0, -2.0], [0.0; 3]);
    step(&mut state, &params);
    assert_eq!(state.positions[0], 1.0);
    assert_eq!(state.positions[1], 5.0 + params.gravity);
    assert_eq!(state.positions[2], -2.0);
  }

  #[test]
  fn ground_contact_clamps_and_reflects() {
    let params = SimParams::default();
    let mut state = single([0.0, 0.005, 0.0], [0.0, -1.0, 0.0]);
    step(&mut state, &params);
    assert_eq!(state.positions[1], 0.0);
    let expected = (1.0 - params.gravity) * params.bounce_factor;
    assert!((state.velocities[1] - expected).abs() < 1e-6);
  }

  #[test]
  fn never_below_ground() {
    let params = SimParams::default();
    let mut state = single([0.0, 8.0, 0.0], [0.0; 3]);
    for _ in 0..10_000 {
      step(&mut state, &params);
      assert!(state.positions[1] >= 0.0);
    }
  }

  #[test]
  fn bounce_loses_seventy_percent() {
    let params = SimParams::default();
    let mut state = single([0.0, 10.0, 0.0], [0.0; 3]);
    loop {
      let impact_speed = -(state.velocities[1] + params.gravity);
      step(&mut state, &params);
      if state.positions[1] == 0.0 {
        let rebound = state.velocities[1];
        assert!(
          (rebound - impact_speed * params.bounce_factor).abs() < 1e-5,
          "rebound {rebound} vs impact {impact_speed}"
        );
        break;
      }
    }
  }

  #[test]
  fn overlapping_pair_separates() {
    let params = SimParams::default();
    // 0.4 apart on x with contact distance 1.0; well off the ground so
    // pass 1 only applies one gravity increment.
    let mut state = pair([0.2, 50.0, 0.0], [0.0; 3], [-0.2, 50.0, 0.0], [0.0; 3]);
    step(&mut state, &params);
    let dx = state.positions[0] - state.positions[3];
    let dy = state.positions[1] - state.positions[4];
    let dz = state.positions[2] - state.positions[5];
    let distance = (dx * dx + dy * dy + dz * dz).sqrt();
    assert!(
      distance >= params.particle_radius * 2.0 - 1e-5,
      "still overlapping after resolution: {distance}"
    );
  }

  #[test]
  fn colliding_pair_swaps_velocities() {
    let params = SimParams::default();
    let mut state = pair(
      [0.2, 50.0, 0.0],
      [0.05, 0.0, -0.01],
      [-0.2, 50.0, 0.0],
      [-0.04, 0.0, 0.02],
    );
    step(&mut state, &params);
    // Each velocity picked up one gravity increment in pass 1, then the full
    // vectors swapped in pass 2.
    assert_eq!(&state.velocities[..3], &[-0.04, params.gravity, 0.02]);
    assert_eq!(&state.velocities[3..], &[0.05, params.gravity, -0.01]);
  }

  #[test]
  fn coincident_pair_is_skipped() {
    let params = SimParams::default();
    let mut state = pair([0.0, 50.0, 0.0], [0.0; 3], [0.0, 50.0, 0.0], [0.0; 3]);
    step(&mut state, &params);
    for v in state.positions.iter().chain(state.velocities.iter()) {
      assert!(v.is_finite());
    }
    // No usable normal, so neither particle moved apart.
    assert_eq!(state.positions[0], state.positions[3]);
  }

  #[test]
  fn resize_then_step_is_safe() {
    let params = SimParams::default();
    let mut state = ParticleState::new(1000);
    state.resize(100);
    step(&mut state, &params);
    assert_eq!(state.positions.len(), 300);
    assert_eq!(state.velocities.len(), 300);
  }
}
