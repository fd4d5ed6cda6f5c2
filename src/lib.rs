pub mod camera;
pub mod panel;
pub mod particles;
pub mod physics;
pub mod render;
pub mod state;

/// Tunable simulation parameters, shared by the generator, the stepper and
/// the render layer. Mutated only through the parameter panel path.
#[derive(Debug, Clone)]
pub struct SimParams {
  /// Visual point size and half the collision contact distance.
  pub particle_radius: f32,
  /// Half extent of the initial cubic lattice.
  pub cube_size: f32,
  pub particle_count: u32,
  /// Per-step velocity increment on y.
  pub gravity: f32,
  /// Fraction of y velocity retained (reversed) after a ground contact.
  pub bounce_factor: f32,
}

impl Default for SimParams {
  fn default() -> Self {
    Self {
      particle_radius: 0.5,
      cube_size: 10.0,
      particle_count: 1000,
      gravity: -0.01,
      bounce_factor: 0.7,
    }
  }
}

impl SimParams {
  /// Lift of the lattice base above the ground plane, so the cube starts
  /// falling instead of resting inside the floor.
  #[must_use]
  pub fn lift_height(&self) -> f32 {
    self.cube_size + 10.0
  }
}

pub struct CameraParams {
  pub speed: f32,
  pub rotational_speed: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      speed: 0.2,
      rotational_speed: 0.02,
    }
  }
}
