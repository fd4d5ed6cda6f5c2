use crate::SimParams;
use log::info;
use winit::{
  event::{ElementState, KeyEvent, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

pub const RADIUS_BOUNDS: (f32, f32) = (0.0, 1.0);
pub const RADIUS_STEP: f32 = 0.01;
pub const CUBE_SIZE_BOUNDS: (f32, f32) = (1.0, 50.0);
pub const CUBE_SIZE_STEP: f32 = 1.0;
pub const COUNT_BOUNDS: (u32, u32) = (100, 10_000);
pub const COUNT_STEP: u32 = 100;

/// Which tunable a panel interaction changed, carrying the new value. The
/// event loop dispatches these: a radius change touches only the material, a
/// cube-size change regenerates positions, a count change reallocates the
/// state and the GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelChange {
  ParticleRadius(f32),
  CubeSize(f32),
  ParticleCount(u32),
}

#[derive(Debug, Clone, Copy)]
enum Control {
  Radius,
  CubeSize,
  Count,
}

/// Keyboard stand-in for the browser demo's slider panel. Each control steps
/// up and down within the same bounds the sliders had:
///
/// - `[` / `]`  particle radius, 0 to 1 by 0.01
/// - `-` / `=`  cube size, 1 to 50 by 1
/// - `,` / `.`  particle count, 100 to 10000 by 100
pub struct Panel;

impl Panel {
  #[must_use]
  pub fn new() -> Self {
    Self
  }

  pub fn process_events(
    &mut self,
    event: &WindowEvent,
    params: &mut SimParams,
  ) -> Option<PanelChange> {
    let WindowEvent::KeyboardInput {
      event:
        KeyEvent {
          state: ElementState::Pressed,
          physical_key: PhysicalKey::Code(keycode),
          ..
        },
      ..
    } = event
    else {
      return None;
    };

    let (control, up) = match keycode {
      KeyCode::BracketLeft => (Control::Radius, false),
      KeyCode::BracketRight => (Control::Radius, true),
      KeyCode::Minus => (Control::CubeSize, false),
      KeyCode::Equal => (Control::CubeSize, true),
      KeyCode::Comma => (Control::Count, false),
      KeyCode::Period => (Control::Count, true),
      _ => return None,
    };
    let change = apply(params, control, up);
    match change {
      PanelChange::ParticleRadius(r) => info!("particle radius: {r:.2}"),
      PanelChange::CubeSize(s) => info!("cube size: {s}"),
      PanelChange::ParticleCount(n) => info!("particle count: {n}"),
    }
    Some(change)
  }
}

impl Default for Panel {
  fn default() -> Self {
    Self::new()
  }
}

fn apply(params: &mut SimParams, control: Control, up: bool) -> PanelChange {
  match control {
    Control::Radius => {
      let step = if up { RADIUS_STEP } else { -RADIUS_STEP };
      params.particle_radius =
        (params.particle_radius + step).clamp(RADIUS_BOUNDS.0, RADIUS_BOUNDS.1);
      PanelChange::ParticleRadius(params.particle_radius)
    }
    Control::CubeSize => {
      let step = if up { CUBE_SIZE_STEP } else { -CUBE_SIZE_STEP };
      params.cube_size = (params.cube_size + step).clamp(CUBE_SIZE_BOUNDS.0, CUBE_SIZE_BOUNDS.1);
      PanelChange::CubeSize(params.cube_size)
    }
    Control::Count => {
      params.particle_count = if up {
        (params.particle_count + COUNT_STEP).min(COUNT_BOUNDS.1)
      } else {
        params.particle_count.saturating_sub(COUNT_STEP).max(COUNT_BOUNDS.0)
      };
      PanelChange::ParticleCount(params.particle_count)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn radius_steps_and_clamps() {
    let mut params = SimParams {
      particle_radius: 0.99,
      ..SimParams::default()
    };
    assert_eq!(
      apply(&mut params, Control::Radius, true),
      PanelChange::ParticleRadius(1.0)
    );
    // Already at the upper bound, stays there.
    assert_eq!(
      apply(&mut params, Control::Radius, true),
      PanelChange::ParticleRadius(1.0)
    );
  }

  #[test]
  fn cube_size_lower_bound() {
    let mut params = SimParams {
      cube_size: 1.0,
      ..SimParams::default()
    };
    assert_eq!(
      apply(&mut params, Control::CubeSize, false),
      PanelChange::CubeSize(1.0)
    );
  }

  #[test]
  fn count_steps_by_hundreds() {
    let mut params = SimParams::default();
    assert_eq!(
      apply(&mut params, Control::Count, true),
      PanelChange::ParticleCount(1100)
    );
    params.particle_count = 100;
    assert_eq!(
      apply(&mut params, Control::Count, false),
      PanelChange::ParticleCount(100)
    );
  }
}
