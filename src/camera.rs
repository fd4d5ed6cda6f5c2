use cgmath::{InnerSpace, Rad, Rotation, Rotation3, SquareMatrix};
use winit::{
  dpi::PhysicalPosition,
  event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub struct Camera {
  pub eye: cgmath::Point3<f32>,
  pub target: cgmath::Point3<f32>,
  pub up: cgmath::Vector3<f32>,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
  #[must_use]
  pub fn new() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
    }
  }

  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
  }
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self::new()
  }
}

/// Orbit controls around the camera target: A/D (or arrows) orbit
/// horizontally, Q/E orbit vertically, W/S and the scroll wheel dolly in and
/// out, and dragging with the left mouse button orbits freely. The
/// simulation never moves the camera; only user input does.
pub struct CameraController {
  speed: f32,
  rotation_speed: f32,
  is_forward_pressed: bool,
  is_backward_pressed: bool,
  is_left_pressed: bool,
  is_right_pressed: bool,
  is_rotate_up_pressed: bool,
  is_rotate_down_pressed: bool,
  is_dragging: bool,
  cursor: PhysicalPosition<f64>,
  drag_delta: (f32, f32),
  scroll_delta: f32,
}

impl CameraController {
  #[must_use]
  pub fn init(speed: f32, rotation_speed: f32) -> Self {
    Self {
      speed,
      rotation_speed,
      is_forward_pressed: false,
      is_backward_pressed: false,
      is_left_pressed: false,
      is_right_pressed: false,
      is_rotate_up_pressed: false,
      is_rotate_down_pressed: false,
      is_dragging: false,
      cursor: PhysicalPosition::new(0.0, 0.0),
      drag_delta: (0.0, 0.0),
      scroll_delta: 0.0,
    }
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => {
        let is_pressed = *state == ElementState::Pressed;
        match keycode {
          KeyCode::KeyW | KeyCode::ArrowUp => {
            self.is_forward_pressed = is_pressed;
            true
          }
          KeyCode::KeyA | KeyCode::ArrowLeft => {
            self.is_left_pressed = is_pressed;
            true
          }
          KeyCode::KeyS | KeyCode::ArrowDown => {
            self.is_backward_pressed = is_pressed;
            true
          }
          KeyCode::KeyD | KeyCode::ArrowRight => {
            self.is_right_pressed = is_pressed;
            true
          }
          KeyCode::KeyQ => {
            self.is_rotate_up_pressed = is_pressed;
            true
          }
          KeyCode::KeyE => {
            self.is_rotate_down_pressed = is_pressed;
            true
          }
          _ => false,
        }
      }
      WindowEvent::MouseInput {
        state,
        button: MouseButton::Left,
        ..
      } => {
        self.is_dragging = *state == ElementState::Pressed;
        true
      }
      WindowEvent::CursorMoved { position, .. } => {
        if self.is_dragging {
          self.drag_delta.0 += (position.x - self.cursor.x) as f32;
          self.drag_delta.1 += (position.y - self.cursor.y) as f32;
        }
        self.cursor = *position;
        self.is_dragging
      }
      WindowEvent::MouseWheel { delta, .. } => {
        self.scroll_delta += match delta {
          MouseScrollDelta::LineDelta(_, y) => *y,
          MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
        };
        true
      }
      _ => false,
    }
  }

  pub fn update_camera(&mut self, camera: &mut Camera) {
    let forward = camera.target - camera.eye;
    let forward_norm = forward.normalize();
    let forward_mag = forward.magnitude();

    let mut dolly = self.speed * 2.0 * self.scroll_delta;
    self.scroll_delta = 0.0;
    if self.is_forward_pressed {
      dolly += self.speed;
    }
    if self.is_backward_pressed {
      dolly -= self.speed;
    }
    if dolly < 0.0 || forward_mag > dolly {
      camera.eye += forward_norm * dolly;
    }

    let right = forward_norm.cross(camera.up);

    if self.is_right_pressed {
      camera.eye = camera.target - (forward + right * self.speed).normalize() * forward_mag;
    }
    if self.is_left_pressed {
      camera.eye = camera.target - (forward - right * self.speed).normalize() * forward_mag;
    }

    let (drag_x, drag_y) = self.drag_delta;
    self.drag_delta = (0.0, 0.0);

    let mut pitch = 0.0;
    if self.is_rotate_up_pressed {
      pitch += self.rotation_speed;
    }
    if self.is_rotate_down_pressed {
      pitch -= self.rotation_speed;
    }
    pitch += drag_y * 0.005;
    if pitch != 0.0 {
      let forward = camera.target - camera.eye;
      let rot_axis = forward.normalize().cross(camera.up).normalize();
      let rotation = cgmath::Quaternion::from_axis_angle(rot_axis, Rad(pitch));
      camera.eye = camera.target - rotation.rotate_vector(forward);
      camera.up = rotation.rotate_vector(camera.up);
    }

    if drag_x != 0.0 {
      let forward = camera.target - camera.eye;
      let rotation = cgmath::Quaternion::from_axis_angle(camera.up.normalize(), Rad(drag_x * 0.005));
      camera.eye = camera.target - rotation.rotate_vector(forward);
    }
  }
}
