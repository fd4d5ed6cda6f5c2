use crate::camera::{Camera, CameraController, CameraUniform};
use crate::panel::{Panel, PanelChange};
use crate::particles::{self, ParticleState};
use crate::render::Render;
use crate::{physics, CameraParams, SimParams};
use cgmath::{InnerSpace, Vector3};
use log::info;
use rand::{rngs::SmallRng, SeedableRng};
use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};
use std::time::Instant;
use wgpu::util::DeviceExt;
use winit::event::ElementState;
use winit::keyboard::*;
use winit::{
  dpi::PhysicalSize,
  event::{Event, KeyEvent, StartCause, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  window::Window,
};

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str) -> Self {
    let event_loop = EventLoop::new().unwrap();
    let mut builder = winit::window::WindowBuilder::new();
    builder = builder.with_title(title);
    let window = Arc::new(builder.build(&event_loop).unwrap());

    Self { event_loop, window }
  }
}

struct SurfaceWrapper {
  surface: Option<wgpu::Surface<'static>>,
  config: Option<wgpu::SurfaceConfiguration>,
}

impl SurfaceWrapper {
  fn new() -> Self {
    Self {
      surface: None,
      config: None,
    }
  }

  fn resume(&mut self, context: &State, window: Arc<Window>) {
    let window_size = window.inner_size();
    let width = window_size.width.max(1);
    let height = window_size.height.max(1);
    self.surface = Some(context.instance.create_surface(window).unwrap());
    let surface = self.surface.as_ref().unwrap();
    let mut config = surface
      .get_default_config(&context.adapter, width, height)
      .unwrap();
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&context.device, &config);
    self.config = Some(config);
  }

  /// Keeps the swapchain matched to the window so the image stays
  /// undistorted; the camera aspect is fixed up separately.
  fn resize(&mut self, context: &State, size: PhysicalSize<u32>) {
    if let (Some(surface), Some(config)) = (self.surface.as_ref(), self.config.as_mut()) {
      config.width = size.width.max(1);
      config.height = size.height.max(1);
      surface.configure(&context.device, config);
    }
  }

  fn acquire(&mut self, context: &State) -> wgpu::SurfaceTexture {
    let surface = self.surface.as_ref().unwrap();

    match surface.get_current_texture() {
      Ok(frame) => frame,
      Err(wgpu::SurfaceError::Timeout) => surface.get_current_texture().unwrap(),
      Err(
        wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost | wgpu::SurfaceError::OutOfMemory,
      ) => {
        surface.configure(&context.device, self.config());
        surface.get_current_texture().unwrap()
      }
    }
  }

  fn suspend(&mut self) {}

  fn config(&self) -> &wgpu::SurfaceConfiguration {
    self.config.as_ref().unwrap()
  }
}

/// One ambient term plus one directional light whose direction tracks the
/// camera, as the original scene repositioned its shadow-casting light
/// together with the view.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct LightUniform {
  direction: [f32; 3],
  ambient: f32,
  color: [f32; 3],
  intensity: f32,
}

impl LightUniform {
  fn new() -> Self {
    Self {
      direction: [0.0, 0.0, 1.0],
      ambient: 0.3,
      color: [1.0, 1.0, 1.0],
      intensity: 1.0,
    }
  }

  fn follow_camera(&mut self, camera: &Camera) {
    self.direction = (camera.target - camera.eye).normalize().into();
  }
}

struct State {
  instance: wgpu::Instance,
  adapter: wgpu::Adapter,
  device: wgpu::Device,
  queue: wgpu::Queue,
  camera: Camera,
  camera_uniform: CameraUniform,
  camera_buffer: wgpu::Buffer,
  light_uniform: LightUniform,
  light_buffer: wgpu::Buffer,
  scene_bind_group: wgpu::BindGroup,
  scene_bind_group_layout: wgpu::BindGroupLayout,
  camera_controller: CameraController,
}

impl State {
  fn input(&mut self, event: &WindowEvent) -> bool {
    self.camera_controller.process_events(event)
  }

  fn update(&mut self) {
    self.camera_controller.update_camera(&mut self.camera);
    self.camera_uniform.update_view_proj(&self.camera);
    self.light_uniform.follow_camera(&self.camera);
    self.queue.write_buffer(
      &self.camera_buffer,
      0,
      bytemuck::cast_slice(&[self.camera_uniform]),
    );
    self.queue.write_buffer(
      &self.light_buffer,
      0,
      bytemuck::cast_slice(&[self.light_uniform]),
    );
  }

  fn resize_viewport(&mut self, size: PhysicalSize<u32>) {
    self.camera.aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
  }

  async fn init(surface: &SurfaceWrapper, size: &PhysicalSize<u32>) -> Self {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: surface.surface.as_ref(),
        force_fallback_adapter: false,
      })
      .await
      .unwrap();

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await
      .unwrap();

    // The original view: 90 degree fov, eye 20 units behind the origin,
    // looking back at the cube.
    let camera = Camera {
      eye: (0.0, 0.0, -20.0).into(),
      target: (0.0, 0.0, 0.0).into(),
      up: cgmath::Vector3::unit_y(),
      aspect: size.width as f32 / size.height as f32,
      fovy: 90.0,
      znear: 0.1,
      zfar: 1000.0,
    };
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&camera);
    let mut light_uniform = LightUniform::new();
    light_uniform.follow_camera(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Light Buffer"),
      contents: bytemuck::cast_slice(&[light_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let scene_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
          wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
              ty: wgpu::BufferBindingType::Uniform,
              has_dynamic_offset: false,
              min_binding_size: None,
            },
            count: None,
          },
          wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
              ty: wgpu::BufferBindingType::Uniform,
              has_dynamic_offset: false,
              min_binding_size: None,
            },
            count: None,
          },
        ],
        label: Some("scene_bind_group_layout"),
      });
    let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &scene_bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: camera_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: light_buffer.as_entire_binding(),
        },
      ],
      label: Some("scene_bind_group"),
    });
    let camera_params = CameraParams::default();
    let camera_controller = CameraController::init(camera_params.speed, camera_params.rotational_speed);

    Self {
      instance,
      adapter,
      device,
      queue,
      camera,
      camera_uniform,
      camera_buffer,
      light_uniform,
      light_buffer,
      scene_bind_group,
      scene_bind_group_layout,
      camera_controller,
    }
  }
}

async fn start(mut params: SimParams) {
  let window_loop = EventLoopWrapper::new("Particle Bounce");
  let mut surface = SurfaceWrapper::new();
  let mut context = State::init(&surface, &window_loop.window.inner_size()).await;

  let mut rng = SmallRng::from_entropy();
  let mut sim = ParticleState::new(params.particle_count as usize);
  particles::generate(
    &mut sim,
    Vector3::new(0.0, 0.0, 0.0),
    params.lift_height(),
    params.cube_size,
    &mut rng,
  );
  let mut panel = Panel::new();
  let mut renderer: Option<Render> = None;

  let event_loop_function = EventLoop::run;
  let _ = (event_loop_function)(
    window_loop.event_loop,
    move |event, target: &EventLoopWindowTarget<()>| match event {
      Event::NewEvents(StartCause::Init) => {
        surface.resume(&context, window_loop.window.clone());
        if renderer.is_none() {
          renderer = Some(Render::init(
            surface.config(),
            &context.device,
            &context.scene_bind_group_layout,
            &sim,
            &params,
          ));
        }
      }
      Event::Suspended => {
        surface.suspend();
      }
      Event::WindowEvent { event, window_id } if window_id == window_loop.window.id() => {
        if let Some(change) = panel.process_events(&event, &mut params) {
          match change {
            PanelChange::ParticleRadius(radius) => {
              if let Some(renderer) = &renderer {
                renderer.set_point_size(&context.queue, radius);
              }
            }
            PanelChange::CubeSize(_) => {
              particles::generate(
                &mut sim,
                Vector3::new(0.0, 0.0, 0.0),
                params.lift_height(),
                params.cube_size,
                &mut rng,
              );
            }
            PanelChange::ParticleCount(count) => {
              sim.resize(count as usize);
              particles::generate(
                &mut sim,
                Vector3::new(0.0, 0.0, 0.0),
                params.lift_height(),
                params.cube_size,
                &mut rng,
              );
              if let Some(renderer) = &mut renderer {
                renderer.resize(&context.device, &sim);
              }
            }
          }
          return;
        }
        if !context.input(&event) {
          match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
              event:
                KeyEvent {
                  state: ElementState::Pressed,
                  physical_key: PhysicalKey::Code(KeyCode::Escape),
                  ..
                },
              ..
            } => target.exit(),
            WindowEvent::Resized(size) => {
              surface.resize(&context, size);
              context.resize_viewport(size);
              window_loop.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
              window_loop.window.request_redraw();
              if renderer.is_none() {
                return;
              }
              context.update();
              physics::step(&mut sim, &params);
              if let Some(renderer) = &renderer {
                renderer.sync(&context.queue, &sim);
                let frame = surface.acquire(&context);
                let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
                  format: Some(surface.config().view_formats[0]),
                  ..wgpu::TextureViewDescriptor::default()
                });
                renderer.render(&view, &context.device, &context.queue, &context.scene_bind_group);
                frame.present();
              }
            }
            _ => {}
          }
        }
      }
      _ => {}
    },
  );
}

/// Steps the simulation without a window, reporting throughput once a
/// second. Ctrl-C stops the run early.
fn run_headless(params: &SimParams, steps: u64) {
  let running = Arc::new(AtomicBool::new(true));
  let handler_flag = running.clone();
  ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst)).unwrap();

  let mut rng = SmallRng::from_entropy();
  let mut sim = ParticleState::new(params.particle_count as usize);
  particles::generate(
    &mut sim,
    Vector3::new(0.0, 0.0, 0.0),
    params.lift_height(),
    params.cube_size,
    &mut rng,
  );

  let start = Instant::now();
  let mut last_report = Instant::now();
  let mut stepped = 0u64;
  for _ in 0..steps {
    if !running.load(Ordering::SeqCst) {
      info!("interrupted after {stepped} steps");
      break;
    }
    physics::step(&mut sim, params);
    stepped += 1;
    if last_report.elapsed().as_secs_f64() >= 1.0 {
      info!(
        "{stepped}/{steps} steps, {:.0} steps/s",
        stepped as f64 / start.elapsed().as_secs_f64()
      );
      last_report = Instant::now();
    }
  }
  info!(
    "{stepped} steps over {} particles in {:.2}s",
    sim.count(),
    start.elapsed().as_secs_f64()
  );
}

pub fn run(params: SimParams, headless: bool, steps: u64) {
  env_logger::init();
  if headless {
    run_headless(&params, steps);
  } else {
    pollster::block_on(start(params));
  }
}
