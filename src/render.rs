use crate::{particles::ParticleState, SimParams};
use std::borrow::Cow;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

/// Point color from the original demo, 0xff6347 (tomato).
const POINT_COLOR: [f32; 4] = [1.0, 0.388, 0.278, 1.0];

/// Reference grid over the ground plane: total extent and line count per
/// axis, matching a 100 x 100 grid helper.
const GRID_SIZE: f32 = 100.0;
const GRID_DIVISIONS: u32 = 100;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
  color: [f32; 4],
}

/// The three corners of the billboard triangle each particle is drawn as.
/// Perspective projection supplies the size attenuation; the visual size is
/// the particle radius and is rewritten in place when it changes.
fn corner_vertices(size: f32) -> [f32; 9] {
  [
    -0.866 * size,
    -0.5 * size,
    0.0,
    0.866 * size,
    -0.5 * size,
    0.0,
    0.0,
    size,
    0.0,
  ]
}

/// Line-list vertices for the ground reference grid on y = 0.
fn grid_vertices() -> Vec<f32> {
  let half = GRID_SIZE / 2.0;
  let step = GRID_SIZE / GRID_DIVISIONS as f32;
  let mut vertices = Vec::with_capacity(((GRID_DIVISIONS + 1) * 4 * 3) as usize);
  for i in 0..=GRID_DIVISIONS {
    let offset = -half + i as f32 * step;
    // Line along x, then along z.
    vertices.extend_from_slice(&[-half, 0.0, offset, half, 0.0, offset]);
    vertices.extend_from_slice(&[offset, 0.0, -half, offset, 0.0, half]);
  }
  vertices
}

/// Owns everything GPU-visible about the particles: the position buffer the
/// simulation state is uploaded into, the billboard geometry, the material,
/// and the ground grid. The simulation owns the canonical buffers; this
/// bridge only ever receives explicit re-upload calls, it never polls.
pub struct Render {
  positions_buffer: wgpu::Buffer,
  corner_buffer: wgpu::Buffer,
  grid_buffer: wgpu::Buffer,
  grid_vertex_count: u32,
  material_bind_group: wgpu::BindGroup,
  particle_pipeline: wgpu::RenderPipeline,
  grid_pipeline: wgpu::RenderPipeline,
  particle_count: u32,
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    scene_bind_group_layout: &wgpu::BindGroupLayout,
    state: &ParticleState,
    params: &SimParams,
  ) -> Self {
    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: None,
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/draw.wgsl"))),
    });
    let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: None,
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/grid.wgsl"))),
    });

    let material = MaterialUniform { color: POINT_COLOR };
    let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Material Buffer"),
      contents: bytemuck::cast_slice(&[material]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let material_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::FRAGMENT,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("material_bind_group_layout"),
      });
    let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &material_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: material_buffer.as_entire_binding(),
      }],
      label: Some("material_bind_group"),
    });

    let particle_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("particles"),
      bind_group_layouts: &[scene_bind_group_layout, &material_bind_group_layout],
      push_constant_ranges: &[],
    });
    let instance_buffer_layout = wgpu::VertexBufferLayout {
      array_stride: 3 * 4,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    };
    let corner_buffer_layout = wgpu::VertexBufferLayout {
      array_stride: 3 * 4,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![1 => Float32x3],
    };
    let particle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Particle Pipeline"),
      layout: Some(&particle_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[instance_buffer_layout, corner_buffer_layout],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(config.view_formats[0].into())],
      }),
      primitive: wgpu::PrimitiveState::default(),
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let grid_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("grid"),
      bind_group_layouts: &[scene_bind_group_layout],
      push_constant_ranges: &[],
    });
    let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Grid Pipeline"),
      layout: Some(&grid_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &grid_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[wgpu::VertexBufferLayout {
          array_stride: 3 * 4,
          step_mode: wgpu::VertexStepMode::Vertex,
          attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        }],
      },
      fragment: Some(wgpu::FragmentState {
        module: &grid_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(config.view_formats[0].into())],
      }),
      primitive: wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::LineList,
        ..Default::default()
      },
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let corner_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Corner Buffer"),
      contents: bytemuck::bytes_of(&corner_vertices(params.particle_radius)),
      usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    });

    let grid_data = grid_vertices();
    let grid_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Grid Buffer"),
      contents: bytemuck::cast_slice(&grid_data),
      usage: wgpu::BufferUsages::VERTEX,
    });

    let positions_buffer = Self::create_positions_buffer(device, state);

    Render {
      positions_buffer,
      corner_buffer,
      grid_buffer,
      grid_vertex_count: (grid_data.len() / 3) as u32,
      material_bind_group,
      particle_pipeline,
      grid_pipeline,
      particle_count: state.count() as u32,
    }
  }

  fn create_positions_buffer(device: &wgpu::Device, state: &ParticleState) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Particle Positions Buffer"),
      contents: bytemuck::cast_slice(&state.positions),
      usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
  }

  /// Re-uploads the canonical positions after an in-place mutation. Must be
  /// called once per physics step; the draw call reads whatever was uploaded
  /// last.
  pub fn sync(&self, queue: &wgpu::Queue, state: &ParticleState) {
    queue.write_buffer(
      &self.positions_buffer,
      0,
      bytemuck::cast_slice(&state.positions),
    );
  }

  /// Visual size only; the collision radius is read from `SimParams` by the
  /// stepper.
  pub fn set_point_size(&self, queue: &wgpu::Queue, radius: f32) {
    queue.write_buffer(
      &self.corner_buffer,
      0,
      bytemuck::bytes_of(&corner_vertices(radius)),
    );
  }

  /// Replaces the GPU position buffer after a particle-count change. The old
  /// buffer is dropped and a fresh one created from the regenerated state, so
  /// the next draw never sees a partially sized buffer.
  pub fn resize(&mut self, device: &wgpu::Device, state: &ParticleState) {
    self.positions_buffer = Self::create_positions_buffer(device, state);
    self.particle_count = state.count() as u32;
  }

  pub fn render(
    &self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    scene_bind_group: &wgpu::BindGroup,
  ) {
    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      rpass.set_pipeline(&self.grid_pipeline);
      rpass.set_bind_group(0, scene_bind_group, &[]);
      rpass.set_vertex_buffer(0, self.grid_buffer.slice(..));
      rpass.draw(0..self.grid_vertex_count, 0..1);

      rpass.set_pipeline(&self.particle_pipeline);
      rpass.set_bind_group(0, scene_bind_group, &[]);
      rpass.set_bind_group(1, &self.material_bind_group, &[]);
      rpass.set_vertex_buffer(0, self.positions_buffer.slice(..));
      rpass.set_vertex_buffer(1, self.corner_buffer.slice(..));
      rpass.draw(0..3, 0..self.particle_count);
    }
    queue.submit(Some(command_encoder.finish()));
  }
}
