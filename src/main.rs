use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use particle_bounce::SimParams;
use std::io;

/// Falling cube of bouncing particles
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Number of particles in the cube
  #[arg(short, long, default_value_t = 1000)]
  particles: u32,
  /// Half extent of the initial cube
  #[arg(short, long, default_value_t = 10.0)]
  cube_size: f32,
  /// Particle radius, visual and collision
  #[arg(short, long, default_value_t = 0.5)]
  radius: f32,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Number of steps to run in headless mode
  #[arg(long, default_value_t = 1000)]
  steps: u64,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

fn main() {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return;
  }

  let params = SimParams {
    particle_radius: args.radius,
    cube_size: args.cube_size,
    particle_count: args.particles,
    ..SimParams::default()
  };
  particle_bounce::state::run(params, args.headless, args.steps);
}
