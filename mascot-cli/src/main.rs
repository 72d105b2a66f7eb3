//! Mascot CLI Tool
//!
//! Command-line interface for inspecting agents, rendering animations to
//! frames and running command scripts against a headless agent.

mod logging;
mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logging::LogFormat;
use mascot_agent::{loader, Agent, AgentConfig, AgentOptions, RasterSurface, Surface};
use mascot_core::AnimationTable;
use script::Command;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mascot")]
#[command(about = "Mascot - animated sprite-sheet desktop assistant")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Where to find the agent
#[derive(clap::Args)]
struct AgentArgs {
    /// Directory containing `agents/<name>/map.png`
    #[arg(long, default_value = ".")]
    base_path: PathBuf,

    /// Agent name
    #[arg(long, default_value = mascot_core::sprites::CLIPPY)]
    agent: String,

    /// JSON file with agent configuration overrides
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about an agent
    Info {
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Write an agent's animation table as JSON
    Table {
        #[command(flatten)]
        agent: AgentArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render one animation to PNG frames
    Render {
        #[command(flatten)]
        agent: AgentArgs,

        /// Animation to render
        #[arg(short, long)]
        animation: String,

        /// Output directory for frames
        #[arg(short, long)]
        output: PathBuf,

        /// Viewport size, WIDTHxHEIGHT
        #[arg(long, default_value = "400x300", value_parser = parse_viewport)]
        viewport: (u32, u32),

        /// Frames per second to sample
        #[arg(long, default_value = "25")]
        fps: u32,
    },

    /// Run a command script against the agent
    Run {
        #[command(flatten)]
        agent: AgentArgs,

        /// Script file
        script: PathBuf,

        /// Viewport size, WIDTHxHEIGHT
        #[arg(long, default_value = "800x600", value_parser = parse_viewport)]
        viewport: (u32, u32),

        /// Also write sampled PNG frames to this directory
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Frames per second to sample when writing frames
        #[arg(long, default_value = "25")]
        fps: u32,
    },
}

fn parse_viewport(value: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = w.parse().map_err(|e| format!("invalid width '{w}': {e}"))?;
    let height = h.parse().map_err(|e| format!("invalid height '{h}': {e}"))?;
    Ok((width, height))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_format)?;

    match cli.command {
        Commands::Info { agent } => show_info(&agent)?,
        Commands::Table { agent, output } => export_table(&agent, output)?,
        Commands::Render {
            agent,
            animation,
            output,
            viewport,
            fps,
        } => render_animation(&agent, &animation, &output, viewport, fps)?,
        Commands::Run {
            agent,
            script,
            viewport,
            frames,
            fps,
        } => run_script(&agent, &script, viewport, frames, fps)?,
    }

    Ok(())
}

fn agent_options(args: &AgentArgs) -> Result<AgentOptions> {
    let config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config {}", path.display()))?;
            serde_json::from_reader::<_, AgentConfig>(BufReader::new(file))
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => AgentConfig::default(),
    };

    Ok(AgentOptions::new(&args.base_path)
        .with_agent(&args.agent)
        .with_config(config))
}

fn show_info(args: &AgentArgs) -> Result<()> {
    let options = agent_options(args)?;
    let loaded = loader::load_agent(&options).context("Failed to load agent")?;

    println!("\n=== Agent Information ===");
    println!("Name: {}", options.agent_name);
    println!("Sprite sheet: {}", loaded.sheet.path().display());
    println!(
        "Sheet size: {}x{}",
        loaded.sheet.width(),
        loaded.sheet.height()
    );
    let frame_size = loaded.table.frame_size();
    println!("Frame size: {}x{}", frame_size.width, frame_size.height);
    print_animations(&loaded.table);

    Ok(())
}

fn print_animations(table: &AnimationTable) {
    println!("\n=== Animations ({}) ===", table.len());
    for animation in table.iter() {
        println!(
            "  {}: {} frames, {} ms, {:?}",
            animation.name,
            animation.frames.len(),
            animation.duration_ms(),
            animation.policy
        );
        for (i, frame) in animation.frames.iter().enumerate() {
            println!(
                "    [{}] {}ms at ({}, {}) offset ({}, {})",
                i,
                frame.duration_ms,
                frame.region.x,
                frame.region.y,
                frame.offset.dx,
                frame.offset.dy
            );
        }
    }
}

fn export_table(args: &AgentArgs, output: Option<PathBuf>) -> Result<()> {
    let table = loader::load_animation_table(&args.base_path, &args.agent)
        .context("Failed to load animation table")?;

    match output {
        Some(path) => {
            let file = File::create(&path).context("Failed to create output file")?;
            table
                .write_json(BufWriter::new(file))
                .context("Failed to write animation table")?;
            println!("Wrote {} animations to {}", table.len(), path.display());
        }
        None => {
            table
                .write_json(std::io::stdout().lock())
                .context("Failed to write animation table")?;
            println!();
        }
    }

    Ok(())
}

fn render_animation(
    args: &AgentArgs,
    animation: &str,
    output_dir: &Path,
    viewport: (u32, u32),
    fps: u32,
) -> Result<()> {
    let options = agent_options(args)?;
    let loaded = loader::load_agent(&options).context("Failed to load agent")?;
    let id = loaded
        .table
        .require(animation)
        .context("Cannot render animation")?;
    let duration_ms = loaded.table.get(id).duration_ms();

    let surface = RasterSurface::new(&loaded.sheet, viewport);
    let mut config = options.config.clone();
    config.viewport = Some(viewport);
    let mut agent = Agent::new(loaded.table, config, surface);

    // Attach without the idle animation so only the requested one plays
    agent.surface_mut().attach_root();
    let completion = agent.play(animation);

    std::fs::create_dir_all(output_dir).context("Failed to create output directory")?;
    println!(
        "Rendering '{}' ({} ms) to {}",
        animation,
        duration_ms,
        output_dir.display()
    );

    let step_ms = frame_step_ms(fps);
    let mut index = 0u64;
    loop {
        write_frame(&agent, output_dir, index)?;
        index += 1;
        if completion.is_resolved() {
            break;
        }
        agent.advance_by(step_ms);
    }

    println!("Successfully wrote {} frames", index);
    Ok(())
}

fn run_script(
    args: &AgentArgs,
    script_path: &Path,
    viewport: (u32, u32),
    frames_dir: Option<PathBuf>,
    fps: u32,
) -> Result<()> {
    let source = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read script {}", script_path.display()))?;
    let commands = script::parse_script(&source).context("Failed to parse script")?;
    tracing::info!(script = %script_path.display(), commands = commands.len(), "Script parsed");

    let mut options = agent_options(args)?;
    options.config.viewport = Some(viewport);
    let loaded = loader::load_agent(&options).context("Failed to load agent")?;
    let mut agent = Agent::new(
        loaded.table,
        options.config.clone(),
        RasterSurface::new(&loaded.sheet, viewport),
    );

    if let Some(dir) = &frames_dir {
        std::fs::create_dir_all(dir).context("Failed to create frames directory")?;
    }

    let step_ms = frame_step_ms(fps);
    let mut frame_index = 0u64;

    for command in &commands {
        match command {
            Command::Wait(wait_ms) => {
                let until = wait_deadline(agent.now(), *wait_ms);
                match &frames_dir {
                    Some(dir) => {
                        while agent.now() < until {
                            write_frame(&agent, dir, frame_index)?;
                            frame_index += 1;
                            agent.advance_by(step_ms.min(until - agent.now()));
                        }
                    }
                    None => agent.advance_to(until),
                }
            }
            other => script::apply(&mut agent, other),
        }
        print_state(&agent, command);
    }

    if let Some(dir) = &frames_dir {
        write_frame(&agent, dir, frame_index)?;
        println!("Wrote {} frames to {}", frame_index + 1, dir.display());
    }

    Ok(())
}

fn print_state<S: Surface>(agent: &Agent<S>, command: &Command) {
    let animation = agent
        .active_animation()
        .map(|(def, frame)| format!("{}[{}]", def.name, frame))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "[{:>6} ms] {:<40} visible={} animation={} queued={} position=({}) bubbles={}",
        agent.now(),
        format!("{command:?}"),
        agent.is_visible(),
        animation,
        agent.pending_len(),
        agent.rendered_position(),
        agent.bubble_count()
    );
}

fn wait_deadline(now_ms: u64, wait_ms: u64) -> u64 {
    now_ms.saturating_add(wait_ms)
}

fn frame_step_ms(fps: u32) -> u64 {
    (1000 / fps.max(1) as u64).max(1)
}

fn write_frame(agent: &Agent<RasterSurface>, dir: &Path, index: u64) -> Result<()> {
    let frame: image::RgbaImage = agent.surface().compose(agent.now());
    let path = dir.join(format!("frame_{:06}.png", index));
    frame.save(&path).context("Failed to save frame")?;
    Ok(())
}
