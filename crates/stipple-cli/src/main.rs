//! Stipple CLI - Command-line interface for the Stipple particle engine

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{play, render, sample};

#[derive(Parser)]
#[command(name = "stipple")]
#[command(about = "Particle-image transitions: sample, render, play", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample an image into a point cloud and report the result
    Sample {
        /// Image path or http(s) URL
        image: String,

        /// Display width in pixels the grid is sized for
        #[arg(long, default_value = "800")]
        width: f32,

        /// Grid stride in pixels between sampled points
        #[arg(long, default_value = "6")]
        gap: f32,

        /// Brightness multiplier applied to sampled colors
        #[arg(long, default_value = "1.0")]
        boost_mult: f32,

        /// Gamma lift applied to sampled colors
        #[arg(long, default_value = "1.0")]
        boost_gamma: f32,

        /// Output format (summary or json)
        #[arg(long, default_value = "summary")]
        format: String,
    },

    /// Render transitions to PNG frames (headless)
    Render {
        /// Image paths or URLs, morphed in playlist order
        #[arg(required = true)]
        images: Vec<String>,

        /// Output directory for frames
        #[arg(short, long, default_value = "frames")]
        output: String,

        /// Frames to simulate per image
        #[arg(long, default_value = "120")]
        frames: u32,

        /// Surface size as WxH
        #[arg(long, default_value = "800x600", value_parser = parse_size)]
        size: (u32, u32),

        /// Write every Nth frame (1 writes all)
        #[arg(long, default_value = "1")]
        stride: u32,

        /// Path to engine config file
        #[arg(long)]
        config: Option<String>,
    },

    /// Open a window and play transitions interactively
    Play {
        /// Image paths or URLs, advanced with space or click
        #[arg(required = true)]
        images: Vec<String>,

        /// Re-sample when a watched source file changes
        #[arg(long)]
        watch: bool,

        /// Path to engine config file
        #[arg(long)]
        config: Option<String>,
    },
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("expected WxH (e.g. 800x600), got '{}'", s));
    }
    let w: u32 = parts[0].trim().parse().map_err(|e| format!("invalid width: {}", e))?;
    let h: u32 = parts[1].trim().parse().map_err(|e| format!("invalid height: {}", e))?;
    if w == 0 || h == 0 {
        return Err("size must be non-zero".to_string());
    }
    Ok((w, h))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample {
            image,
            width,
            gap,
            boost_mult,
            boost_gamma,
            format,
        } => sample::run(sample::SampleArgs {
            image,
            width,
            gap,
            boost_mult,
            boost_gamma,
            format,
        }),
        Commands::Render {
            images,
            output,
            frames,
            size,
            stride,
            config,
        } => render::run(render::RenderArgs {
            images,
            output,
            frames,
            size,
            stride,
            config,
        }),
        Commands::Play {
            images,
            watch,
            config,
        } => play::run(play::PlayArgs {
            images,
            watch,
            config,
        }),
    }
}
