//! Trimline CLI: drive the timeline engine without a UI.
//!
//! Usage:
//!   trimline zoom [OPTIONS]      Step the zoom viewport with wheel events
//!   trimline thumbs [OPTIONS]    Fill the thumbnail cache from a synthetic source
//!   trimline drag [OPTIONS]      Simulate a marker drag
//!   trimline config [OPTIONS]    Show or save the effective configuration

use clap::{Parser, Subcommand, ValueEnum};

use trimline_common::config::AppConfig;
use trimline_common::logging::{cli_logging, init_logging};
use trimline_timeline_model::MarkerKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "trimline",
    about = "Zoomable, scrubbable trimming timeline with live thumbnails",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply wheel steps to the zoom viewport and print each state
    Zoom {
        /// Source duration (seconds)
        #[arg(long, default_value = "120")]
        duration: f64,

        /// Source framerate (0 = unknown)
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Strip width in pixels
        #[arg(long, default_value = "1636")]
        width: f64,

        /// Number of wheel steps
        #[arg(long, default_value = "3")]
        steps: u32,

        /// Pointer position in pixels (defaults to the strip center)
        #[arg(long)]
        pointer: Option<f64>,

        /// Zoom out instead of in
        #[arg(long)]
        out: bool,

        /// Print states as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Bind a synthetic source, request the visible strip, and report the cache
    Thumbs {
        /// Source duration (seconds)
        #[arg(long, default_value = "120")]
        duration: f64,

        /// Source framerate (0 = unknown)
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Strip width in pixels
        #[arg(long, default_value = "1636")]
        width: f64,

        /// Simulated seek latency per decode (milliseconds)
        #[arg(long, default_value = "5")]
        latency_ms: u64,

        /// Decode units (defaults to the configured pool size)
        #[arg(long)]
        pool: Option<usize>,

        /// Zoom-in steps to apply after the first strip loads
        #[arg(long, default_value = "0")]
        zoom_steps: u32,

        /// Simulate a decoder that never confirms frames
        #[arg(long)]
        no_frame_signal: bool,
    },

    /// Drag a selection marker across the timeline
    Drag {
        /// Source duration (seconds)
        #[arg(long, default_value = "120")]
        duration: f64,

        /// Source framerate (0 = unknown)
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Marker to drag
        #[arg(long, value_enum, default_value = "start")]
        marker: MarkerArg,

        /// Pointer position where the drag starts (pixels)
        #[arg(long)]
        from: f64,

        /// Pointer position where the drag ends (pixels)
        #[arg(long)]
        to: f64,

        /// Surface width in pixels
        #[arg(long, default_value = "1636")]
        width: f64,

        /// Pointer move events between `from` and `to`
        #[arg(long, default_value = "8")]
        moves: u32,

        /// Initial selection start (seconds)
        #[arg(long)]
        start: Option<f64>,

        /// Initial selection end (seconds)
        #[arg(long)]
        end: Option<f64>,

        /// Drag on a zoomed strip showing this range: START,DURATION
        #[arg(long, value_parser = parse_range)]
        zoomed: Option<(f64, f64)>,

        /// Print host callbacks as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the standard location
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MarkerArg {
    Start,
    End,
}

impl From<MarkerArg> for MarkerKind {
    fn from(arg: MarkerArg) -> Self {
        match arg {
            MarkerArg::Start => MarkerKind::Start,
            MarkerArg::End => MarkerKind::End,
        }
    }
}

fn parse_range(value: &str) -> Result<(f64, f64), String> {
    let (start, duration) = value
        .split_once(',')
        .ok_or_else(|| format!("expected START,DURATION, got '{value}'"))?;
    let start = start
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid start: {e}"))?;
    let duration = duration
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid duration: {e}"))?;
    Ok((start, duration))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // --verbose overrides the configured logging section.
    if cli.verbose {
        init_logging(&cli_logging(true));
    } else {
        init_logging(&config.logging);
    }

    match cli.command {
        Commands::Zoom {
            duration,
            fps,
            width,
            steps,
            pointer,
            out,
            json,
        } => commands::zoom::run(
            &config,
            commands::zoom::ZoomArgs {
                duration,
                fps,
                width,
                steps,
                pointer,
                zoom_out: out,
                json,
            },
        ),
        Commands::Thumbs {
            duration,
            fps,
            width,
            latency_ms,
            pool,
            zoom_steps,
            no_frame_signal,
        } => {
            commands::thumbs::run(
                config,
                commands::thumbs::ThumbsArgs {
                    duration,
                    fps,
                    width,
                    latency_ms,
                    pool,
                    zoom_steps,
                    frame_signal: !no_frame_signal,
                },
            )
            .await
        }
        Commands::Drag {
            duration,
            fps,
            marker,
            from,
            to,
            width,
            moves,
            start,
            end,
            zoomed,
            json,
        } => commands::drag::run(
            &config,
            commands::drag::DragArgs {
                duration,
                fps,
                marker: marker.into(),
                from,
                to,
                width,
                moves,
                start,
                end,
                zoomed,
                json,
            },
        ),
        Commands::Config { save } => commands::config::run(&config, save),
    }
}
