//! Step the zoom viewport with synthetic wheel events.

use trimline_common::config::AppConfig;
use trimline_common::error::TrimlineError;
use trimline_common::timecode::format_timecode;
use trimline_timeline_model::{ViewportState, ZoomViewport};

pub struct ZoomArgs {
    pub duration: f64,
    pub fps: f64,
    pub width: f64,
    pub steps: u32,
    pub pointer: Option<f64>,
    pub zoom_out: bool,
    pub json: bool,
}

pub fn run(config: &AppConfig, args: ZoomArgs) -> anyhow::Result<()> {
    if args.width.is_nan() || args.width <= 0.0 {
        return Err(TrimlineError::viewport("strip width must be positive").into());
    }

    let mut viewport =
        ZoomViewport::from_config(args.duration, args.fps, args.width, &config.viewport);
    let pointer = args.pointer.unwrap_or(args.width / 2.0);
    let delta_sign = if args.zoom_out { 1.0 } else { -1.0 };
    let fps = viewport.effective_fps();

    if !args.json {
        println!(
            "Viewport: {:.3}s @ {}fps, {} slots, min visible {:.3}s",
            viewport.total_duration(),
            fps,
            viewport.slot_count(),
            viewport.min_visible_duration()
        );
        println!("Pointer: {pointer:.1}px of {:.1}px", args.width);
        println!();
    }

    print_state(0, &viewport.snapshot(), fps, args.json)?;
    for step in 1..=args.steps {
        viewport.handle_wheel(pointer, delta_sign, args.width);
        print_state(step, &viewport.snapshot(), fps, args.json)?;
    }

    Ok(())
}

fn print_state(step: u32, state: &ViewportState, fps: f64, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(state)?);
        return Ok(());
    }
    let first = state.timestamps.first().copied().unwrap_or(0.0);
    let last = state.timestamps.last().copied().unwrap_or(0.0);
    println!(
        "[{step:>2}] start {:>10.3}s  duration {:>10.3}s  zoom {:>5.1}%  slots {} .. {}",
        state.start_secs,
        state.duration_secs,
        state.zoom_level * 100.0,
        format_timecode(first, fps),
        format_timecode(last, fps)
    );
    Ok(())
}
