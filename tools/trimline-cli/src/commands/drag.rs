//! Simulate a marker drag and print the resulting selection.

use std::sync::{Arc, Mutex};

use trimline_common::config::AppConfig;
use trimline_common::timecode::format_timecode;
use trimline_scrub_control::{
    DragHost, FullRange, RecordingHost, SelectionController, ViewportRange, VisibleRangeSource,
};
use trimline_timeline_model::{MarkerKind, SelectionRange, ZoomViewport};

pub struct DragArgs {
    pub duration: f64,
    pub fps: f64,
    pub marker: MarkerKind,
    pub from: f64,
    pub to: f64,
    pub width: f64,
    pub moves: u32,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub zoomed: Option<(f64, f64)>,
    pub json: bool,
}

pub fn run(config: &AppConfig, args: DragArgs) -> anyhow::Result<()> {
    let host = RecordingHost::new();
    let selection = SelectionRange::new(
        args.start.unwrap_or(0.0),
        args.end.unwrap_or(args.duration),
    );

    let selection = match args.zoomed {
        Some((start, duration)) => {
            let mut viewport = ZoomViewport::from_config(
                args.duration,
                args.fps,
                args.width,
                &config.viewport,
            );
            viewport.set_visible_range(start, duration);
            let range = ViewportRange::new(Arc::new(Mutex::new(viewport)));
            let visible = range.visible_range();
            println!(
                "Surface: zoomed strip {:.3}s .. {:.3}s",
                visible.start_secs,
                visible.end_secs()
            );
            drag(SelectionController::new(range, host.clone()), selection, &args)
        }
        None => {
            println!("Surface: full scrubber 0s .. {:.3}s", args.duration);
            drag(
                SelectionController::new(FullRange::new(args.duration, args.fps), host.clone()),
                selection,
                &args,
            )
        }
    };

    if args.json {
        for event in host.events() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    println!();
    println!(
        "Selection: {:.3}s .. {:.3}s ({:.3}s)",
        selection.start_secs(),
        selection.end_secs(),
        selection.duration_secs()
    );
    println!("{}", serde_json::to_string_pretty(&selection)?);
    Ok(())
}

fn drag<R: VisibleRangeSource, H: DragHost>(
    mut controller: SelectionController<R, H>,
    mut selection: SelectionRange,
    args: &DragArgs,
) -> SelectionRange {
    let fps = controller.range().fps();
    let moves = args.moves.max(1);

    controller.pointer_down(args.marker);
    for i in 1..=moves {
        let x = args.from + (args.to - args.from) * f64::from(i) / f64::from(moves);
        let before = controller.active_marker();
        if let Some(value) = controller.pointer_move(&mut selection, x, args.width) {
            let swapped = if controller.active_marker() != before {
                "  (swapped)"
            } else {
                ""
            };
            println!(
                "  move {x:>8.1}px -> {} [{:.3} .. {:.3}]{swapped}",
                format_timecode(value, fps),
                selection.start_secs(),
                selection.end_secs()
            );
        }
    }
    controller.pointer_up();
    controller.destroy();
    selection
}
