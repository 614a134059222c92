//! Frame/time conversion and pointer-to-time mapping.
//!
//! All times are seconds as `f64`. Framerates are best-effort probe values;
//! anything non-positive or non-finite falls back to [`FALLBACK_FPS`].

/// Framerate used when the probe reports nothing usable.
pub const FALLBACK_FPS: f64 = 30.0;

/// Resolve a probed framerate to the one actually used for frame math.
pub fn effective_fps(fps: f64) -> f64 {
    if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        FALLBACK_FPS
    }
}

/// Round `t` to the nearest frame boundary and clamp it into `[0, duration]`.
///
/// The end of the source counts as a boundary even when it falls between
/// frames, which keeps the function idempotent for clamped values.
pub fn snap_time_to_frame(t: f64, fps: f64, duration: f64) -> f64 {
    let fps = effective_fps(fps);
    let duration = if duration.is_finite() {
        duration.max(0.0)
    } else {
        0.0
    };
    if !t.is_finite() {
        return 0.0;
    }
    let snapped = ((t * fps).round() / fps).clamp(0.0, duration);
    if (duration - t).abs() < (t - snapped).abs() {
        duration
    } else {
        snapped
    }
}

/// Frame index nearest to `t`.
pub fn time_to_frame(t: f64, fps: f64) -> i64 {
    (t * effective_fps(fps)).round() as i64
}

/// Start time of frame `frame`.
pub fn frame_to_time(frame: i64, fps: f64) -> f64 {
    frame as f64 / effective_fps(fps)
}

/// Map a pixel offset inside a container to a time in the visible range.
///
/// The pointer fraction is clamped to `[0, 1]`, so dragging past either edge
/// pins to the range boundary. A collapsed container maps to `visible_start`.
pub fn map_pointer_to_time(
    pixel_x: f64,
    container_width: f64,
    visible_start: f64,
    visible_end: f64,
) -> f64 {
    if container_width.is_nan() || container_width <= 0.0 || pixel_x.is_nan() {
        return visible_start;
    }
    let fraction = (pixel_x / container_width).clamp(0.0, 1.0);
    visible_start + fraction * (visible_end - visible_start)
}

/// Inverse of [`map_pointer_to_time`]: pixel offset of `t` inside the container.
///
/// Not clamped; times outside the visible range land off-screen.
pub fn time_to_pointer(t: f64, container_width: f64, visible_start: f64, visible_end: f64) -> f64 {
    let span = visible_end - visible_start;
    if container_width.is_nan() || container_width <= 0.0 || span.is_nan() || span <= 0.0 {
        return 0.0;
    }
    (t - visible_start) / span * container_width
}

/// Format `t` as `HH:MM:SS:FF` using the effective framerate.
pub fn format_timecode(t: f64, fps: f64) -> String {
    let fps = effective_fps(fps);
    let fps_whole = fps.round().max(1.0) as i64;
    let total_frames = time_to_frame(t.max(0.0), fps);
    let frames = total_frames % fps_whole;
    let total_secs = total_frames / fps_whole;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours:02}:{mins:02}:{secs:02}:{frames:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_effective_fps_fallback() {
        assert_eq!(effective_fps(0.0), 30.0);
        assert_eq!(effective_fps(-24.0), 30.0);
        assert_eq!(effective_fps(f64::NAN), 30.0);
        assert_eq!(effective_fps(24.0), 24.0);
    }

    #[test]
    fn test_snap_rounds_to_nearest_frame() {
        // 1.03s at 25fps is frame 25.75 -> 26 -> 1.04s
        let snapped = snap_time_to_frame(1.03, 25.0, 10.0);
        assert!((snapped - 1.04).abs() < 1e-9);
        let snapped = snap_time_to_frame(1.01, 25.0, 10.0);
        assert!((snapped - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_snap_clamps_to_duration() {
        assert_eq!(snap_time_to_frame(-3.0, 30.0, 10.0), 0.0);
        assert_eq!(snap_time_to_frame(12.0, 30.0, 10.0), 10.0);
        // Duration not on a frame boundary
        assert_eq!(snap_time_to_frame(9.999, 30.0, 9.99), 9.99);
        // Nearer the end than the previous frame boundary
        assert_eq!(snap_time_to_frame(9.979, 30.0, 9.98), 9.98);
        assert_eq!(snap_time_to_frame(9.98, 30.0, 9.98), 9.98);
    }

    #[test]
    fn test_frame_conversions() {
        assert_eq!(time_to_frame(2.0, 24.0), 48);
        assert!((frame_to_time(48, 24.0) - 2.0).abs() < 1e-12);
        assert_eq!(time_to_frame(1.0, 0.0), 30);
        assert!((frame_to_time(15, -1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_map_pointer_to_time() {
        assert!((map_pointer_to_time(50.0, 100.0, 10.0, 20.0) - 15.0).abs() < 1e-12);
        assert_eq!(map_pointer_to_time(-20.0, 100.0, 10.0, 20.0), 10.0);
        assert_eq!(map_pointer_to_time(500.0, 100.0, 10.0, 20.0), 20.0);
        assert_eq!(map_pointer_to_time(50.0, 0.0, 10.0, 20.0), 10.0);
        assert_eq!(map_pointer_to_time(50.0, -5.0, 10.0, 20.0), 10.0);
    }

    #[test]
    fn test_time_to_pointer_inverts_mapping() {
        let px = time_to_pointer(15.0, 100.0, 10.0, 20.0);
        assert!((px - 50.0).abs() < 1e-9);
        assert_eq!(time_to_pointer(15.0, 0.0, 10.0, 20.0), 0.0);
    }

    #[test]
    fn test_format_timecode() {
        assert_eq!(format_timecode(0.0, 30.0), "00:00:00:00");
        assert_eq!(format_timecode(61.5, 30.0), "00:01:01:15");
        assert_eq!(format_timecode(3723.0, 0.0), "01:02:03:00");
    }

    proptest! {
        #[test]
        fn prop_snap_is_idempotent_and_bounded(
            t in -100.0f64..1000.0,
            fps in -60.0f64..120.0,
            duration in 0.0f64..900.0,
        ) {
            let once = snap_time_to_frame(t, fps, duration);
            let twice = snap_time_to_frame(once, fps, duration);
            prop_assert!(once >= 0.0 && once <= duration);
            prop_assert!((once - twice).abs() < 1e-9);
        }

        #[test]
        fn prop_non_positive_fps_behaves_as_thirty(
            t in 0.0f64..500.0,
            fps in -120.0f64..=0.0,
            frame in 0i64..100_000,
        ) {
            prop_assert_eq!(time_to_frame(t, fps), time_to_frame(t, 30.0));
            prop_assert_eq!(frame_to_time(frame, fps), frame_to_time(frame, 30.0));
            prop_assert_eq!(
                snap_time_to_frame(t, fps, 500.0),
                snap_time_to_frame(t, 30.0, 500.0)
            );
        }

        #[test]
        fn prop_pointer_mapping_stays_in_range(
            x in -1000.0f64..3000.0,
            width in 1.0f64..2000.0,
            start in 0.0f64..100.0,
            span in 0.0f64..100.0,
        ) {
            let t = map_pointer_to_time(x, width, start, start + span);
            prop_assert!(t >= start - 1e-9 && t <= start + span + 1e-9);
        }
    }
}
