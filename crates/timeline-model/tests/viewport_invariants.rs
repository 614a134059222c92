use proptest::prelude::*;

use trimline_common::timecode::time_to_pointer;
use trimline_timeline_model::viewport::{SlotGeometry, ZoomViewport};

#[derive(Debug, Clone)]
enum Interaction {
    Wheel { pointer_x: f64, delta: f64 },
    Range { start: f64, duration: f64 },
    Center { fraction: f64 },
    Pan { fraction: f64 },
}

fn interaction() -> impl Strategy<Value = Interaction> {
    prop_oneof![
        (-200.0f64..2000.0, prop_oneof![Just(-1.0), Just(1.0)])
            .prop_map(|(pointer_x, delta)| Interaction::Wheel { pointer_x, delta }),
        (-50.0f64..400.0, -10.0f64..500.0)
            .prop_map(|(start, duration)| Interaction::Range { start, duration }),
        (-0.5f64..1.5).prop_map(|fraction| Interaction::Center { fraction }),
        (-2.0f64..2.0).prop_map(|fraction| Interaction::Pan { fraction }),
    ]
}

proptest! {
    #[test]
    fn clamped_range_stays_inside_source(
        total in 0.5f64..600.0,
        fps in -10.0f64..120.0,
        width in -100.0f64..4000.0,
        steps in prop::collection::vec(interaction(), 1..40),
    ) {
        let mut vp = ZoomViewport::new(total, fps, SlotGeometry::new(width, 160.0, 4.0));
        for step in steps {
            match step {
                Interaction::Wheel { pointer_x, delta } => vp.handle_wheel(pointer_x, delta, width),
                Interaction::Range { start, duration } => vp.set_visible_range(start, duration),
                Interaction::Center { fraction } => vp.set_zoom_center(fraction),
                Interaction::Pan { fraction } => vp.pan_by(fraction),
            }
            let duration = vp.visible_duration();
            let start = vp.visible_start();
            prop_assert!(duration >= vp.min_visible_duration() - 1e-9);
            prop_assert!(duration <= total + 1e-9);
            prop_assert!(start >= 0.0);
            prop_assert!(start + duration <= total + 1e-6);
            let level = vp.zoom_level();
            prop_assert!((0.0..=1.0).contains(&level));
            for t in vp.timestamps() {
                prop_assert!(t >= start - 1e-9 && t <= total + 1e-9);
            }
        }
    }

    #[test]
    fn zoom_in_keeps_anchor_under_pointer(
        total in 10.0f64..600.0,
        width in 400.0f64..4000.0,
        fraction in 0.0f64..=1.0,
        start in 0.0f64..300.0,
        duration in 1.0f64..600.0,
    ) {
        let mut vp = ZoomViewport::new(total, 30.0, SlotGeometry::new(width, 160.0, 4.0));
        vp.set_visible_range(start, duration);
        let before = vp.visible_range();
        let pointer_x = fraction * width;
        let anchor = before.start_secs + fraction * before.duration_secs;

        vp.handle_wheel(pointer_x, -1.0, width);

        let after = vp.visible_range();
        let px = time_to_pointer(anchor, width, after.start_secs, after.end_secs());
        prop_assert!((px - pointer_x).abs() <= 1.0, "anchor drifted to {px} from {pointer_x}");
    }
}
