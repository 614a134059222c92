//! Fill the thumbnail cache from a synthetic source and report what happened.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast::error::TryRecvError;

use trimline_common::config::AppConfig;
use trimline_common::timecode::format_timecode;
use trimline_session::{MediaInfo, TrimSession};
use trimline_thumbnail_engine::backend::{SyntheticDecoderConfig, SyntheticFactory};
use trimline_thumbnail_engine::{EngineEvent, PoolStatus};
use trimline_timeline_model::{SourceDescriptor, SourceIdentity};

pub struct ThumbsArgs {
    pub duration: f64,
    pub fps: f64,
    pub width: f64,
    pub latency_ms: u64,
    pub pool: Option<usize>,
    pub zoom_steps: u32,
    pub frame_signal: bool,
}

#[derive(Debug, Default)]
struct EventTally {
    batches: usize,
    merged: usize,
    failed: usize,
}

impl EventTally {
    fn record(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::BatchMerged { timestamps } => {
                self.batches += 1;
                self.merged += timestamps.len();
            }
            EngineEvent::DecodeFailed { .. } => self.failed += 1,
            _ => {}
        }
    }
}

pub async fn run(mut config: AppConfig, args: ThumbsArgs) -> anyhow::Result<()> {
    if let Some(pool) = args.pool {
        config.thumbnails.pool_size = pool;
    }

    let mut decoder = SyntheticDecoderConfig::from_config(&config.thumbnails);
    decoder.seek_latency = Duration::from_millis(args.latency_ms);
    decoder.signals_frame_ready = args.frame_signal;
    let factory = Arc::new(SyntheticFactory::new(decoder));

    let name = format!("synthetic-{:.0}s.mp4", args.duration);
    let source = SourceDescriptor::new(
        SourceIdentity::from_metadata(&name, (args.duration * 1_000_000.0) as u64, Utc::now()),
        format!("synthetic://{name}"),
    );
    println!("Source: {} ({})", source.identity, source.locator);

    let started = Instant::now();
    let mut session = TrimSession::load(
        source,
        MediaInfo::new(args.duration, args.fps),
        args.width,
        factory,
        &config,
    )
    .await?;
    let mut events = session.events();
    let fps = session.media().fps;

    let status = session.engine().status();
    match status {
        PoolStatus::Ready { units } => {
            println!("Pool: ready with {units}/{} units", config.thumbnails.pool_size)
        }
        status => {
            println!("Pool: {status:?}, no thumbnails will be produced");
            session.close();
            return Ok(());
        }
    }

    session.engine().wait_idle().await;
    report(&session, fps, started.elapsed());

    for step in 1..=args.zoom_steps {
        let before = session.engine().cached_count();
        session.wheel(args.width / 2.0, -1.0);
        session.engine().wait_idle().await;
        let state = session.viewport_state();
        println!(
            "Zoom step {step}: {:.3}s visible, {} new thumbnails",
            state.duration_secs,
            session.engine().cached_count() - before
        );
    }
    if args.zoom_steps > 0 {
        report(&session, fps, started.elapsed());
    }

    let mut tally = EventTally::default();
    loop {
        match events.try_recv() {
            Ok(event) => tally.record(&event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event receiver lagged");
            }
            Err(_) => break,
        }
    }
    println!();
    println!(
        "Events: {} batches, {} thumbnails merged, {} decode failures",
        tally.batches, tally.merged, tally.failed
    );

    session.close();
    Ok(())
}

fn report(session: &TrimSession, fps: f64, elapsed: Duration) {
    let thumbs = session.refresh_thumbnails();
    println!();
    println!(
        "Visible strip ({} of {} cached, {} total, {:.1?} elapsed):",
        thumbs.len(),
        session.viewport_state().slot_count,
        session.engine().cached_count(),
        elapsed
    );
    for (t, thumb) in &thumbs {
        println!(
            "  {}  {}x{}  {} bytes",
            format_timecode(*t, fps),
            thumb.width,
            thumb.height,
            thumb.byte_len()
        );
    }
}
