//! Headless demo: replays a short scripted session against a counting
//! surface and prints the resulting pattern snapshot as JSON.
//!
//! Configuration comes from `STITCH_*` environment variables; see
//! [`CanvasConfig::from_env`]. Set `RUST_LOG=debug` to watch gestures.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use stitchboard::canvas::{CanvasEvent, EventKind, InputEvent, StitchCanvas};
use stitchboard::config::CanvasConfig;
use stitchboard::geometry::{Bounds, DotIndex, Position, position_from_index};
use stitchboard::render::TallySurface;

/// Fake wall clock so the throttle sees realistic spacing between events.
struct Clock {
    start: Instant,
    elapsed: Duration,
}

impl Clock {
    fn new() -> Self {
        Self { start: Instant::now(), elapsed: Duration::ZERO }
    }

    fn advance(&mut self, millis: u64) -> Instant {
        self.elapsed += Duration::from_millis(millis);
        self.start + self.elapsed
    }
}

fn dot_position(canvas: &StitchCanvas, index: DotIndex) -> Position {
    position_from_index(&canvas.virtual_bounds(), index, canvas.spacing())
}

fn tap(canvas: &mut StitchCanvas, clock: &mut Clock, index: DotIndex) {
    let at = dot_position(canvas, index);
    canvas.handle_input_at(InputEvent::PointerDown(at), clock.advance(60));
    canvas.handle_input_at(InputEvent::PointerUp(at), clock.advance(40));
}

fn drag(canvas: &mut StitchCanvas, clock: &mut Clock, from: Position, to: Position, steps: u32) {
    canvas.handle_input_at(InputEvent::PointerDown(from), clock.advance(60));
    for step in 1..=steps {
        let t = f64::from(step) / f64::from(steps);
        let at = Position::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
        let now = clock.advance(16);
        canvas.handle_input_at(InputEvent::PointerMove(at), now);
        canvas.tick_at(now);
    }
    canvas.handle_input_at(InputEvent::PointerUp(to), clock.advance(16));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = CanvasConfig::from_env()?;
    let mut canvas = StitchCanvas::new(config, Bounds::new(0.0, 0.0, 640.0, 480.0))?;

    let redraws = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&redraws);
    canvas.subscribe(EventKind::Redraw, move |_| counter.set(counter.get() + 1));
    canvas.subscribe_all(|event| {
        if !matches!(event, CanvasEvent::Redraw) {
            tracing::debug!(?event, "canvas event");
        }
    });

    let mut clock = Clock::new();

    // A cross stitch: two diagonals through the same four holes.
    for index in [(2, 2), (6, 6), (6, 2), (2, 6)] {
        tap(&mut canvas, &mut clock, DotIndex::new(index.0, index.1));
    }

    drag(&mut canvas, &mut clock, Position::new(320.0, 240.0), Position::new(260.0, 200.0), 12);

    let focal = Position::new(200.0, 160.0);
    canvas.handle_input_at(InputEvent::Wheel { position: focal, delta_y: -1.0 }, clock.advance(100));

    canvas.begin_thread("#2E6FBA", 1.5)?;
    for x in (8..=16).step_by(2) {
        tap(&mut canvas, &mut clock, DotIndex::new(x, 4));
    }
    canvas.undo();
    canvas.undo();
    canvas.redo()?;
    canvas.tick_at(clock.advance(1_000));

    let mut surface = TallySurface::default();
    canvas.render(&mut surface);
    tracing::info!(
        redraws = redraws.get(),
        stitches = canvas.pattern().stitch_count(),
        dots = surface.dots,
        segments = surface.segments,
        front_segments = surface.front_segments,
        "session replayed"
    );

    println!("{}", serde_json::to_string_pretty(&canvas.snapshot())?);
    Ok(())
}
