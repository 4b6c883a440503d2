//! Canvas: the single owner of view state, pattern, layers and controllers.
//!
//! [`StitchCanvas`] is what a host embeds. It accepts raw [`InputEvent`]s,
//! runs them through the throttle and the pan/zoom controllers, keeps the
//! virtual, visible and drawing bounds consistent, edits the pattern, and
//! announces every change on its [`EventBus`]. Drawing happens only when the
//! host calls [`StitchCanvas::render`], typically in response to a
//! [`CanvasEvent::Redraw`].
//!
//! Gestures:
//! - press, drag past the deadzone, release: pan
//! - press and release inside the deadzone: stitch at the nearest dot
//! - wheel: zoom about the pointer
//! - two touches moving apart or together: zoom about their midpoint
//! - pointer motion with no button down: hover cue

#[cfg(test)]
#[path = "canvas_test.rs"]
mod canvas_test;

use std::time::Instant;

use crate::bus::{EventBus, Keyed, ListenerId};
use crate::config::{CanvasConfig, ConfigError};
use crate::consts::PINCH_THRESHOLD_PX;
use crate::geometry::{
    self, Bounds, DotIndex, DrawingBounds, Position, VirtualBounds, VisibleBounds, recompute_virtual_bounds,
};
use crate::pan::{MoveController, MoveEvent, MoveState, Release};
use crate::pattern::{Pattern, PatternError, PatternSnapshot};
use crate::render::{Layers, RenderSurface, Scene};
use crate::store::{PathPoint, StoreError};
use crate::throttle::InputThrottle;
use crate::zoom::{ZoomController, ZoomDirection, ZoomLevels, anchor_delta};

/// Error returned by canvas construction and pattern operations.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("visible bounds must have a positive finite size, got {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
    #[error("visible bounds must lie within +/-{limit} px, got ({left}, {top}) to ({right}, {bottom})", limit = i16::MAX)]
    ViewportOutOfRange { left: f64, top: f64, right: f64, bottom: f64 },
}

// =============================================================
// Events
// =============================================================

/// Discriminant of [`CanvasEvent`], used to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Redraw,
    MoveStart,
    Move,
    MoveStop,
    Zoom,
    Stitch,
    Unstitch,
    Cue,
    PatternReset,
    PatternLoaded,
}

/// Notifications published on the canvas bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    /// View or pattern changed; the host should call `render`.
    Redraw,
    MoveStart { previous: Position, current: Position },
    Move { previous: Position, current: Position },
    MoveStop { position: Position },
    Zoom { direction: ZoomDirection, focal: Position, levels: ZoomLevels },
    Stitch { index: DotIndex, visible: bool },
    /// A stitch was removed by undo.
    Unstitch { index: DotIndex },
    /// The hover cue moved; `None` when it left the grid.
    Cue { index: Option<DotIndex> },
    PatternReset,
    PatternLoaded { threads: usize, stitches: usize },
}

impl Keyed for CanvasEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            Self::Redraw => EventKind::Redraw,
            Self::MoveStart { .. } => EventKind::MoveStart,
            Self::Move { .. } => EventKind::Move,
            Self::MoveStop { .. } => EventKind::MoveStop,
            Self::Zoom { .. } => EventKind::Zoom,
            Self::Stitch { .. } => EventKind::Stitch,
            Self::Unstitch { .. } => EventKind::Unstitch,
            Self::Cue { .. } => EventKind::Cue,
            Self::PatternReset => EventKind::PatternReset,
            Self::PatternLoaded { .. } => EventKind::PatternLoaded,
        }
    }
}

impl From<MoveEvent> for CanvasEvent {
    fn from(event: MoveEvent) -> Self {
        match event {
            MoveEvent::Start { previous, current } => Self::MoveStart { previous, current },
            MoveEvent::Move { previous, current } => Self::Move { previous, current },
            MoveEvent::Stop { position } => Self::MoveStop { position },
        }
    }
}

// =============================================================
// Input
// =============================================================

/// Raw device input, in device-relative pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Position),
    PointerMove(Position),
    PointerUp(Position),
    /// Treated like `PointerUp`, except a press that never moved is not a tap.
    PointerCancel(Position),
    /// Negative `delta_y` zooms in, positive zooms out.
    Wheel { position: Position, delta_y: f64 },
    TouchStart { id: u32, position: Position },
    TouchMove { id: u32, position: Position },
    TouchEnd { id: u32, position: Position },
}

/// Throttle key: each kind of high-rate input gets its own window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InputKind {
    PointerMove,
    Wheel,
    TouchMove(u32),
}

impl InputEvent {
    /// Throttle key, or `None` for events that are never coalesced.
    fn throttle_kind(&self) -> Option<InputKind> {
        match self {
            Self::PointerMove(_) => Some(InputKind::PointerMove),
            Self::Wheel { .. } => Some(InputKind::Wheel),
            Self::TouchMove { id, .. } => Some(InputKind::TouchMove(*id)),
            _ => None,
        }
    }
}

/// Active touch points, at most two.
#[derive(Debug, Clone, Default)]
struct Touches {
    points: Vec<(u32, Position)>,
    /// Finger distance at the last pinch step.
    pinch_distance: Option<f64>,
}

impl Touches {
    fn position(&self, id: u32) -> Option<Position> {
        self.points.iter().find(|(t, _)| *t == id).map(|(_, p)| *p)
    }

    fn pair(&self) -> Option<(Position, Position)> {
        match self.points.as_slice() {
            [(_, a), (_, b)] => Some((*a, *b)),
            _ => None,
        }
    }
}

// =============================================================
// Capabilities
// =============================================================

/// Something whose content can be dragged.
pub trait Pannable {
    /// Translate the content by `(dx, dy)` pixels.
    fn pan_by(&mut self, dx: f64, dy: f64);
    fn is_panning(&self) -> bool;
}

/// Something that can zoom about a focal point.
pub trait Zoomable {
    /// Apply one zoom step. Returns `false` if the step was rejected.
    fn zoom(&mut self, direction: ZoomDirection, focal: Position) -> bool;
    fn levels(&self) -> ZoomLevels;
}

// =============================================================
// Canvas
// =============================================================

/// The stitching canvas.
#[derive(Debug)]
pub struct StitchCanvas {
    config: CanvasConfig,
    dot_count_x: usize,
    dot_count_y: usize,
    visible: VisibleBounds,
    virtual_bounds: VirtualBounds,
    /// Drawing-bounds override while a pan is in progress.
    moving: Option<DrawingBounds>,
    levels: ZoomLevels,
    cue: Option<DotIndex>,
    pattern: Pattern,
    layers: Layers,
    move_ctl: MoveController,
    zoom_ctl: ZoomController,
    touches: Touches,
    throttle: InputThrottle<InputKind, InputEvent>,
    bus: EventBus<CanvasEvent>,
}

impl StitchCanvas {
    /// Build a canvas whose grid starts at the top-left of `visible`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Config`] for an invalid config and
    /// [`CanvasError::InvalidViewport`] for an empty or non-finite viewport,
    /// and [`CanvasError::ViewportOutOfRange`] for one past the `i16` pixel
    /// range of the fabric store.
    pub fn new(config: CanvasConfig, visible: VisibleBounds) -> Result<Self, CanvasError> {
        config.validate()?;
        check_viewport(&visible)?;
        let zoom_ctl = ZoomController::from_config(&config);
        let levels = zoom_ctl.baseline();
        let dot_count_x = config.dot_count_x();
        let dot_count_y = config.dot_count_y();
        let start = Bounds::new(visible.left, visible.top, 0.0, 0.0);
        let virtual_bounds = recompute_virtual_bounds(&start, dot_count_x, dot_count_y, levels.spacing, 0.0, 0.0);
        let mut pattern = Pattern::new(&config)?;
        pattern.relayout(&virtual_bounds, levels.spacing);
        tracing::info!(
            rows = config.rows,
            columns = config.columns,
            spacing = levels.spacing,
            throttle_ms = config.throttle_ms,
            "stitch canvas created"
        );
        Ok(Self {
            dot_count_x,
            dot_count_y,
            visible,
            virtual_bounds,
            moving: None,
            levels,
            cue: None,
            pattern,
            layers: Layers::from_config(&config)?,
            move_ctl: MoveController::new(config.ignore_move_until),
            zoom_ctl,
            touches: Touches::default(),
            throttle: InputThrottle::new(config.throttle_interval()),
            bus: EventBus::new(),
            config,
        })
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    #[must_use]
    pub fn visible_bounds(&self) -> VisibleBounds {
        self.visible
    }

    #[must_use]
    pub fn virtual_bounds(&self) -> VirtualBounds {
        self.virtual_bounds
    }

    /// What gets rendered: the pan override if one is active, else the
    /// intersection of virtual and visible bounds.
    #[must_use]
    pub fn drawing_bounds(&self) -> DrawingBounds {
        self.moving.unwrap_or_else(|| geometry::drawing_bounds(&self.virtual_bounds, &self.visible))
    }

    #[must_use]
    pub fn moving_bounds(&self) -> Option<DrawingBounds> {
        self.moving
    }

    #[must_use]
    pub fn spacing(&self) -> f64 {
        self.levels.spacing
    }

    #[must_use]
    pub fn dot_counts(&self) -> (usize, usize) {
        (self.dot_count_x, self.dot_count_y)
    }

    #[must_use]
    pub fn cue(&self) -> Option<DotIndex> {
        self.cue
    }

    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[must_use]
    pub fn move_state(&self) -> MoveState {
        self.move_ctl.state()
    }

    /// Nearest dot to `position`, if it lies inside the drawing bounds.
    #[must_use]
    pub fn dot_at(&self, position: Position) -> Option<DotIndex> {
        if !self.drawing_bounds().contains(position) {
            return None;
        }
        geometry::nearest_dot(&self.virtual_bounds, position, self.levels.spacing, self.dot_count_x, self.dot_count_y)
    }

    // --- Bus ---

    pub fn subscribe(&mut self, kind: EventKind, callback: impl FnMut(&CanvasEvent) + 'static) -> ListenerId {
        self.bus.subscribe(kind, callback)
    }

    pub fn subscribe_all(&mut self, callback: impl FnMut(&CanvasEvent) + 'static) -> ListenerId {
        self.bus.subscribe_all(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    // --- Viewport ---

    /// Resize or move the viewport. Cancels any pan override and drops input
    /// the throttle is holding, since its positions refer to the old viewport.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidViewport`] for an empty or non-finite
    /// viewport and [`CanvasError::ViewportOutOfRange`] for one past the
    /// `i16` pixel range; the previous bounds are kept.
    pub fn set_visible_bounds(&mut self, visible: VisibleBounds) -> Result<(), CanvasError> {
        check_viewport(&visible)?;
        self.visible = visible;
        self.moving = None;
        self.throttle.reset();
        self.bus.emit(&CanvasEvent::Redraw);
        Ok(())
    }

    /// Paint the current frame.
    pub fn render(&mut self, surface: &mut dyn RenderSurface) {
        let scene = Scene {
            drawing: self.drawing_bounds(),
            virtual_bounds: self.virtual_bounds,
            levels: self.levels,
            dot_count_x: self.dot_count_x,
            dot_count_y: self.dot_count_y,
            pattern: &self.pattern,
            cue: self.cue,
        };
        self.layers.draw(&scene, surface);
    }

    // --- Input routing ---

    /// Feed one input event, stamped with the current time.
    pub fn handle_input(&mut self, event: InputEvent) {
        self.handle_input_at(event, Instant::now());
    }

    /// Feed one input event observed at `now`.
    ///
    /// Moves and wheel ticks are coalesced by the throttle. Any other event
    /// first flushes whatever the throttle is holding so ordering is kept.
    pub fn handle_input_at(&mut self, event: InputEvent, now: Instant) {
        if let Some(kind) = event.throttle_kind() {
            if let Some(event) = self.throttle.offer_at(kind, event, now) {
                self.dispatch(event);
            }
            return;
        }
        for held in self.throttle.flush_at(now) {
            self.dispatch(held);
        }
        self.dispatch(event);
    }

    /// Replay held input whose throttle window has elapsed.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        for held in self.throttle.due_at(now) {
            self.dispatch(held);
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown(p) => self.pointer_down(p),
            InputEvent::PointerMove(p) => self.pointer_move(p),
            InputEvent::PointerUp(p) => self.pointer_up(p),
            InputEvent::PointerCancel(p) => self.pointer_cancel(p),
            InputEvent::Wheel { position, delta_y } => self.wheel(position, delta_y),
            InputEvent::TouchStart { id, position } => self.touch_start(id, position),
            InputEvent::TouchMove { id, position } => self.touch_move(id, position),
            InputEvent::TouchEnd { id, position } => self.touch_end(id, position),
        }
    }

    // --- Pointer ---

    pub fn pointer_down(&mut self, position: Position) {
        self.move_ctl.press(position);
    }

    /// Pan while a press is active; otherwise update the hover cue.
    pub fn pointer_move(&mut self, position: Position) {
        if self.move_ctl.is_idle() {
            self.update_cue(position);
            return;
        }
        if let Some(event) = self.move_ctl.motion(position) {
            self.apply_move(event, position);
        }
    }

    /// End the gesture. A press that never left the deadzone stitches.
    pub fn pointer_up(&mut self, position: Position) {
        match self.move_ctl.release(position) {
            Release::Idle => {}
            Release::Tap { position } => self.tap(position),
            Release::Stopped(event) => self.finish_move(event),
        }
    }

    /// End the gesture without stitching.
    pub fn pointer_cancel(&mut self, position: Position) {
        if let Release::Stopped(event) = self.move_ctl.release(position) {
            self.finish_move(event);
        }
    }

    /// Zoom in for negative `delta_y`, out for positive; zero is ignored.
    pub fn wheel(&mut self, position: Position, delta_y: f64) {
        let direction = if delta_y < 0.0 {
            ZoomDirection::In
        } else if delta_y > 0.0 {
            ZoomDirection::Out
        } else {
            return;
        };
        self.zoom_about(direction, position);
    }

    // --- Touch ---

    /// One finger behaves like a pointer; a second one starts a pinch and
    /// cancels any pending pan or tap.
    pub fn touch_start(&mut self, id: u32, position: Position) {
        if self.touches.position(id).is_some() {
            return;
        }
        match self.touches.points.len() {
            0 => {
                self.touches.points.push((id, position));
                self.pointer_down(position);
            }
            1 => {
                let first = self.touches.points.first().map_or(position, |(_, p)| *p);
                self.touches.points.push((id, position));
                self.pointer_cancel(first);
                self.touches.pinch_distance = self.touches.pair().map(|(a, b)| a.distance(b));
                tracing::debug!("pinch start");
            }
            _ => {}
        }
    }

    pub fn touch_move(&mut self, id: u32, position: Position) {
        let Some(slot) = self.touches.points.iter_mut().find(|(t, _)| *t == id) else {
            return;
        };
        slot.1 = position;
        match (self.touches.pair(), self.touches.pinch_distance) {
            (Some((a, b)), Some(last)) => {
                let distance = a.distance(b);
                let change = distance - last;
                if change.abs() > PINCH_THRESHOLD_PX {
                    let direction = if change > 0.0 { ZoomDirection::In } else { ZoomDirection::Out };
                    self.zoom_about(direction, a.midpoint(b));
                    self.touches.pinch_distance = Some(distance);
                }
            }
            _ => self.pointer_move(position),
        }
    }

    pub fn touch_end(&mut self, id: u32, position: Position) {
        self.throttle.forget(InputKind::TouchMove(id));
        let before = self.touches.points.len();
        self.touches.points.retain(|(t, _)| *t != id);
        if self.touches.points.len() == before {
            return;
        }
        if self.touches.pinch_distance.take().is_some() {
            tracing::debug!("pinch end");
            return;
        }
        if before == 1 {
            self.pointer_up(position);
        }
    }

    // --- Pattern ---

    /// Open a new thread for subsequent stitches.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Pattern`] for a non-positive width.
    pub fn begin_thread(&mut self, color: impl Into<String>, width: f64) -> Result<(), CanvasError> {
        self.pattern.begin_thread(color, width)?;
        Ok(())
    }

    /// Stitch at `index` on the active thread.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Pattern`] if `index` is off the grid.
    pub fn stitch_at(&mut self, index: DotIndex) -> Result<PathPoint, CanvasError> {
        let point = self.pattern.add_stitch(index)?;
        self.bus.emit(&CanvasEvent::Stitch { index, visible: point.visible });
        self.bus.emit(&CanvasEvent::Redraw);
        Ok(point)
    }

    /// Remove the newest stitch.
    pub fn undo(&mut self) -> Option<DotIndex> {
        let point = self.pattern.undo()?;
        let index = DotIndex::new(i32::from(point.index_x), i32::from(point.index_y));
        self.bus.emit(&CanvasEvent::Unstitch { index });
        self.bus.emit(&CanvasEvent::Redraw);
        Some(index)
    }

    /// Re-apply the last undone stitch.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Pattern`] if the stitch cannot be re-applied.
    pub fn redo(&mut self) -> Result<Option<DotIndex>, CanvasError> {
        let Some(point) = self.pattern.redo()? else {
            return Ok(None);
        };
        let index = DotIndex::new(i32::from(point.index_x), i32::from(point.index_y));
        self.bus.emit(&CanvasEvent::Stitch { index, visible: point.visible });
        self.bus.emit(&CanvasEvent::Redraw);
        Ok(Some(index))
    }

    pub fn reset_pattern(&mut self) {
        self.pattern.reset();
        self.bus.emit(&CanvasEvent::PatternReset);
        self.bus.emit(&CanvasEvent::Redraw);
    }

    /// Replace the pattern with `snapshot`, validated against this grid.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Pattern`] if any stitch is off the grid; the
    /// current pattern is left untouched.
    pub fn load_pattern(&mut self, snapshot: &PatternSnapshot) -> Result<(), CanvasError> {
        self.pattern.load(snapshot)?;
        self.bus.emit(&CanvasEvent::PatternLoaded {
            threads: self.pattern.thread_count(),
            stitches: self.pattern.stitch_count(),
        });
        self.bus.emit(&CanvasEvent::Redraw);
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> PatternSnapshot {
        self.pattern.snapshot()
    }

    // --- Internals ---

    fn update_cue(&mut self, position: Position) {
        let cue = self.dot_at(position);
        if cue != self.cue {
            self.cue = cue;
            self.bus.emit(&CanvasEvent::Cue { index: cue });
            self.bus.emit(&CanvasEvent::Redraw);
        }
    }

    fn tap(&mut self, position: Position) {
        let Some(index) = self.dot_at(position) else {
            tracing::trace!(?position, "tap outside grid");
            return;
        };
        if let Err(err) = self.stitch_at(index) {
            tracing::warn!(%err, ?index, "tap stitch failed");
        }
    }

    /// Translate the grid with the pointer and install the pan override.
    fn apply_move(&mut self, event: MoveEvent, pointer: Position) {
        let (dx, dy) = event.delta();
        let live = self.drawing_bounds();
        self.translate(dx, dy);
        let candidate = geometry::moving_bounds(pointer, &live.translate(dx, dy), &self.visible, &self.virtual_bounds);
        self.moving = Some(if self.visible.contains_bounds(&candidate) {
            candidate
        } else {
            geometry::drawing_bounds(&self.virtual_bounds, &self.visible)
        });
        self.bus.emit(&CanvasEvent::from(event));
        self.bus.emit(&CanvasEvent::Redraw);
    }

    fn finish_move(&mut self, event: MoveEvent) {
        self.moving = None;
        self.virtual_bounds = recompute_virtual_bounds(
            &self.virtual_bounds,
            self.dot_count_x,
            self.dot_count_y,
            self.levels.spacing,
            0.0,
            0.0,
        );
        tracing::debug!(virtual_bounds = ?self.virtual_bounds, "pan settled");
        self.bus.emit(&CanvasEvent::from(event));
        self.bus.emit(&CanvasEvent::Redraw);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.virtual_bounds = recompute_virtual_bounds(
            &self.virtual_bounds,
            self.dot_count_x,
            self.dot_count_y,
            self.levels.spacing,
            dx,
            dy,
        );
        self.pattern.relayout(&self.virtual_bounds, self.levels.spacing);
    }

    fn zoom_about(&mut self, direction: ZoomDirection, focal: Position) -> bool {
        let Some(next) = self.zoom_ctl.zoom(self.levels, direction, focal, &self.drawing_bounds()) else {
            return false;
        };
        let (dx, dy) = if self.config.anchor_zoom_at_focal {
            anchor_delta(self.virtual_bounds.origin(), focal, self.levels.spacing, next.spacing)
        } else {
            (0.0, 0.0)
        };
        self.levels = next;
        self.moving = None;
        self.translate(dx, dy);
        tracing::debug!(?direction, spacing = next.spacing, "zoom applied");
        self.bus.emit(&CanvasEvent::Zoom { direction, focal, levels: next });
        self.bus.emit(&CanvasEvent::Redraw);
        true
    }
}

impl Pannable for StitchCanvas {
    fn pan_by(&mut self, dx: f64, dy: f64) {
        self.translate(dx, dy);
        self.moving = None;
        self.bus.emit(&CanvasEvent::Redraw);
    }

    fn is_panning(&self) -> bool {
        self.move_ctl.is_moving()
    }
}

impl Zoomable for StitchCanvas {
    fn zoom(&mut self, direction: ZoomDirection, focal: Position) -> bool {
        self.zoom_about(direction, focal)
    }

    fn levels(&self) -> ZoomLevels {
        self.levels
    }
}

fn check_viewport(visible: &VisibleBounds) -> Result<(), CanvasError> {
    let finite = [visible.left, visible.top, visible.width, visible.height].iter().all(|v| v.is_finite());
    if !(finite && visible.width > 0.0 && visible.height > 0.0) {
        return Err(CanvasError::InvalidViewport { width: visible.width, height: visible.height });
    }
    let (min, max) = (f64::from(i16::MIN), f64::from(i16::MAX));
    let (right, bottom) = (visible.right(), visible.bottom());
    if visible.left < min || visible.top < min || right > max || bottom > max {
        return Err(CanvasError::ViewportOutOfRange { left: visible.left, top: visible.top, right, bottom });
    }
    Ok(())
}
