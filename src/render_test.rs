#![allow(clippy::float_cmp)]

use super::*;
use crate::geometry::{Bounds, drawing_bounds};

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Clear,
    Bounds(DrawingBounds),
    Dots { color: String, points: Vec<(i16, i16)>, radius: Vec<f32> },
    Segments { color: String, width: f64, lines: Vec<((i32, i32), (i32, i32))> },
    Path { color: String, width: f64, points: Vec<(i32, i32)>, visible: Vec<bool> },
}

#[derive(Debug, Default)]
struct Recorder {
    ops: Vec<Op>,
}

impl RenderSurface for Recorder {
    fn clear(&mut self) {
        self.ops.push(Op::Clear);
    }

    fn set_bounds(&mut self, bounds: DrawingBounds) {
        self.ops.push(Op::Bounds(bounds));
    }

    fn draw_dots(&mut self, batch: &DotBatch<'_>) {
        self.ops.push(Op::Dots {
            color: batch.color.to_owned(),
            points: batch.xs.iter().copied().zip(batch.ys.iter().copied()).collect(),
            radius: batch.radius.to_vec(),
        });
    }

    fn draw_lines(&mut self, batch: &LineBatch<'_>) {
        let stroke = batch.stroke();
        let op = match batch {
            LineBatch::Segments { .. } => Op::Segments {
                color: stroke.color.to_owned(),
                width: stroke.width,
                lines: batch.front_segments().collect(),
            },
            LineBatch::Path { xs, ys, visible, .. } => Op::Path {
                color: stroke.color.to_owned(),
                width: stroke.width,
                points: xs.iter().copied().zip(ys.iter().copied()).collect(),
                visible: visible.to_vec(),
            },
        };
        self.ops.push(op);
    }
}

fn config() -> CanvasConfig {
    // 6x6 holes -> 11x11 effective dots.
    CanvasConfig { rows: 6, columns: 6, ..CanvasConfig::default() }
}

fn levels() -> ZoomLevels {
    ZoomLevels { spacing: 25.0, dot_radius: 2.0, thread_width: 2.0 }
}

fn scene<'a>(pattern: &'a Pattern, virtual_bounds: VirtualBounds, cue: Option<DotIndex>) -> Scene<'a> {
    let visible = Bounds::new(0.0, 0.0, 200.0, 200.0);
    Scene {
        drawing: drawing_bounds(&virtual_bounds, &visible),
        virtual_bounds,
        levels: levels(),
        dot_count_x: 11,
        dot_count_y: 11,
        pattern,
        cue,
    }
}

fn origin_virtual() -> VirtualBounds {
    Bounds::new(0.0, 0.0, 250.0, 250.0)
}

fn dots_of(ops: &[Op]) -> Vec<&Vec<(i16, i16)>> {
    ops.iter()
        .filter_map(|op| match op {
            Op::Dots { points, .. } => Some(points),
            _ => None,
        })
        .collect()
}

// --- fabric ---

#[test]
fn fabric_holes_at_even_indexes_inside_drawing() {
    let pattern = Pattern::new(&config()).expect("pattern");
    let mut layer = FabricLayer::from_config(&config()).expect("layer");
    let mut rec = Recorder::default();
    layer.draw(&scene(&pattern, origin_virtual(), None), &mut rec);

    // Indexes 0..=8 fit in 200px; holes at 0, 2, 4, 6, 8 per axis.
    assert_eq!(layer.holes().len(), 25);
    assert_eq!(layer.holes().positions_x()[..5], [0, 50, 100, 150, 200]);
    assert!(layer.holes().radius().iter().all(|&r| r == 2.0));
}

#[test]
fn fabric_weave_lines_at_odd_indexes_span_drawing() {
    let pattern = Pattern::new(&config()).expect("pattern");
    let mut layer = FabricLayer::from_config(&config()).expect("layer");
    let mut rec = Recorder::default();
    layer.draw(&scene(&pattern, origin_virtual(), None), &mut rec);

    // Four vertical (x = 25, 75, 125, 175) plus four horizontal.
    assert_eq!(layer.weave().len(), 8);
    assert_eq!(layer.weave().from_x()[..4], [25, 75, 125, 175]);
    assert_eq!(layer.weave().from_y()[0], 0);
    assert_eq!(layer.weave().to_y()[0], 200);
    assert_eq!(layer.weave().from_y()[4..], [25, 75, 125, 175]);
}

#[test]
fn fabric_follows_pan_offset() {
    let pattern = Pattern::new(&config()).expect("pattern");
    let mut layer = FabricLayer::from_config(&config()).expect("layer");
    let mut rec = Recorder::default();
    let panned = Bounds::new(-30.0, 0.0, 250.0, 250.0);
    layer.draw(&scene(&pattern, panned, None), &mut rec);

    // Columns 2..=9 are on screen; holes at 2, 4, 6, 8.
    assert_eq!(layer.holes().len(), 4 * 5);
    assert_eq!(layer.holes().positions_x()[0], 20);
}

#[test]
fn fabric_holes_never_leave_drawing_bounds() {
    let pattern = Pattern::new(&config()).expect("pattern");
    let mut layer = FabricLayer::from_config(&config()).expect("layer");
    let mut rec = Recorder::default();
    for (left, top) in [(-30.0, -70.0), (40.0, 10.0), (-120.0, 90.0), (180.0, -240.0)] {
        let s = scene(&pattern, Bounds::new(left, top, 250.0, 250.0), None);
        layer.draw(&s, &mut rec);
        for (&x, &y) in layer.holes().positions_x().iter().zip(layer.holes().positions_y()) {
            let p = crate::geometry::Position::new(f64::from(x), f64::from(y));
            assert!(s.drawing.contains(p), "{p:?} outside {:?}", s.drawing);
        }
    }
}

#[test]
fn fabric_outside_viewport_draws_nothing() {
    let pattern = Pattern::new(&config()).expect("pattern");
    let mut layer = FabricLayer::from_config(&config()).expect("layer");
    let mut rec = Recorder::default();
    layer.draw(&scene(&pattern, Bounds::new(500.0, 0.0, 250.0, 250.0), None), &mut rec);
    assert!(layer.holes().is_empty());
    assert!(rec.ops.is_empty());
}

#[test]
fn fabric_reuses_store_capacity_across_frames() {
    let pattern = Pattern::new(&config()).expect("pattern");
    let mut layer = FabricLayer::from_config(&config()).expect("layer");
    let mut rec = Recorder::default();
    let s = scene(&pattern, origin_virtual(), None);
    layer.draw(&s, &mut rec);
    let capacity = layer.holes().capacity();
    layer.draw(&s, &mut rec);
    assert_eq!(layer.holes().capacity(), capacity);
    assert_eq!(layer.holes().len(), 25);
}

// --- stitches ---

#[test]
fn stitch_layer_emits_one_path_per_thread() {
    let mut pattern = Pattern::new(&config()).expect("pattern");
    for (x, y) in [(0, 0), (2, 2), (4, 0)] {
        pattern.add_stitch(DotIndex::new(x, y)).expect("stitch");
    }
    pattern.begin_thread("#00F", 0.5).expect("thread");
    pattern.add_stitch(DotIndex::new(6, 6)).expect("stitch");

    let mut rec = Recorder::default();
    StitchLayer.draw(&scene(&pattern, origin_virtual(), None), &mut rec);

    assert_eq!(rec.ops.len(), 2);
    assert_eq!(
        rec.ops[0],
        Op::Path {
            color: config().thread_color,
            width: 2.0,
            points: vec![(0, 0), (50, 50), (100, 0)],
            visible: vec![true, false, true],
        }
    );
    assert!(matches!(&rec.ops[1], Op::Path { color, width, .. } if color == "#00F" && *width == 1.0));
}

#[test]
fn stitch_layer_skips_empty_threads() {
    let mut pattern = Pattern::new(&config()).expect("pattern");
    pattern.begin_thread("#000", 1.0).expect("thread");
    let mut rec = Recorder::default();
    StitchLayer.draw(&scene(&pattern, origin_virtual(), None), &mut rec);
    assert!(rec.ops.is_empty());
}

#[test]
fn path_front_segments_follow_visibility() {
    let xs = [0, 10, 20, 30];
    let ys = [0, 0, 0, 0];
    let visible = [true, false, true, false];
    let batch = LineBatch::Path { stroke: Stroke { color: "#000", width: 1.0 }, xs: &xs, ys: &ys, visible: &visible };
    let front: Vec<_> = batch.front_segments().collect();
    assert_eq!(front, vec![((0, 0), (10, 0)), ((20, 0), (30, 0))]);
}

// --- cue ---

#[test]
fn cue_draws_enlarged_dot() {
    let pattern = Pattern::new(&config()).expect("pattern");
    let mut cue = CueLayer::from_config(&config()).expect("cue");
    let mut rec = Recorder::default();
    cue.draw(&scene(&pattern, origin_virtual(), Some(DotIndex::new(3, 1))), &mut rec);
    assert_eq!(
        rec.ops,
        vec![Op::Dots { color: config().cue_color, points: vec![(75, 25)], radius: vec![4.0] }]
    );
}

#[test]
fn cue_outside_drawing_is_skipped() {
    let pattern = Pattern::new(&config()).expect("pattern");
    let mut cue = CueLayer::from_config(&config()).expect("cue");
    let mut rec = Recorder::default();
    // Index 10 sits at x = 250, past the 200px viewport.
    cue.draw(&scene(&pattern, origin_virtual(), Some(DotIndex::new(10, 0))), &mut rec);
    cue.draw(&scene(&pattern, origin_virtual(), None), &mut rec);
    assert!(rec.ops.is_empty());
}

// --- layer stack ---

#[test]
fn layers_paint_in_order_after_clip() {
    let mut pattern = Pattern::new(&config()).expect("pattern");
    pattern.add_stitch(DotIndex::new(1, 1)).expect("stitch");
    let mut layers = Layers::from_config(&config()).expect("layers");
    let mut rec = Recorder::default();
    let s = scene(&pattern, origin_virtual(), Some(DotIndex::new(0, 0)));
    layers.draw(&s, &mut rec);

    assert_eq!(rec.ops[0], Op::Clear);
    assert_eq!(rec.ops[1], Op::Bounds(s.drawing));
    assert!(matches!(rec.ops[2], Op::Segments { .. }));
    assert!(matches!(rec.ops[3], Op::Dots { .. }));
    assert!(matches!(rec.ops[4], Op::Path { .. }));
    assert_eq!(dots_of(&rec.ops).len(), 2);
    assert_eq!(rec.ops.len(), 6);
}

#[test]
fn tally_surface_counts_per_frame() {
    let mut pattern = Pattern::new(&config()).expect("pattern");
    for (x, y) in [(0, 0), (2, 0), (4, 0)] {
        pattern.add_stitch(DotIndex::new(x, y)).expect("stitch");
    }
    let mut layers = Layers::from_config(&config()).expect("layers");
    let mut tally = TallySurface::default();
    let s = scene(&pattern, origin_virtual(), None);
    layers.draw(&s, &mut tally);
    layers.draw(&s, &mut tally);

    assert_eq!(tally.frames, 2);
    assert_eq!(tally.dots, 25);
    // 8 weave lines plus 2 path segments, one of them on the back.
    assert_eq!(tally.segments, 10);
    assert_eq!(tally.front_segments, 9);
    assert_eq!(tally.bounds, Some(s.drawing));
}
