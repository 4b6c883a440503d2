//! Interactive pattern-stitching canvas core.
//!
//! The crate keeps an effective dot grid (fabric holes plus the midpoints
//! between them) that a user pans and zooms through a finite viewport while
//! stitching threads between dots. It owns the geometry that maps grid space
//! onto the screen, the packed stores that hold tens of thousands of stitches
//! without per-record allocation, and the gesture handling that drives both.
//! Actual drawing is left to the host through [`render::RenderSurface`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`canvas`] | [`canvas::StitchCanvas`], the single owner of all state |
//! | [`geometry`] | Bounds, grid indexes, virtual/visible/drawing mapping |
//! | [`store`] | Generic columnar store and its dot/thread specializations |
//! | [`pattern`] | Thread paths, undo/redo, snapshots |
//! | [`zoom`] | Zoom step policy |
//! | [`pan`] | Pan gesture state machine |
//! | [`throttle`] | Per-kind input coalescing |
//! | [`bus`] | Publish/subscribe keyed by event kind |
//! | [`render`] | Layers, draw batches, and the surface trait |
//! | [`config`] | Canvas configuration and validation |
//! | [`consts`] | Shared numeric constants and default colors |

pub mod bus;
pub mod canvas;
pub mod config;
pub mod consts;
pub mod geometry;
pub mod pan;
pub mod pattern;
pub mod render;
pub mod store;
pub mod throttle;
pub mod zoom;
