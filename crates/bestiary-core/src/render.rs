//! Rendering boundary.
//!
//! The world hands each [`Renderer`] a frame: one [`EntitySnapshot`] per
//! entity. Each snapshot is internally consistent; the frame as a whole is
//! not an atomic picture of the world, since entities are read one at a time
//! while movement continues.
//!
//! [`GridRenderer`] is the stock implementation: a coarse ASCII map.

use std::fmt::Write as _;
use std::io::Write;

use crate::entity::{Bounds, EntitySnapshot};

/// Consumes snapshot frames.
///
/// Implemented for any `FnMut(&[EntitySnapshot]) + Send` closure.
pub trait Renderer: Send {
    /// Draws one frame.
    fn render(&mut self, frame: &[EntitySnapshot]);
}

impl<F> Renderer for F
where
    F: FnMut(&[EntitySnapshot]) + Send,
{
    fn render(&mut self, frame: &[EntitySnapshot]) {
        self(frame);
    }
}

// Maps a coordinate in [0, max] onto [0, cells).
fn cell_index(coordinate: i32, max: i32, cells: usize) -> usize {
    let cells = i64::try_from(cells).unwrap_or(i64::MAX);
    let span = i64::from(max.max(0)) + 1;
    let scaled = i64::from(coordinate.clamp(0, max.max(0))) * cells / span;
    usize::try_from(scaled.clamp(0, cells - 1)).unwrap_or(0)
}

/// Projects `frame` onto a `grid x grid` character map.
///
/// Living entities are drawn with their kind's glyph, dead ones as `.`, and
/// empty cells as a blank. When several entities share a cell the one later
/// in the frame wins. Each cell is written as `[c]`, one row per line, and
/// the map ends with an empty line. Row 0 is `y = 0`.
///
/// # Example
///
/// ```
/// use bestiary_core::entity::{Bounds, EntityId, EntitySnapshot, Kind};
/// use bestiary_core::render::render_grid;
/// use glam::IVec2;
///
/// let frame = [EntitySnapshot {
///     id: EntityId::new(0),
///     kind: Kind::Dragon,
///     position: IVec2::new(0, 0),
///     alive: true,
/// }];
/// let map = render_grid(&frame, Bounds::new(9, 9), 2);
/// assert_eq!(map, "[D][ ]\n[ ][ ]\n\n");
/// ```
#[must_use]
pub fn render_grid(frame: &[EntitySnapshot], bounds: Bounds, grid: usize) -> String {
    if grid == 0 {
        return String::from("\n");
    }

    let mut cells = vec![' '; grid * grid];
    for snapshot in frame {
        let column = cell_index(snapshot.position.x, bounds.max_x, grid);
        let row = cell_index(snapshot.position.y, bounds.max_y, grid);
        cells[row * grid + column] = if snapshot.alive {
            snapshot.kind.glyph()
        } else {
            '.'
        };
    }

    let mut map = String::with_capacity(grid * (grid * 3 + 1) + 1);
    for row in cells.chunks(grid) {
        for glyph in row {
            let _ = write!(map, "[{glyph}]");
        }
        map.push('\n');
    }
    map.push('\n');
    map
}

/// Renderer that writes [`render_grid`] maps to an output stream.
#[derive(Debug)]
pub struct GridRenderer<W> {
    bounds: Bounds,
    grid: usize,
    out: W,
}

impl<W: Write + Send> GridRenderer<W> {
    /// Creates a renderer for a world of `bounds`, drawing `grid x grid` maps.
    pub const fn new(bounds: Bounds, grid: usize, out: W) -> Self {
        Self { bounds, grid, out }
    }

    /// Consumes the renderer and returns the output stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for GridRenderer<W> {
    fn render(&mut self, frame: &[EntitySnapshot]) {
        let map = render_grid(frame, self.bounds, self.grid);
        if let Err(err) = self
            .out
            .write_all(map.as_bytes())
            .and_then(|()| self.out.flush())
        {
            tracing::warn!(error = %err, "failed to write grid frame");
        }
    }
}
