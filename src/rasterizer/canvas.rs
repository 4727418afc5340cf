//! Double-buffered cell canvas
//!
//! Drawing goes into the back buffer. `present` diffs it against the front
//! buffer (what the terminal currently shows) and writes only the cells that
//! changed, then copies them across.
//!
//! Triangle and 3D line coordinates are normalized device coordinates
//! (-1.0 to +1.0). Deep lines take cell positions plus a depth.

use std::io;

use super::geometry::{Box2, Line3, Triangle3};
use super::math::{Point3, Vec3};
use super::types::{Cell, Color, ColorMode};
use crate::terminal::TerminalSink;

/// What a call to [`Canvas::present`] sent to the terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentStats {
    pub cursor_moves: usize,
    pub color_changes: usize,
    pub glyphs: usize,
}

impl PresentStats {
    pub fn is_empty(&self) -> bool {
        self.cursor_moves == 0 && self.color_changes == 0 && self.glyphs == 0
    }
}

pub struct Canvas {
    width: usize,
    height: usize,
    front: Vec<Cell>,
    back: Vec<Cell>,
    color_mode: ColorMode,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            front: vec![Cell::UNDRAWN; width * height],
            back: vec![Cell::default(); width * height],
            color_mode: ColorMode::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        if mode != self.color_mode {
            self.color_mode = mode;
            self.force_redraw();
        }
    }

    /// Reallocate both buffers. Everything drawn so far is lost.
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Canvas {
            color_mode: self.color_mode,
            ..Canvas::new(width, height)
        };
    }

    /// Forget what the terminal shows so the next present rewrites every cell
    pub fn force_redraw(&mut self) {
        self.front.fill(Cell::UNDRAWN);
    }

    pub fn is_out_of_bounds(&self, x: i64, y: i64) -> bool {
        x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if self.is_out_of_bounds(x, y) {
            return None;
        }
        Some(x as usize + y as usize * self.width)
    }

    /// Write into the back buffer; positions off the canvas are ignored
    pub fn set(&mut self, x: i64, y: i64, cell: Cell) {
        if let Some(idx) = self.index(x, y) {
            self.back[idx] = cell;
        }
    }

    /// Back buffer cell
    pub fn get(&self, x: i64, y: i64) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.back[idx])
    }

    /// Front buffer cell (last presented)
    pub fn get_front(&self, x: i64, y: i64) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.front[idx])
    }

    pub fn depth_at(&self, x: i64, y: i64) -> Option<f64> {
        self.get(x, y).map(|cell| cell.depth)
    }

    /// Back buffer, row-major
    pub fn cells(&self) -> &[Cell] {
        &self.back
    }

    /// Fill the back buffer with the default cell
    pub fn clear(&mut self) {
        self.clear_with(Cell::default());
    }

    pub fn clear_with(&mut self, cell: Cell) {
        self.back.fill(cell);
    }

    /// Map an NDC point to (unfloored) cell space; Z is carried through
    pub fn ndc_to_cell(&self, point: Point3) -> Point3 {
        let hw = self.width as f64 / 2.0;
        let hh = self.height as f64 / 2.0;
        Vec3::new(point.x * hw + hw, point.y * hh + hh, point.z)
    }

    /// Cell containing an NDC point
    pub fn ndc_to_coord(&self, x: f64, y: f64) -> [i64; 2] {
        let p = self.ndc_to_cell(Vec3::new(x, y, 0.0));
        [p.x.floor() as i64, p.y.floor() as i64]
    }

    fn ndc_to_floored_cell(&self, point: Point3) -> Point3 {
        let p = self.ndc_to_cell(point);
        Vec3::new(p.x.floor(), p.y.floor(), p.z)
    }

    /// Bresenham walk between the floored endpoints, limited to the steps
    /// that can land on the canvas. The visited cells are exactly those of
    /// the unclipped line.
    fn line_walk(&self, start: [f64; 2], end: [f64; 2]) -> Option<LineWalk> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        if !start.iter().chain(end.iter()).all(|v| v.is_finite()) {
            return None;
        }

        let walk = LineWalk::new(
            [start[0].floor(), start[1].floor()],
            [end[0].floor(), end[1].floor()],
        );

        // A Bresenham cell is never more than half a cell off the ideal
        // line, so one cell of margin keeps every visible step in range
        let (w, h) = (self.width as f64, self.height as f64);
        let [x0, y0] = walk.origin;
        let (dx, dy) = (walk.sx * walk.dx, walk.sy * walk.dy);
        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
        let edges = [
            (-dx, x0 + 1.0),
            (dx, w - x0),
            (-dy, y0 + 1.0),
            (dy, h - y0),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let first = (t0 * walk.steps).floor().max(0.0);
        let last = (t1 * walk.steps).ceil().min(walk.steps);
        Some(walk.limit(first, last))
    }

    /// Plain line between NDC points, no depth test
    pub fn draw_line_3d(&mut self, start: Point3, end: Point3, cell: Cell) {
        let start = self.ndc_to_coord(start.x, start.y);
        let end = self.ndc_to_coord(end.x, end.y);
        self.draw_line(start, end, cell);
    }

    /// Plain line between cell positions, no depth test
    pub fn draw_line(&mut self, start: [i64; 2], end: [i64; 2], cell: Cell) {
        self.draw_line_float(
            [start[0] as f64, start[1] as f64],
            [end[0] as f64, end[1] as f64],
            cell,
        );
    }

    /// Bresenham line, every visited cell written. Endpoints are floored to cells.
    pub fn draw_line_float(&mut self, start: [f64; 2], end: [f64; 2], cell: Cell) {
        let Some(walk) = self.line_walk(start, end) else {
            return;
        };

        for (x, y, _) in walk {
            self.set(x, y, cell);
        }
    }

    /// Bresenham line in cell positions with depth interpolated from start
    /// to end. A cell is only replaced when the new depth is strictly nearer.
    pub fn draw_deep_line(&mut self, line: Line3, cell: Cell) {
        let Some(walk) = self.line_walk([line.start.x, line.start.y], [line.end.x, line.end.y]) else {
            return;
        };

        let (z0, z1) = (line.start.z, line.end.z);
        let dz = if walk.steps > 0.0 { (z1 - z0) / walk.steps } else { 0.0 };

        for (x, y, step) in walk {
            let z = z0 + dz * step;
            if self.depth_at(x, y).is_some_and(|stored| stored > z) {
                self.set(x, y, Cell { depth: z, ..cell });
            }
        }
    }

    /// Filled, depth-tested triangle in NDC
    pub fn draw_triangle3(&mut self, tri: Triangle3, cell: Cell) {
        if !tri.0.iter().all(|v| v.x.is_finite() && v.y.is_finite()) {
            return;
        }

        let tri = tri.sorted_by_y();
        if !tri.intersects_box2(&Box2::NDC) {
            return;
        }

        let [v0, v1, v2] = tri.0;
        if v1.y == v2.y {
            self.fill_flat(v0, v1, v2, cell, true);
        } else if v0.y == v1.y {
            self.fill_flat(v2, v0, v1, cell, true);
        } else {
            let mid = split_vertex(v0, v1, v2);
            self.fill_flat(v0, mid, v1, cell, true);
            self.fill_flat(v2, v1, mid, cell, true);
        }
    }

    /// Triangle outline in NDC, depth-tested
    pub fn draw_wire_triangle3(&mut self, tri: Triangle3, cell: Cell) {
        let [p0, p1, p2] = tri.0.map(|v| self.ndc_to_floored_cell(v));
        self.draw_deep_line(Line3::new(p0, p1), cell);
        self.draw_deep_line(Line3::new(p1, p2), cell);
        self.draw_deep_line(Line3::new(p2, p0), cell);
    }

    /// Filled triangle from 2D NDC points, no depth
    pub fn draw_vector_triangle(&mut self, tri: [[f64; 2]; 3], cell: Cell) {
        let coords = tri.map(|[x, y]| self.ndc_to_coord(x, y));
        self.draw_triangle(coords, cell);
    }

    /// Filled triangle in cell positions, no depth
    pub fn draw_triangle(&mut self, tri: [[i64; 2]; 3], cell: Cell) {
        let mut verts = tri.map(|[x, y]| Vec3::new(x as f64, y as f64, 0.0));
        verts.sort_by(|a, b| a.y.total_cmp(&b.y));
        let [v0, v1, v2] = verts;

        if v1.y == v2.y {
            self.fill_cells(v0, v1, v2, cell, false);
        } else if v0.y == v1.y {
            self.fill_cells(v2, v0, v1, cell, false);
        } else {
            let mid = split_vertex(v0, v1, v2);
            self.fill_cells(v2, v1, mid, cell, false);
            self.fill_cells(v0, v1, mid, cell, false);
        }
    }

    /// Fill an NDC triangle with one horizontal edge (`a` and `b` share a row)
    fn fill_flat(&mut self, apex: Point3, a: Point3, b: Point3, cell: Cell, depth_test: bool) {
        let apex = self.ndc_to_floored_cell(apex);
        let a = self.ndc_to_floored_cell(a);
        let b = self.ndc_to_floored_cell(b);
        self.fill_cells(apex, a, b, cell, depth_test);
    }

    /// Scanline fill in cell space from the apex row to the row of `a`/`b`,
    /// both inclusive. Edge X is interpolated and floored per row.
    fn fill_cells(&mut self, apex: Point3, a: Point3, b: Point3, cell: Cell, depth_test: bool) {
        let dy = a.y - apex.y;
        if dy == 0.0 {
            // Everything landed on one row
            self.draw_span(apex, a, cell, depth_test);
            self.draw_span(a, b, cell, depth_test);
            self.draw_span(b, apex, cell, depth_test);
            return;
        }

        let slope_a = (a.x - apex.x) / dy;
        let slope_b = (b.x - apex.x) / dy;
        let z_slope_a = (a.z - apex.z) / dy;
        let z_slope_b = (b.z - apex.z) / dy;

        // Rows off the canvas draw nothing, skip them outright
        let first = apex.y.min(a.y).max(0.0);
        let last = apex.y.max(a.y).min(self.height as f64 - 1.0);

        let mut y = first;
        while y <= last {
            let k = y - apex.y;
            let start = Vec3::new((apex.x + slope_a * k).floor(), y, apex.z + z_slope_a * k);
            let end = Vec3::new((apex.x + slope_b * k).floor(), y, apex.z + z_slope_b * k);
            self.draw_span(start, end, cell, depth_test);
            y += 1.0;
        }
    }

    fn draw_span(&mut self, start: Point3, end: Point3, cell: Cell, depth_test: bool) {
        if depth_test {
            self.draw_deep_line(Line3::new(start, end), cell);
        } else {
            self.draw_line_float([start.x, start.y], [end.x, end.y], cell);
        }
    }

    /// Send changed cells to the terminal and mark them as shown.
    ///
    /// Only the area both the canvas and the terminal cover is visited. The
    /// cursor is only moved when the next changed cell is not directly after
    /// the last one written, and colors are only sent when they differ from
    /// the previous cell written.
    pub fn present<T: TerminalSink + ?Sized>(&mut self, term: &mut T) -> io::Result<PresentStats> {
        let width = self.width.min(term.width());
        let height = self.height.min(term.height());

        let mut stats = PresentStats::default();
        let mut cursor: Option<(usize, usize)> = None;
        let mut colors: Option<(Color, Color)> = None;

        for y in 0..height {
            for x in 0..width {
                let idx = x + y * self.width;
                let back = self.back[idx];
                if back.same_appearance(&self.front[idx]) {
                    continue;
                }

                if cursor != Some((x, y)) {
                    term.move_cursor(x, y)?;
                    stats.cursor_moves += 1;
                }

                if colors != Some((back.fg, back.bg)) {
                    term.write_raw(&back.ansi_color(self.color_mode))?;
                    colors = Some((back.fg, back.bg));
                    stats.color_changes += 1;
                }

                term.write_glyph(back.glyph)?;
                stats.glyphs += 1;
                cursor = Some((x + 1, y));

                self.front[idx] = back;
            }
        }

        term.flush()?;
        Ok(stats)
    }
}

/// Fourth vertex on the long edge `v0 -> v2`, level with `v1`
fn split_vertex(v0: Point3, v1: Point3, v2: Point3) -> Point3 {
    let t = (v1.y - v0.y) / (v2.y - v0.y);
    Vec3::new(v0.x + t * (v2.x - v0.x), v1.y, v0.z + t * (v2.z - v0.z))
}

/// Cells of a Bresenham line, one per step along the major axis.
///
/// The error term after `k` steps has a closed form, so the walk can start
/// at any step without visiting the ones before it.
struct LineWalk {
    origin: [f64; 2],
    dx: f64,
    dy: f64,
    sx: f64,
    sy: f64,
    steps: f64,
    next: f64,
    last: f64,
}

impl LineWalk {
    fn new(start: [f64; 2], end: [f64; 2]) -> Self {
        let dx = (end[0] - start[0]).abs();
        let dy = (end[1] - start[1]).abs();
        let steps = dx.max(dy);
        Self {
            origin: start,
            dx,
            dy,
            sx: if start[0] < end[0] { 1.0 } else { -1.0 },
            sy: if start[1] < end[1] { 1.0 } else { -1.0 },
            steps,
            next: 0.0,
            last: steps,
        }
    }

    fn limit(self, first: f64, last: f64) -> Self {
        Self { next: first, last, ..self }
    }

    /// Cell reached after `k` steps, for integer-valued `k`
    fn cell_at(&self, k: f64) -> [f64; 2] {
        let [x0, y0] = self.origin;
        if self.steps == 0.0 {
            return [x0, y0];
        }

        if self.dx > self.dy {
            // Error stays in [0, dx); y moves whenever it wraps
            let v = self.dx / 2.0 - k * self.dy;
            let moved = -(v / self.dx).floor();
            [x0 + self.sx * k, y0 + self.sy * moved]
        } else {
            // Error stays in (-dy, 0]; x moves whenever it wraps
            let v = -self.dy / 2.0 + k * self.dx;
            let moved = (v / self.dy).ceil();
            [x0 + self.sx * moved, y0 + self.sy * k]
        }
    }
}

impl Iterator for LineWalk {
    /// Cell position and the step it was reached at
    type Item = (i64, i64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.last {
            return None;
        }
        let k = self.next;
        self.next += 1.0;
        let [x, y] = self.cell_at(k);
        Some((x as i64, y as i64, k))
    }
}
