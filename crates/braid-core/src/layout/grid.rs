//! Grid layout: beads in id order, row-major, in cells matching the
//! canvas aspect ratio.

use super::{Canvas, Position};

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(super) fn place(n: usize, canvas: &Canvas) -> Vec<Position> {
    if n == 0 {
        return Vec::new();
    }
    let inner_w = 2.0f64.mul_add(-canvas.pad_x, canvas.width);
    let inner_h = 2.0f64.mul_add(-canvas.pad_y, canvas.height);
    let aspect = inner_w / inner_h;

    let cols = ((n as f64 * aspect).sqrt().ceil() as usize).clamp(1, n);
    let rows = n.div_ceil(cols);
    let cell_w = inner_w / cols as f64;
    let cell_h = inner_h / rows as f64;

    (0..n)
        .map(|i| Position {
            x: cell_w.mul_add((i % cols) as f64 + 0.5, canvas.pad_x),
            y: cell_h.mul_add((i / cols) as f64 + 0.5, canvas.pad_y),
        })
        .collect()
}
