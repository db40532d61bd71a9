//! Field rectangle normalization
//!
//! Widget annotations store their `Rect` as two opposite corners in no
//! guaranteed order. Everything downstream (rendering, data files) works
//! with lower-left / upper-right order.

/// Reorder a widget rectangle into `[x0, y0, x1, y1]`.
///
/// Two corrections are applied, in order:
/// 1. if `b > d` the corner pairs are swapped: `[c, d, a, b]`
/// 2. if the (possibly swapped) `a > c` the x values are swapped: `[c, b, a, d]`
///
/// This is NOT a general sort of the four numbers. It assumes the input is
/// two `(x, y)` corner points; values sitting in the wrong slots (an x where
/// a y belongs, as in the other 20 arrangements of four numbers) are not
/// repaired and produce a garbage rectangle. Stored data files carry
/// rectangles produced by exactly this algorithm, so it must not be
/// "improved" without a data migration.
pub fn normalize_rect(rect: [f64; 4]) -> [f64; 4] {
    let [mut a, mut b, mut c, mut d] = rect;

    if b > d {
        (a, b, c, d) = (c, d, a, b);
    }
    if a > c {
        (a, c) = (c, a);
    }

    [a, b, c, d]
}

/// A rectangle as origin plus extent, the form every drawing routine uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FieldBox {
    pub fn from_rect(rect: &[f64; 4]) -> Self {
        Self {
            x: rect[0],
            y: rect[1],
            width: rect[2] - rect[0],
            height: rect[3] - rect[1],
        }
    }
}
