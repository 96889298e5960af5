//! Rectangles, matrices and points stored as number arrays

use super::document::DocRef;
use super::object::{Obj, Value};

/// Axis-aligned rectangle `[x0 y0 x1 y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Rectangle from two corners, as given.
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Reorder corners so that `x0 <= x1` and `y0 <= y1`.
    pub fn normalize(self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Whether the rectangle encloses no area.
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

/// Affine transform `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    /// The identity transform.
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Matrix from its six entries `[a b c d e f]`.
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn entries(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

/// A point in user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Obj {
    /// Read a rectangle from a four-number array.
    ///
    /// Missing or non-numeric entries read as 0 and the result is
    /// normalized. Non-arrays give the zero rectangle.
    pub fn to_rect(&self) -> Rect {
        if !self.is_array() {
            return Rect::default();
        }
        Rect::new(
            self.array_get_real(0),
            self.array_get_real(1),
            self.array_get_real(2),
            self.array_get_real(3),
        )
        .normalize()
    }

    /// Read a matrix from a six-number array.
    ///
    /// Entries that are missing or not numbers take the identity value, so a
    /// damaged matrix degrades towards the identity transform.
    pub fn to_matrix(&self) -> Matrix {
        if !self.is_array() {
            return Matrix::IDENTITY;
        }
        let mut m = Matrix::IDENTITY.entries();
        for (i, slot) in m.iter_mut().enumerate() {
            let item = self.array_get(i).unwrap_or_default();
            if item.is_number() {
                *slot = item.to_real();
            }
        }
        Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// Read a point from a two-number array.
    pub fn to_point(&self) -> Point {
        Point::new(self.array_get_real(0), self.array_get_real(1))
    }

    fn new_real_array(doc: Option<&DocRef>, values: &[f32]) -> Obj {
        let arr = Obj::new_array(doc, values.len());
        if let Some(mut value) = arr.value_mut() {
            if let Value::Array(dst) = &mut *value {
                dst.items.extend(values.iter().map(|&v| Obj::new_real(v)));
            }
        }
        arr
    }

    /// `[x0 y0 x1 y1]` array for `rect`.
    pub fn new_rect(doc: Option<&DocRef>, rect: Rect) -> Obj {
        Obj::new_real_array(doc, &[rect.x0, rect.y0, rect.x1, rect.y1])
    }

    /// Six-number array for `matrix`.
    pub fn new_matrix(doc: Option<&DocRef>, matrix: Matrix) -> Obj {
        Obj::new_real_array(doc, &matrix.entries())
    }

    /// `[x y]` array for `point`.
    pub fn new_point(doc: Option<&DocRef>, point: Point) -> Obj {
        Obj::new_real_array(doc, &[point.x, point.y])
    }
}
