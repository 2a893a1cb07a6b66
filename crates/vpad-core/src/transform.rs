//! CSS transform compensation.
//!
//! A control embedded in a scaled or rotated container receives client
//! coordinates in viewport space. `LocalFrame` maps them back into the
//! control's untransformed local space, using the bounding rectangle and the
//! computed `transform` matrix the host reports.
//!
//! Built on `winnow` 0.7 for the `matrix(...)` / `matrix3d(...)` strings
//! returned by `getComputedStyle`.

use kurbo::{Affine, Point, Rect, Vec2};
use winnow::ascii::{float, multispace0};
use winnow::combinator::{alt, delimited, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

/// Parse a computed CSS `transform` value.
///
/// `none` (or an empty string) is the identity. Returns `None` for anything
/// that is not a 2D `matrix` or a `matrix3d`; callers treat that as no
/// transform.
pub fn parse_css_transform(text: &str) -> Option<Affine> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "none" {
        return Some(Affine::IDENTITY);
    }

    let mut rest = trimmed;
    let affine = parse_matrix.parse_next(&mut rest).ok()?;
    if !rest.trim().is_empty() {
        log::debug!("trailing input after css transform: {rest:?}");
        return None;
    }
    Some(affine)
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    delimited(multispace0, float, multispace0).parse_next(input)
}

fn parse_args(input: &mut &str) -> ModalResult<Vec<f64>> {
    delimited('(', separated(1.., parse_number, ','), ')').parse_next(input)
}

fn parse_matrix(input: &mut &str) -> ModalResult<Affine> {
    let name = alt(("matrix3d", "matrix")).parse_next(input)?;
    let v = parse_args.parse_next(input)?;
    match (name, v.len()) {
        ("matrix", 6) => Ok(Affine::new([v[0], v[1], v[2], v[3], v[4], v[5]])),
        // Column-major 4x4: keep the 2D part (m11 m12 m21 m22 m41 m42)
        ("matrix3d", 16) => Ok(Affine::new([v[0], v[1], v[4], v[5], v[12], v[13]])),
        _ => Err(ErrMode::Backtrack(ContextError::new())),
    }
}

// ─── Local frame ─────────────────────────────────────────────────────────

/// On-screen placement of a control: bounding box plus computed transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    /// Bounding client rectangle (viewport pixels).
    pub rect: Rect,
    /// Computed CSS transform of the element.
    pub transform: Affine,
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::new(Rect::ZERO)
    }
}

impl LocalFrame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            transform: Affine::IDENTITY,
        }
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Geometric center of the bounding box in viewport pixels.
    pub fn center(&self) -> Point {
        self.rect.center()
    }

    fn invertible(&self) -> bool {
        self.transform != Affine::IDENTITY && self.transform.determinant() != 0.0
    }

    /// Client position relative to the element's top-left corner, with the
    /// element's own transform undone.
    pub fn local_position(&self, client: Point) -> Point {
        let offset = Point::new(client.x - self.rect.x0, client.y - self.rect.y0);
        if !self.invertible() {
            return offset;
        }
        self.transform.inverse() * offset
    }

    /// Inverse of `local_position`: where a local point sits on screen now.
    pub fn client_position(&self, local: Point) -> Point {
        let offset = if self.invertible() {
            self.transform * local
        } else {
            local
        };
        Point::new(offset.x + self.rect.x0, offset.y + self.rect.y0)
    }

    /// Client position relative to the element's untransformed center.
    pub fn center_relative(&self, client: Point) -> Vec2 {
        let local = self.local_position(client);
        let (mut width, mut height) = (self.rect.width(), self.rect.height());

        if self.invertible() {
            let [a, b, c, d, _, _] = self.transform.as_coeffs();
            width /= a.hypot(b);
            height /= c.hypot(d);
        }

        Vec2::new(local.x - width / 2.0, local.y - height / 2.0)
    }
}
