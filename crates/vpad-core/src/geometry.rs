//! Pure geometry helpers for stick math.
//!
//! Coordinates are screen pixels (y grows downward). Angles follow
//! `atan2(y, x)`, so 0° points east and angles grow toward +y.

use kurbo::{Point, Vec2};
use serde::{Serialize, Serializer};
use std::f64::consts::PI;
use std::fmt;

/// An angle in both radians and normalized degrees (`0.0 ..< 360.0`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Angle {
    pub radian: f64,
    pub degree: f64,
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Angle of `(x, y)` with optional axis locks.
///
/// Locks are applied before `atan2`: a locked axis contributes 0, and a
/// fully-locked (or zero) vector reports an angle of 0.
pub fn calculate_angle(x: f64, y: f64, lock_x: bool, lock_y: bool) -> Angle {
    let ex = if lock_x { 0.0 } else { x };
    let ey = if lock_y { 0.0 } else { y };

    if ex == 0.0 && ey == 0.0 {
        return Angle::default();
    }

    let radian = ey.atan2(ex);
    let degree = (radian * 180.0 / PI + 360.0) % 360.0;
    Angle { radian, degree }
}

/// Scale `v` down onto the circle of `radius` if it lies outside.
pub fn clamp_to_circle(v: Vec2, radius: f64) -> Vec2 {
    let len = v.hypot();
    if len <= radius {
        return v;
    }
    v * (radius / len)
}

/// Clamp each axis of `v` into `-size ..= size`.
pub fn clamp_to_square(v: Vec2, size: f64) -> Vec2 {
    Vec2::new(v.x.clamp(-size, size), v.y.clamp(-size, size))
}

/// Unit vector in the direction of `v`; the zero vector stays zero.
pub fn normalize_vector(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len == 0.0 {
        return Vec2::ZERO;
    }
    v / len
}

// ─── Compass ─────────────────────────────────────────────────────────────

/// Eight-way compass sector, or `Neutral` inside the deadzone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompassDirection {
    #[default]
    Neutral,
    E,
    NE,
    N,
    NW,
    W,
    SW,
    S,
    SE,
}

/// Sectors counter-clockwise from east, 45° apart.
const SECTORS: [CompassDirection; 8] = [
    CompassDirection::E,
    CompassDirection::NE,
    CompassDirection::N,
    CompassDirection::NW,
    CompassDirection::W,
    CompassDirection::SW,
    CompassDirection::S,
    CompassDirection::SE,
];

impl CompassDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "",
            Self::E => "e",
            Self::NE => "ne",
            Self::N => "n",
            Self::NW => "nw",
            Self::W => "w",
            Self::SW => "sw",
            Self::S => "s",
            Self::SE => "se",
        }
    }

    pub fn is_neutral(self) -> bool {
        self == Self::Neutral
    }

    /// The cardinal letters this direction is made of (`ne` → {n, e}).
    pub fn cardinals(self) -> Cardinals {
        match self {
            Self::Neutral => Cardinals::EMPTY,
            Self::E => Cardinals::E,
            Self::NE => Cardinals::N.union(Cardinals::E),
            Self::N => Cardinals::N,
            Self::NW => Cardinals::N.union(Cardinals::W),
            Self::W => Cardinals::W,
            Self::SW => Cardinals::S.union(Cardinals::W),
            Self::S => Cardinals::S,
            Self::SE => Cardinals::S.union(Cardinals::E),
        }
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CompassDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Classify `degree` into one of eight 45° sectors centered on the
/// cardinal and diagonal directions.
///
/// `force <= threshold` yields `Neutral`. Any degree is accepted (negative
/// or beyond 360); an exact sector boundary such as 22.5° falls into the
/// counter-clockwise neighbour.
pub fn compass_direction(degree: f64, force: f64, threshold: f64) -> CompassDirection {
    if force <= threshold {
        return CompassDirection::Neutral;
    }
    let normalized = ((degree % 360.0) + 360.0) % 360.0;
    let index = (normalized / 45.0).round() as usize % SECTORS.len();
    SECTORS[index]
}

// ─── Cardinal letter sets ────────────────────────────────────────────────

/// Set of cardinal letters (n, s, e, w) active in a compass direction.
///
/// Used to report which letters were captured or released between two
/// consecutive samples, e.g. `n` → `ne` captures `e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cardinals(u8);

impl Cardinals {
    pub const EMPTY: Self = Self(0);
    pub const N: Self = Self(1);
    pub const S: Self = Self(1 << 1);
    pub const E: Self = Self(1 << 2);
    pub const W: Self = Self(1 << 3);

    const LETTERS: [(Cardinals, char); 4] = [
        (Self::N, 'n'),
        (Self::S, 's'),
        (Self::E, 'e'),
        (Self::W, 'w'),
    ];

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Letters present in `next` but not in `prev`.
    pub fn captured(prev: CompassDirection, next: CompassDirection) -> Self {
        next.cardinals().difference(prev.cardinals())
    }

    /// Letters present in `prev` but no longer in `next`.
    pub fn released(prev: CompassDirection, next: CompassDirection) -> Self {
        prev.cardinals().difference(next.cardinals())
    }
}

impl fmt::Display for Cardinals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, letter) in Self::LETTERS {
            if self.contains(flag) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for Cardinals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
