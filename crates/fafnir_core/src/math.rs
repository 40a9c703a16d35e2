//! # Math Types
//!
//! The canonical pose representations used by the transform hierarchy and by
//! the EntityResource payload format. Everything here is `Pod` so instances
//! can be written into and read out of binary resources byte-for-byte.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D Vector - position, velocity, direction
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// 4x4 column-major transform matrix.
///
/// This is the local/world pose type of the transform hierarchy and the
/// payload layout of transform instances inside an EntityResource (64 raw
/// little-endian f32 bytes per instance).
///
/// Convention: column vectors. `a * b` applies `b` first, so a child's world
/// pose is `parent_world * local`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat4 {
    /// Matrix elements, column-major: element `(row, col)` is `m[col * 4 + row]`.
    pub m: [f32; 16],
}

impl Mat4 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Creates a translation matrix
    #[must_use]
    pub const fn from_translation(t: Vec3) -> Self {
        Self {
            m: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                t.x, t.y, t.z, 1.0,
            ],
        }
    }

    /// Creates a uniform scale matrix
    #[must_use]
    pub const fn from_scale(s: f32) -> Self {
        Self {
            m: [
                s, 0.0, 0.0, 0.0, //
                0.0, s, 0.0, 0.0, //
                0.0, 0.0, s, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Returns the translation column
    #[must_use]
    pub const fn translation(&self) -> Vec3 {
        Vec3::new(self.m[12], self.m[13], self.m[14])
    }

    /// Transforms a point (w = 1)
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0] * p.x + m[4] * p.y + m[8] * p.z + m[12],
            m[1] * p.x + m[5] * p.y + m[9] * p.z + m[13],
            m[2] * p.x + m[6] * p.y + m[10] * p.z + m[14],
        )
    }

    /// Element-wise approximate equality, for tests and debug checks
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = &self.m;
        let b = &rhs.m;
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[k * 4 + row] * b[col * 4 + k];
                }
                out[col * 4 + row] = sum;
            }
        }
        Self { m: out }
    }
}
