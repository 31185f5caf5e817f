use core::ops::{Mul, MulAssign};

/// Vertical axis convention used by [`AffineMatrix::projection_with`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum YAxis {
    /// Origin at the top-left corner, +Y pointing down (screen convention).
    #[default]
    Down,
    /// Origin at the bottom-left corner, +Y pointing up (math convention).
    Up,
}

/// 2D homogeneous transform stored as a row-major 3x3 matrix.
///
/// The matrix acts on column vectors `(x, y, 1)`. Only affine operations are
/// exposed, so the bottom row stays `(0, 0, 1)` in practice; storage does not
/// enforce it.
///
/// Chaining follows the local-frame convention: every call post-multiplies,
/// so `m.translate(..).scale(..)` first scales a point, then translates it,
/// then applies `m`. Each step is expressed in the frame produced by the
/// previous one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AffineMatrix {
    values: [f32; 9],
}

impl AffineMatrix {
    pub const IDENTITY: Self = Self {
        values: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Builds a matrix from nine row-major coefficients.
    #[inline]
    pub const fn from_values(values: [f32; 9]) -> Self {
        Self { values }
    }

    /// Orthographic projection from a `width` x `height` logical rectangle with a
    /// top-left origin to clip space `[-1, 1]²`.
    #[inline]
    pub fn projection(width: f32, height: f32) -> Self {
        Self::projection_with(width, height, YAxis::Down)
    }

    /// Orthographic projection with an explicit vertical axis convention.
    ///
    /// `YAxis::Down` maps `(0, 0)` to clip `(-1, 1)` and `(w, h)` to `(1, -1)`.
    /// `YAxis::Up` maps `(0, 0)` to clip `(-1, -1)` and `(w, h)` to `(1, 1)`.
    pub fn projection_with(width: f32, height: f32, y_axis: YAxis) -> Self {
        let sx = 2.0 / width;
        let (sy, ty) = match y_axis {
            YAxis::Down => (-2.0 / height, 1.0),
            YAxis::Up => (2.0 / height, -1.0),
        };
        Self::from_values([sx, 0.0, -1.0, 0.0, sy, ty, 0.0, 0.0, 1.0])
    }

    /// Row-major coefficients.
    #[inline]
    pub fn values(&self) -> &[f32; 9] {
        &self.values
    }

    /// Post-multiplies by `other` (`self = self · other`).
    ///
    /// `other` is applied to points before the existing transform.
    pub fn multiply(self, other: AffineMatrix) -> Self {
        let a = &self.values;
        let b = &other.values;
        let mut out = [0.0f32; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = a[row * 3] * b[col]
                    + a[row * 3 + 1] * b[3 + col]
                    + a[row * 3 + 2] * b[6 + col];
            }
        }
        Self { values: out }
    }

    /// Translation in units of the current local frame.
    #[inline]
    pub fn translate(self, tx: f32, ty: f32) -> Self {
        self.multiply(Self::from_values([1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0]))
    }

    /// Rotation by `radians` around the local origin.
    ///
    /// With the default y-down projection a positive angle turns clockwise on screen.
    #[inline]
    pub fn rotate(self, radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        self.multiply(Self::from_values([c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0]))
    }

    #[inline]
    pub fn scale(self, sx: f32, sy: f32) -> Self {
        self.multiply(Self::from_values([sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0]))
    }

    /// Applies the transform to a point.
    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let v = &self.values;
        (v[0] * x + v[1] * y + v[2], v[3] * x + v[4] * y + v[5])
    }

    /// Column-major layout with each column padded to four floats, matching a
    /// WGSL `mat3x3<f32>` in a uniform buffer.
    pub fn to_gpu_columns(&self) -> [[f32; 4]; 3] {
        let v = &self.values;
        [
            [v[0], v[3], v[6], 0.0],
            [v[1], v[4], v[7], 0.0],
            [v[2], v[5], v[8], 0.0],
        ]
    }
}

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for AffineMatrix {
    type Output = AffineMatrix;
    #[inline]
    fn mul(self, rhs: AffineMatrix) -> AffineMatrix {
        self.multiply(rhs)
    }
}

impl MulAssign for AffineMatrix {
    #[inline]
    fn mul_assign(&mut self, rhs: AffineMatrix) {
        *self = self.multiply(rhs);
    }
}
