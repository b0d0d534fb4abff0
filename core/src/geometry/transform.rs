use super::{utils_2d, Point, Segment};
use crate::error::{LaminateError, LaminateResult};
use nalgebra::{Matrix3, Vector3};

/// 2D affine transform stored as a homogeneous 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    matrix: Matrix3<f64>,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::from_matrix(Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0))
    }

    /// Counter-clockwise rotation about the origin.
    pub fn rotation(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_matrix(Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0))
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::from_matrix(Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0))
    }

    /// Compose: apply `self` first, then `next`.
    pub fn then(&self, next: &Affine2) -> Affine2 {
        Self::from_matrix(next.matrix * self.matrix)
    }

    pub fn apply(&self, point: Point) -> Point {
        let v = self.matrix * Vector3::new(point[0], point[1], 1.0);
        [v.x, v.y]
    }

    /// Coefficients `[a, b, d, e, xoff, yoff]` such that
    /// `x' = a*x + b*y + xoff` and `y' = d*x + e*y + yoff`.
    pub fn coefficients(&self) -> [f64; 6] {
        let m = &self.matrix;
        [m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)], m[(0, 2)], m[(1, 2)]]
    }

    pub fn to_geo(&self) -> geo::AffineTransform<f64> {
        let [a, b, d, e, xoff, yoff] = self.coefficients();
        geo::AffineTransform::new(a, b, xoff, d, e, yoff)
    }
}

/// Build the transform that carries segment `from` onto segment `to`.
///
/// Decomposed as translate `from[0]` to the origin, rotate onto the x-axis,
/// scale, rotate to the angle of `to`, translate to `to[0]`. Each axis scale
/// defaults to the length ratio `|to| / |from|` when not given.
pub fn transform_from_two_lines(
    from: Segment,
    to: Segment,
    scale_x: Option<f64>,
    scale_y: Option<f64>,
) -> LaminateResult<Affine2> {
    let v1 = utils_2d::sub(from[1], from[0]);
    let v2 = utils_2d::sub(to[1], to[0]);
    let l1 = utils_2d::length(v1);
    let l2 = utils_2d::length(v2);
    if l1 == 0.0 || l2 == 0.0 {
        return Err(LaminateError::GeometryDegenerate(
            "cannot map between zero-length lines".to_string(),
        ));
    }

    let ratio = l2 / l1;
    let sx = scale_x.unwrap_or(ratio);
    let sy = scale_y.unwrap_or(ratio);

    let q1 = v1[1].atan2(v1[0]);
    let q2 = v2[1].atan2(v2[0]);

    Ok(Affine2::translation(-from[0][0], -from[0][1])
        .then(&Affine2::rotation(-q1))
        .then(&Affine2::scaling(sx, sy))
        .then(&Affine2::rotation(q2))
        .then(&Affine2::translation(to[0][0], to[0][1])))
}

/// Unsigned angle between the directions of two segments, in radians.
pub fn angle_between_lines(a: Segment, b: Segment) -> LaminateResult<f64> {
    let v1 = utils_2d::sub(a[1], a[0]);
    let v2 = utils_2d::sub(b[1], b[0]);
    let l1 = utils_2d::length(v1);
    let l2 = utils_2d::length(v2);
    if l1 == 0.0 || l2 == 0.0 {
        return Err(LaminateError::GeometryDegenerate(
            "angle of a zero-length segment is undefined".to_string(),
        ));
    }
    let cos = (utils_2d::dot_2d(v1, v2) / (l1 * l2)).clamp(-1.0, 1.0);
    Ok(cos.acos())
}
