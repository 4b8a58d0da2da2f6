use ndarray::{arr1, arr2, Array2, ArrayView2};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Multiply two 2D arrays.
    pub fn multiply(lhs: ArrayView2<f64>, rhs: ArrayView2<f64>) -> Array2<f64> {
        lhs.dot(&rhs)
    }

    /// Applies a 3x3 matrix to a column vector.
    pub fn apply(matrix: ArrayView2<f64>, vector: [f64; 3]) -> [f64; 3] {
        let out = matrix.dot(&arr1(&vector));
        [out[0], out[1], out[2]]
    }

    /// Frame rotation by `angle` radians about the x axis.
    pub fn rotation_x(angle: f64) -> Array2<f64> {
        let (s, c) = angle.sin_cos();
        arr2(&[[1.0, 0.0, 0.0], [0.0, c, s], [0.0, -s, c]])
    }

    /// Frame rotation by `angle` radians about the y axis.
    pub fn rotation_y(angle: f64) -> Array2<f64> {
        let (s, c) = angle.sin_cos();
        arr2(&[[c, 0.0, -s], [0.0, 1.0, 0.0], [s, 0.0, c]])
    }

    /// Frame rotation by `angle` radians about the z axis.
    pub fn rotation_z(angle: f64) -> Array2<f64> {
        let (s, c) = angle.sin_cos();
        arr2(&[[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn dot(lhs: [f64; 3], rhs: [f64; 3]) -> f64 {
        lhs[0] * rhs[0] + lhs[1] * rhs[1] + lhs[2] * rhs[2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotation_about_z_moves_x_axis() {
        let rotated = MatrixHelper::apply(MatrixHelper::rotation_z(FRAC_PI_2).view(), [1.0, 0.0, 0.0]);
        assert!(rotated[0].abs() < 1e-12);
        assert!((rotated[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_and_transpose_cancel() {
        let m = MatrixHelper::rotation_x(0.3);
        let product = MatrixHelper::multiply(m.view(), m.t());
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }
}
