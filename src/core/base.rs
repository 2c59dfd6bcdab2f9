use nalgebra::RealField as NalgebraRealField;

use super::domain::Domain;

/// The base trait for [`Function`](super::function::Function) and
/// [`Gradient`](super::function::Gradient).
pub trait Problem {
    /// Field type, f32 or f64.
    type Field: RealField + Copy;

    /// Gets the domain (dimensionality and bound constraints) of the problem.
    fn domain(&self) -> Domain<Self::Field>;
}

/// Extension of [`nalgebra::RealField`] with additional constants used in
/// numerical computations.
pub trait RealField: NalgebraRealField {
    /// Square root of double precision machine epsilon. This value is a
    /// standard choice of relative step size for first-order finite-difference
    /// approximations.
    const EPSILON_SQRT: Self;
}

impl RealField for f32 {
    const EPSILON_SQRT: Self = 0.00034526698;
}

impl RealField for f64 {
    const EPSILON_SQRT: Self = 0.000000014901161193847656;
}
