//! Finite-difference approximation of the gradient.
//!
//! The optimizer requires the [`Gradient`] trait. When the analytic gradient
//! is not available, [`FiniteDiff`] wraps any [`Function`] and provides a
//! forward-difference approximation instead.

use nalgebra::{
    storage::{Storage, StorageMut},
    ComplexField, Dyn, IsContiguous, OVector, RealField as _, Vector,
};
use num_traits::{One, Zero};

use crate::core::{Domain, Function, Gradient, Problem, RealField};

/// Wrapper that approximates the gradient of a function by forward finite
/// differences.
///
/// The step size respects the variable scale of the wrapped function's domain
/// (see [`Domain::with_scale`]), which matters for problems with highly
/// varying magnitudes of its variables.
///
/// # Examples
///
/// ```rust
/// use descent::nalgebra as na;
/// use descent::{Domain, FiniteDiff, Function, OptimizerDriver, Problem};
/// use na::{Dyn, IsContiguous};
///
/// struct Beale;
///
/// impl Problem for Beale {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         Domain::rect(vec![-4.5, -4.5], vec![4.5, 4.5])
///     }
/// }
///
/// impl Function for Beale {
///     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
///     where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///     {
///         (1.5 - x[0] + x[0] * x[1]).powi(2)
///             + (2.25 - x[0] + x[0] * x[1].powi(2)).powi(2)
///             + (2.625 - x[0] + x[0] * x[1].powi(3)).powi(2)
///     }
/// }
///
/// let f = FiniteDiff::new(&Beale);
/// let mut optimizer = OptimizerDriver::builder(&f)
///     .with_initial(vec![1.0, 0.5])
///     .build();
/// ```
pub struct FiniteDiff<'a, F: Function> {
    f: &'a F,
    scale: Option<OVector<F::Field, Dyn>>,
}

impl<'a, F: Function> FiniteDiff<'a, F> {
    /// Wraps given function, taking the variable scale from its domain.
    pub fn new(f: &'a F) -> Self {
        Self {
            f,
            scale: f.domain().scale().cloned(),
        }
    }
}

impl<F: Function> Problem for FiniteDiff<'_, F> {
    type Field = F::Field;

    fn domain(&self) -> Domain<Self::Field> {
        self.f.domain()
    }
}

impl<F: Function> Function for FiniteDiff<'_, F> {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.f.apply(x)
    }
}

impl<F: Function> Gradient for FiniteDiff<'_, F> {
    fn grad<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        let eps = F::Field::EPSILON_SQRT;
        let fx = self.f.apply(x);

        let mut x = x.clone_owned();

        for i in 0..x.nrows() {
            let xi = x[i];

            // Compute the step size. We would like to have the step as small
            // as possible (to be as close to the real derivative as possible).
            // But at the same time, very small step could cause
            // F(x + e_i * step_i) ~= F(x) with very small number of good
            // digits.
            //
            // A reasonable way to balance these competing needs is to scale
            // each component by x_i itself. To avoid problems when x_i is
            // close to zero, it is modified to take the typical magnitude
            // instead.
            let magnitude = match self.scale.as_ref() {
                Some(scale) => F::Field::one() / scale[i],
                None => F::Field::one(),
            };
            let step = eps * xi.abs().max(magnitude) * F::Field::one().copysign(xi);
            let step = if step == F::Field::zero() { eps } else { step };

            // grad[i] = (F(x + e_i * step_i) - F(x)) / step_i.
            x[i] = xi + step;
            gx[i] = (self.f.apply(&x) - fx) / step;

            // Restore the original value.
            x[i] = xi;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{gradient_descent::GradientDescentOptions, GradientDescent};
    use crate::testing::{Rosenbrock, TestFunction, TestProblem};

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::dvector;

    struct MixedVars;

    impl Problem for MixedVars {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::unconstrained(2)
        }
    }

    impl Function for MixedVars {
        fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
        {
            let x1 = x[0];
            let x2 = x[1];

            x1.powi(2) + x1 * x2 + x2.powi(3)
        }
    }

    #[test]
    fn mixed_vars_gradient() {
        let x = dvector![3.0, -3.0];
        let mut gx = dvector![0.0, 0.0];

        let func = FiniteDiff::new(&MixedVars);
        func.grad(&x, &mut gx);

        let expected = dvector![3.0, 30.0];
        assert_abs_diff_eq!(&gx, &expected, epsilon = 10e-6);
    }

    #[test]
    fn matches_analytic_gradient() {
        let func = Rosenbrock::new();
        let approx = FiniteDiff::new(&func);

        let points = func
            .initials()
            .into_iter()
            .chain([dvector![0.0, 0.0], dvector![2.0, -1.5]]);

        for x in points {
            let mut expected = dvector![0.0, 0.0];
            let mut actual = dvector![0.0, 0.0];

            func.grad(&x, &mut expected);
            approx.grad(&x, &mut actual);

            assert_relative_eq!(&actual, &expected, epsilon = 1e-4, max_relative = 1e-4);
        }
    }

    #[test]
    fn gradient_vanishes_at_optimum() {
        let func = Rosenbrock::new();
        let approx = FiniteDiff::new(&func);

        for x in func.optima() {
            assert!(func.is_optimum(&x, 1e-12));

            let mut gx = dvector![0.0, 0.0];
            approx.grad(&x, &mut gx);
            assert_abs_diff_eq!(&gx, &dvector![0.0, 0.0], epsilon = 1e-5);
        }
    }

    #[test]
    fn minimize_without_analytic_gradient() {
        let f = MixedVars;
        let approx = FiniteDiff::new(&f);
        let dom = approx.domain();

        let mut x = dvector![1.0, 1.0];

        // Finite differences limit the achievable gradient norm, so the
        // tolerance is looser than the default.
        let mut options = GradientDescentOptions::default();
        options
            .set_step_size(0.05)
            .set_grad_err_tol(1e-5)
            .set_iter_max(10_000);
        let mut gd = GradientDescent::with_options(&approx, &dom, options);

        let report = gd.minimize(&approx, &dom, &mut x).unwrap();

        // The local minimum of x1^2 + x1*x2 + x2^3 lies in (-1/12, 1/6).
        assert!(report.success);
        assert_abs_diff_eq!(x[0], -1.0 / 12.0, epsilon = 1e-3);
        assert_abs_diff_eq!(x[1], 1.0 / 6.0, epsilon = 1e-3);
    }
}
