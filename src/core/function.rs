use nalgebra::{
    storage::{Storage, StorageMut},
    Dyn, IsContiguous, Vector,
};

use super::base::Problem;

/// Definition of an objective function.
///
/// ## Defining a function
///
/// A function is any type that implements [`Function`] and [`Problem`] traits.
///
/// ```rust
/// use descent::nalgebra as na;
/// use descent::{Domain, Function, Problem};
/// use na::{Dyn, IsContiguous};
///
/// struct Quadratic {
///     center: Vec<f64>,
/// }
///
/// impl Problem for Quadratic {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         Domain::unconstrained(self.center.len())
///     }
/// }
///
/// impl Function for Quadratic {
///     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
///     where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///     {
///         x.iter()
///             .zip(self.center.iter())
///             .map(|(xi, ci)| (xi - ci).powi(2))
///             .sum()
///     }
/// }
/// ```
pub trait Function: Problem {
    /// Calculates the function value in given point.
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}

/// Definition of a function with a known gradient.
///
/// First-order methods consume the objective through this trait. Types that
/// cannot provide an analytic gradient can be wrapped in
/// [`FiniteDiff`](crate::derivatives::FiniteDiff), which approximates the
/// gradient by forward finite differences.
///
/// ## Providing the gradient
///
/// ```rust
/// use descent::nalgebra as na;
/// use descent::{Domain, Function, Gradient, Problem};
/// use na::{Dyn, IsContiguous};
///
/// struct Quadratic {
///     center: Vec<f64>,
/// }
///
/// # impl Problem for Quadratic {
/// #     type Field = f64;
/// #
/// #     fn domain(&self) -> Domain<Self::Field> {
/// #         Domain::unconstrained(self.center.len())
/// #     }
/// # }
/// #
/// # impl Function for Quadratic {
/// #     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
/// #     where
/// #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
/// #     {
/// #         x.iter()
/// #             .zip(self.center.iter())
/// #             .map(|(xi, ci)| (xi - ci).powi(2))
/// #             .sum()
/// #     }
/// # }
/// #
/// impl Gradient for Quadratic {
///     fn grad<Sx, Sg>(
///         &self,
///         x: &na::Vector<Self::Field, Dyn, Sx>,
///         gx: &mut na::Vector<Self::Field, Dyn, Sg>,
///     ) where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///         Sg: na::storage::StorageMut<Self::Field, Dyn>,
///     {
///         for (i, (xi, ci)) in x.iter().zip(self.center.iter()).enumerate() {
///             gx[i] = 2.0 * (xi - ci);
///         }
///     }
/// }
/// ```
pub trait Gradient: Function {
    /// Calculates the gradient of the function in given point.
    fn grad<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>;

    /// Calculates the function value and the gradient in given point.
    ///
    /// The default implementation evaluates both separately. If the value and
    /// the gradient share intermediate computations, consider overriding the
    /// default implementation, because optimizers prefer calling this method.
    fn apply_grad<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sg>,
    ) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        self.grad(x, gx);
        self.apply(x)
    }
}
