//! Testing functions and utilities useful for benchmarking, debugging and
//! smoke testing.
//!
//! [`Sphere`] is recommended for first tests. [`Rosenbrock`] can be used for
//! more challenging conditions (a long, narrow, parabolic shaped flat valley).
//!
//! # References
//!
//! \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
//! Problems](https://arxiv.org/abs/1308.4008)
//!
//! \[2\] [Numerical Methods for Unconstrained Optimization and Nonlinear
//! Equations](https://epubs.siam.org/doi/book/10.1137/1.9781611971200)

#![allow(unused)]

use nalgebra::{
    dvector,
    storage::{Storage, StorageMut},
    DVector, Dyn, IsContiguous, OVector, Vector,
};

use crate::core::{Domain, Function, Gradient, Problem};

/// Extension of the [`Problem`] trait that provides additional information
/// that is useful for testing optimizers.
pub trait TestProblem: Problem {
    /// Standard initial values for the problem. Using the same initial values
    /// is essential for fair comparison of methods.
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>>;
}

/// Extension of the [`Function`] trait that provides additional information
/// that is useful for testing optimizers.
pub trait TestFunction: Function + TestProblem {
    /// A set of global optima (if known and finite). This is mostly just for
    /// information, for example to know how close an optimizer got even if it
    /// failed. For testing if a given point is a global optimum,
    /// [`TestFunction::is_optimum`] should be used.
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        Vec::new()
    }

    /// Test if given point is a global optimum, given the tolerance `eps`.
    fn is_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}

/// Sphere function \[1\], the paraboloid `sum (x_i - c_i)^2` with arbitrary
/// center.
///
/// Trivial, convex and smooth, so any sensible configuration must find the
/// minimum.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: DVector<f64>,
}

impl Sphere {
    /// Initializes the function with given dimension, centered in the origin.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self {
            center: DVector::zeros(n),
        }
    }

    /// Initializes the function with the minimum shifted into given point.
    ///
    /// A shifted center makes the zero point a non-stationary initial guess,
    /// which an all-zeros sphere does not.
    pub fn shifted(center: Vec<f64>) -> Self {
        assert!(!center.is_empty(), "center must not be empty");
        Self {
            center: DVector::from_vec(center),
        }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Sphere {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(self.center.nrows())
    }
}

impl Function for Sphere {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.iter()
            .zip(self.center.iter())
            .map(|(xi, ci)| (xi - ci).powi(2))
            .sum()
    }
}

impl Gradient for Sphere {
    fn grad<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        for i in 0..x.nrows() {
            gx[i] = 2.0 * (x[i] - self.center[i]);
        }
    }
}

impl TestProblem for Sphere {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let n = self.center.nrows();
        vec![
            DVector::from_element(n, 10.0),
            DVector::from_iterator(n, (0..n).map(|i| -2.5 * (i + 1) as f64)),
        ]
    }
}

impl TestFunction for Sphere {
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![self.center.clone()]
    }

    fn is_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (x - &self.center).norm() <= eps
    }
}

/// [Rosenbrock function](https://en.wikipedia.org/wiki/Rosenbrock_function)
/// \[1,2\] in two dimensions (also known as Rosenbrock's valley or banana
/// function).
///
/// The global minimum is inside a long, narrow, parabolic shaped flat valley.
/// The challenge is to find the minimum inside the valley.
#[derive(Debug, Clone, Copy)]
pub struct Rosenbrock {
    a: f64,
    b: f64,
}

impl Rosenbrock {
    /// Initializes the function with the standard parameters `a = 1` and
    /// `b = 100`.
    pub fn new() -> Self {
        Self::with_params(1.0, 100.0)
    }

    /// Initializes the function with given parameters of
    /// `(a - x_1)^2 + b * (x_2 - x_1^2)^2`.
    pub fn with_params(a: f64, b: f64) -> Self {
        assert!(b > 0.0, "b must be greater than zero");
        Self { a, b }
    }
}

impl Default for Rosenbrock {
    fn default() -> Self {
        Self::new()
    }
}

impl Problem for Rosenbrock {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(2)
    }
}

impl Function for Rosenbrock {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
    }
}

impl Gradient for Rosenbrock {
    fn grad<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        let valley = x[1] - x[0].powi(2);
        gx[0] = -2.0 * (self.a - x[0]) - 4.0 * self.b * x[0] * valley;
        gx[1] = 2.0 * self.b * valley;
    }
}

impl TestProblem for Rosenbrock {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![-1.2, 1.0], dvector![6.39, -0.221]]
    }
}

impl TestFunction for Rosenbrock {
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![self.a, self.a.powi(2)]]
    }

    fn is_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (x - dvector![self.a, self.a.powi(2)]).norm() <= eps
    }
}
