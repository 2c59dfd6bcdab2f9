#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![warn(missing_docs)]

//! # Descent
//!
//! A pure Rust implementation of first-order gradient descent optimization
//! with bound constraints.
//!
//! This library provides the classical gradient descent method together with
//! its momentum-based and adaptive variants (momentum, Nesterov accelerated
//! gradient, AdaGrad, RMSProp, Adam, AdaMax, Nadam) behind one interface.
//! Bound constraints for variables are supported first-class through a smooth
//! change of variables, which is useful for engineering applications. The
//! interface is designed to give full control over the process, from a single
//! call that runs the whole loop to manual stepping with per-iteration
//! tracing.
//!
//! ## Problem
//!
//! The problem of unconstrained optimization is about finding values of *n*
//! variables that minimize a scalar objective function. Mathematically, the
//! problem is formulated as
//!
//! ```text
//! minimize f(x)
//!
//! where x = { x1, ..., xn }
//! ```
//!
//! Moreover, it is possible to add bound constraints to the variables. That
//! is:
//!
//! ```text
//! Li <= xi <= Ui for some bounds [L, U] for every i
//! ```
//!
//! The bounds can be negative/positive infinity, effectively making the
//! variable unconstrained.
//!
//! More sophisticated constraints (such as (in)equalities consisting of
//! multiple variables) are currently out of the scope of this library.
//!
//! When it comes to code, the problem is any type that implements the
//! [`Problem`], [`Function`] and [`Gradient`] traits.
//!
//! ```rust
//! // Descent is based on `nalgebra` crate.
//! use descent::nalgebra as na;
//! use descent::{Domain, Function, Gradient, Problem};
//! use na::{Dyn, IsContiguous};
//!
//! // A problem is represented by a type.
//! struct Rosenbrock {
//!     a: f64,
//!     b: f64,
//! }
//!
//! impl Problem for Rosenbrock {
//!     // The numeric type. Usually f64 or f32.
//!     type Field = f64;
//!
//!     // Specification for the domain. At the very least, the dimension
//!     // must be known.
//!     fn domain(&self) -> Domain<Self::Field> {
//!         Domain::unconstrained(2)
//!     }
//! }
//!
//! impl Function for Rosenbrock {
//!     // Evaluate trial values of variables to the objective.
//!     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//!     where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!     {
//!         (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
//!     }
//! }
//!
//! impl Gradient for Rosenbrock {
//!     // Evaluate the gradient of the objective.
//!     fn grad<Sx, Sg>(
//!         &self,
//!         x: &na::Vector<Self::Field, Dyn, Sx>,
//!         gx: &mut na::Vector<Self::Field, Dyn, Sg>,
//!     ) where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!         Sg: na::storage::StorageMut<Self::Field, Dyn>,
//!     {
//!         gx[0] = -2.0 * (self.a - x[0])
//!             - 4.0 * self.b * x[0] * (x[1] - x[0].powi(2));
//!         gx[1] = 2.0 * self.b * (x[1] - x[0].powi(2));
//!     }
//! }
//! ```
//!
//! If the analytic gradient is not available, wrap the function in
//! [`FiniteDiff`] which approximates it by [finite
//! differences](https://en.wikipedia.org/wiki/Finite_difference_method)
//! (usually sufficient in practice).
//!
//! The previous example used unconstrained variables, but it is also possible
//! to specify bounds.
//!
//! ```rust
//! # use descent::nalgebra as na;
//! # use descent::*;
//! #
//! # struct Rosenbrock {
//! #     a: f64,
//! #     b: f64,
//! # }
//! #
//! impl Problem for Rosenbrock {
//! #     type Field = f64;
//!     // ...
//!
//!     fn domain(&self) -> Domain<Self::Field> {
//!         [(-10.0, 10.0), (-10.0, 10.0)].into_iter().collect()
//!     }
//! }
//! ```
//!
//! ## Optimization
//!
//! When you have your function available, you can use the [`OptimizerDriver`]
//! to run the iteration process until a stopping criterion is reached.
//!
//! ```rust
//! use descent::OptimizerDriver;
//! # use descent::nalgebra as na;
//! # use descent::{Domain, Function, Gradient, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct Rosenbrock {
//! #     a: f64,
//! #     b: f64,
//! # }
//! #
//! # impl Problem for Rosenbrock {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Function for Rosenbrock {
//! #     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
//! #     }
//! # }
//! #
//! # impl Gradient for Rosenbrock {
//! #     fn grad<Sx, Sg>(
//! #         &self,
//! #         x: &na::Vector<Self::Field, Dyn, Sx>,
//! #         gx: &mut na::Vector<Self::Field, Dyn, Sg>,
//! #     ) where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #         Sg: na::storage::StorageMut<Self::Field, Dyn>,
//! #     {
//! #         gx[0] = -2.0 * (self.a - x[0])
//! #             - 4.0 * self.b * x[0] * (x[1] - x[0].powi(2));
//! #         gx[1] = 2.0 * self.b * (x[1] - x[0].powi(2));
//! #     }
//! # }
//!
//! let f = Rosenbrock { a: 1.0, b: 1.0 };
//! let mut optimizer = OptimizerDriver::builder(&f)
//!     .with_initial(vec![-1.2, 1.0])
//!     .build();
//!
//! let report = optimizer.minimize().expect("optimizer encountered an error");
//!
//! if report.success {
//!     println!("converged in {} iterations", report.iterations);
//! } else {
//!     println!("stopped without convergence");
//! }
//! ```
//!
//! The update rule variant and all the stopping tolerances can be configured
//! through
//! [`GradientDescentOptions`](algo::gradient_descent::GradientDescentOptions).
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
mod core;
pub mod derivatives;
pub mod driver;
pub mod trace;
pub mod transform;

pub use core::*;
pub use derivatives::FiniteDiff;
pub use driver::OptimizerDriver;

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
