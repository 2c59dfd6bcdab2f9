//! High-level API for optimization.
//!
//! This module contains a "driver" that encapsulates all internal state and
//! provides a simple API to run the iterative process.
//!
//! The simplest way of using the driver is to initialize it with the defaults:
//!
//! ```rust
//! use descent::OptimizerDriver;
//! # use descent::{Domain, Problem};
//! #
//! # struct MyFunction;
//! #
//! # impl MyFunction {
//! #     fn new() -> Self {
//! #         Self
//! #     }
//! # }
//! #
//! # impl Problem for MyFunction {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//!
//! let f = MyFunction::new();
//!
//! let mut optimizer = OptimizerDriver::new(&f);
//! ```
//!
//! If you need to specify additional settings, use the builder:
//!
//! ```rust
//! use descent::OptimizerDriver;
//! # use descent::{Domain, Problem};
//! #
//! # struct MyFunction;
//! #
//! # impl MyFunction {
//! #     fn new() -> Self {
//! #         Self
//! #     }
//! # }
//! #
//! # impl Problem for MyFunction {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//!
//! let f = MyFunction::new();
//!
//! let mut optimizer = OptimizerDriver::builder(&f)
//!     .with_initial(vec![10.0, -10.0])
//!     .with_algo(descent::algo::GradientDescent::new)
//!     .build();
//! ```
//!
//! Once you have the driver, you can use it to find the minimum:
//!
//! ```rust
//! # use descent::nalgebra as na;
//! # use descent::{Domain, Function, Gradient, OptimizerDriver, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct MyFunction;
//! #
//! # impl MyFunction {
//! #     fn new() -> Self {
//! #         Self
//! #     }
//! # }
//! #
//! # impl Problem for MyFunction {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Function for MyFunction {
//! #     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         x[0].powi(2) + x[1].powi(2)
//! #     }
//! # }
//! #
//! # impl Gradient for MyFunction {
//! #     fn grad<Sx, Sg>(
//! #         &self,
//! #         x: &na::Vector<Self::Field, Dyn, Sx>,
//! #         gx: &mut na::Vector<Self::Field, Dyn, Sg>,
//! #     ) where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #         Sg: na::storage::StorageMut<Self::Field, Dyn>,
//! #     {
//! #         gx[0] = 2.0 * x[0];
//! #         gx[1] = 2.0 * x[1];
//! #     }
//! # }
//! #
//! # let f = MyFunction::new();
//! #
//! # let mut optimizer = OptimizerDriver::new(&f);
//! #
//! let result = optimizer.find(|state| state.fx() <= 1e-6 || state.iter() >= 100);
//! ```
//!
//! If you need more control over the iteration process, you can do the
//! iterations manually:
//!
//! ```rust
//! # use descent::nalgebra as na;
//! # use descent::{Domain, Function, Gradient, OptimizerDriver, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct MyFunction;
//! #
//! # impl MyFunction {
//! #     fn new() -> Self {
//! #         Self
//! #     }
//! # }
//! #
//! # impl Problem for MyFunction {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Function for MyFunction {
//! #     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         x[0].powi(2) + x[1].powi(2)
//! #     }
//! # }
//! #
//! # impl Gradient for MyFunction {
//! #     fn grad<Sx, Sg>(
//! #         &self,
//! #         x: &na::Vector<Self::Field, Dyn, Sx>,
//! #         gx: &mut na::Vector<Self::Field, Dyn, Sg>,
//! #     ) where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #         Sg: na::storage::StorageMut<Self::Field, Dyn>,
//! #     {
//! #         gx[0] = 2.0 * x[0];
//! #         gx[1] = 2.0 * x[1];
//! #     }
//! # }
//! #
//! # let f = MyFunction::new();
//! #
//! # let mut optimizer = OptimizerDriver::new(&f);
//! #
//! loop {
//!     let (_, fx) = optimizer.next().expect("no optimizer error");
//!     // ...
//! #   break;
//! }
//! ```

use nalgebra::{convert, DimName, Dyn, OVector, U1};

use crate::{
    algo::{
        gradient_descent::{GradientDescentError, Report},
        GradientDescent,
    },
    Domain, Function, Gradient, Optimizer, Problem,
};

struct Builder<'a, F: Problem, A> {
    f: &'a F,
    dom: Domain<F::Field>,
    algo: A,
    x0: OVector<F::Field, Dyn>,
}

impl<'a, F: Problem> Builder<'a, F, GradientDescent<F>> {
    fn new(f: &'a F) -> Self {
        let dom = f.domain();
        let algo = GradientDescent::new(f, &dom);

        let dim = Dyn(dom.dim());
        let x0 = OVector::from_element_generic(dim, U1::name(), convert(0.0));

        Self { f, dom, algo, x0 }
    }
}

impl<'a, F: Problem, A> Builder<'a, F, A> {
    fn with_initial(mut self, x0: Vec<F::Field>) -> Self {
        let dim = Dyn(self.dom.dim());
        self.x0 = OVector::from_vec_generic(dim, U1::name(), x0);
        self
    }

    fn with_algo<A2, FA>(self, factory: FA) -> Builder<'a, F, A2>
    where
        FA: FnOnce(&F, &Domain<F::Field>) -> A2,
    {
        let algo = factory(self.f, &self.dom);

        Builder {
            f: self.f,
            dom: self.dom,
            algo,
            x0: self.x0,
        }
    }

    fn build(mut self) -> Self {
        self.dom.project(&mut self.x0);
        self
    }
}

/// Builder for the [`OptimizerDriver`].
pub struct OptimizerBuilder<'a, F: Problem, A>(Builder<'a, F, A>);

impl<'a, F: Problem, A> OptimizerBuilder<'a, F, A> {
    /// Sets the initial point from which the iterative process starts.
    pub fn with_initial(self, x0: Vec<F::Field>) -> Self {
        Self(self.0.with_initial(x0))
    }

    /// Sets specific algorithm to be used.
    ///
    /// This builder method accepts a closure that takes the reference to the
    /// problem and its domain. You can pass the `new` constructor directly
    /// (e.g., `GradientDescent::new`) or a closure calling `with_options`.
    pub fn with_algo<A2, FA>(self, factory: FA) -> OptimizerBuilder<'a, F, A2>
    where
        FA: FnOnce(&F, &Domain<F::Field>) -> A2,
    {
        OptimizerBuilder(self.0.with_algo(factory))
    }

    /// Builds the [`OptimizerDriver`].
    pub fn build(self) -> OptimizerDriver<'a, F, A> {
        let Builder { f, dom, algo, x0 } = self.0.build();

        OptimizerDriver {
            f,
            dom,
            algo,
            x: x0,
            fx: convert(f64::INFINITY),
        }
    }
}

/// The driver for the optimization process.
///
/// For default settings, use [`OptimizerDriver::new`]. For more flexibility,
/// use [`OptimizerDriver::builder`]. For the usage of the driver, see
/// [module](self) documentation.
pub struct OptimizerDriver<'a, F: Problem, A> {
    f: &'a F,
    dom: Domain<F::Field>,
    algo: A,
    x: OVector<F::Field, Dyn>,
    fx: F::Field,
}

impl<'a, F: Problem> OptimizerDriver<'a, F, GradientDescent<F>> {
    /// Returns the builder for specifying additional settings.
    pub fn builder(f: &'a F) -> OptimizerBuilder<'a, F, GradientDescent<F>> {
        OptimizerBuilder(Builder::new(f))
    }

    /// Initializes the driver with the default settings.
    pub fn new(f: &'a F) -> Self {
        OptimizerDriver::builder(f).build()
    }
}

impl<'a, F: Problem, A> OptimizerDriver<'a, F, A> {
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Returns the current function value.
    pub fn fx(&self) -> F::Field {
        self.fx
    }
}

impl<'a, F: Function, A: Optimizer<F>> OptimizerDriver<'a, F, A> {
    /// Does one iteration of the process, returning the function value in case
    /// of no error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(&[F::Field], F::Field), A::Error> {
        self.algo
            .opt_next(self.f, &self.dom, &mut self.x)
            .map(|fx| (self.x.as_slice(), fx))
    }

    /// Runs the iterative process until given stopping criterion is satisfied.
    pub fn find<C>(&mut self, stop: C) -> Result<(&[F::Field], F::Field), A::Error>
    where
        C: Fn(OptimizerIterState<'_, F>) -> bool,
    {
        let mut iter = 0;

        loop {
            self.fx = self.next()?.1;

            let state = OptimizerIterState {
                x: &self.x,
                fx: self.fx,
                iter,
            };

            if stop(state) {
                return Ok((self.x.as_slice(), self.fx));
            }

            iter += 1;
        }
    }

    /// Returns the name of the used optimizer.
    pub fn name(&self) -> &str {
        A::NAME
    }
}

impl<'a, F: Gradient> OptimizerDriver<'a, F, GradientDescent<F>> {
    /// Runs the whole gradient descent loop with its own stopping rules and
    /// returns the final report.
    pub fn minimize(&mut self) -> Result<Report<F::Field>, GradientDescentError> {
        let report = self.algo.minimize(self.f, &self.dom, &mut self.x)?;
        self.fx = report.value;
        Ok(report)
    }
}

/// State of the current iteration.
pub struct OptimizerIterState<'a, F: Problem> {
    x: &'a OVector<F::Field, Dyn>,
    fx: F::Field,
    iter: usize,
}

impl<'a, F: Problem> OptimizerIterState<'a, F> {
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Returns the current function value.
    pub fn fx(&self) -> F::Field {
        self.fx
    }

    /// Returns the current iteration number.
    pub fn iter(&self) -> usize {
        self.iter
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        algo::gradient_descent::{GradientDescentOptions, Method},
        testing::Sphere,
    };

    use super::*;

    struct WithDomain(pub Domain<f64>);

    impl Problem for WithDomain {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            self.0.clone()
        }
    }

    #[test]
    fn optimizer_basic_use_case() {
        let f = Sphere::new(4);
        let mut optimizer = OptimizerDriver::builder(&f)
            .with_initial(vec![10.0; 4])
            .build();

        let tolerance = 1e-6;
        let (_, value) = optimizer
            .find(|state| state.iter() >= 1000 || state.fx() < tolerance)
            .unwrap();

        assert!(value <= tolerance);
    }

    #[test]
    fn optimizer_custom() {
        let f = Sphere::new(4);
        let mut optimizer = OptimizerDriver::builder(&f)
            .with_algo(|f, dom| {
                let mut options = GradientDescentOptions::default();
                options.set_method(Method::momentum()).set_step_size(0.05);
                GradientDescent::with_options(f, dom, options)
            })
            .with_initial(vec![10.0; 4])
            .build();

        let tolerance = 1e-6;
        let (_, value) = optimizer
            .find(|state| state.iter() >= 1000 || state.fx() < tolerance)
            .unwrap();

        assert!(value <= tolerance);
    }

    #[test]
    fn optimizer_minimize() {
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let mut optimizer = OptimizerDriver::builder(&f)
            .with_initial(vec![0.0, 0.0])
            .build();

        let report = optimizer.minimize().unwrap();

        assert!(report.success);
        assert!((optimizer.x()[0] - 1.0).abs() < 1e-3);
        assert!((optimizer.x()[1] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn optimizer_initial() {
        let x0 = vec![10.0; 4];

        let f = Sphere::new(4);
        let optimizer = OptimizerDriver::builder(&f)
            .with_initial(x0.clone())
            .build();

        assert_eq!(optimizer.x(), &x0);
    }

    #[test]
    fn optimizer_initial_in_domain() {
        let f = WithDomain(Domain::rect(vec![0.0, 0.0], vec![1.0, 1.0]));
        let optimizer = OptimizerDriver::builder(&f)
            .with_initial(vec![10.0, -10.0])
            .build();

        assert_eq!(optimizer.x(), &[1.0, 0.0]);
    }
}
