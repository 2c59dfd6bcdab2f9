//! Gradient descent family of methods.
//!
//! The engine implements the classical [gradient
//! descent](https://en.wikipedia.org/wiki/Gradient_descent) iteration together
//! with its momentum-based and adaptive refinements behind one interface: the
//! configured [`Method`] only changes how the step vector is formed from the
//! gradient, while constraint handling, stopping rules and reporting are
//! shared. Box constraints are supported through a [change of
//! variables](crate::transform).
//!
//! # References
//!
//! \[1\] [An overview of gradient descent optimization
//! algorithms](https://arxiv.org/abs/1609.04747)
//!
//! \[2\] [Adam: A Method for Stochastic
//! Optimization](https://arxiv.org/abs/1412.6980)
//!
//! \[3\] [Adaptive Subgradient Methods for Online Learning and Stochastic
//! Optimization](https://jmlr.org/papers/v12/duchi11a.html)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{
    convert,
    storage::{Storage, StorageMut},
    ComplexField, DimName, Dyn, IsContiguous, OVector, Vector, U1,
};
use num_traits::{One, Zero};
use thiserror::Error;

use crate::{
    core::{Domain, Gradient, Optimizer, Problem, RealField},
    trace::{IterationRecord, NoTrace, Trace},
    transform::{self, BoundsError, BoundsTransform},
};

/// Update rule variant used to form the step vector.
///
/// All variants share the learning rate ([`GradientDescentOptions::step_size`])
/// and, where applicable, the stability constant
/// ([`GradientDescentOptions::epsilon`]). See \[1\] in [module](self)
/// documentation for the survey the laws follow.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum Method<T> {
    /// Plain gradient descent, `d = lr * g`.
    Plain,
    /// Classical momentum, `d = momentum * d + lr * g`.
    Momentum {
        /// Momentum coefficient.
        momentum: T,
    },
    /// Nesterov accelerated gradient. Momentum law applied to the gradient
    /// evaluated at the momentum-ahead point `x - momentum * d`.
    Nag {
        /// Momentum coefficient.
        momentum: T,
    },
    /// AdaGrad \[3\]. Accumulates squared gradients, `d = lr * g / (sqrt(v) +
    /// eps)`.
    AdaGrad,
    /// RMSProp. Like AdaGrad, but the squared gradients are accumulated in an
    /// exponential moving average.
    RmsProp {
        /// Decay rate of the moving average.
        decay: T,
    },
    /// Adam \[2\]. Bias-corrected exponential moving averages of the gradient
    /// and its square.
    Adam {
        /// Decay rate of the first moment.
        beta1: T,
        /// Decay rate of the second moment.
        beta2: T,
    },
    /// AdaMax \[2\]. Adam with the second moment replaced by an
    /// exponentially-weighted infinity norm of the gradient.
    AdaMax {
        /// Decay rate of the first moment.
        beta1: T,
        /// Decay rate of the infinity-norm term.
        beta2: T,
    },
    /// Nadam. Adam with a Nesterov-style blend of the bias-corrected first
    /// moment and the current gradient.
    Nadam {
        /// Decay rate of the first moment.
        beta1: T,
        /// Decay rate of the second moment.
        beta2: T,
    },
}

impl<T: RealField + Copy> Method<T> {
    /// Momentum variant with the usual coefficient 0.9.
    pub fn momentum() -> Self {
        Method::Momentum {
            momentum: convert(0.9),
        }
    }

    /// Nesterov accelerated gradient with the usual coefficient 0.9.
    pub fn nag() -> Self {
        Method::Nag {
            momentum: convert(0.9),
        }
    }

    /// RMSProp with the usual decay rate 0.9.
    pub fn rms_prop() -> Self {
        Method::RmsProp {
            decay: convert(0.9),
        }
    }

    /// Adam with the usual decay rates 0.9 and 0.999.
    pub fn adam() -> Self {
        Method::Adam {
            beta1: convert(0.9),
            beta2: convert(0.999),
        }
    }

    /// AdaMax with the usual decay rates 0.9 and 0.999.
    pub fn ada_max() -> Self {
        Method::AdaMax {
            beta1: convert(0.9),
            beta2: convert(0.999),
        }
    }

    /// Nadam with the usual decay rates 0.9 and 0.999.
    pub fn nadam() -> Self {
        Method::Nadam {
            beta1: convert(0.9),
            beta2: convert(0.999),
        }
    }
}

impl<T> Default for Method<T> {
    fn default() -> Self {
        Method::Plain
    }
}

/// Gradient clipping policy, applied to every freshly evaluated gradient
/// regardless of the chosen [`Method`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradClip<T> {
    /// Rescales the gradient so that its Euclidean norm does not exceed the
    /// given maximum.
    Norm {
        /// Maximum allowed norm.
        max_norm: T,
    },
    /// Clamps every element into the given interval.
    Value {
        /// Minimum allowed element value.
        min: T,
        /// Maximum allowed element value.
        max: T,
    },
}

impl<T: RealField + Copy> GradClip<T> {
    fn apply(&self, gx: &mut OVector<T, Dyn>) {
        match *self {
            GradClip::Norm { max_norm } => {
                let norm = gx.norm();
                if norm > max_norm {
                    *gx *= max_norm / norm;
                }
            }
            GradClip::Value { min, max } => {
                gx.iter_mut().for_each(|g| *g = (*g).clamp(min, max));
            }
        }
    }
}

/// Verdict policy applied when the iteration loop exits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConvergencePolicy<T> {
    /// Success only if the gradient norm tolerance was reached.
    Strict,
    /// Additionally accepts the final iterate if the gradient norm is within
    /// the tolerance multiplied by given factor. Useful when a run stopped by
    /// the maximum number of iterations or by stagnation is still acceptable
    /// for the application.
    Relaxed {
        /// Multiplier for the gradient norm tolerance.
        factor: T,
    },
}

/// Options for [`GradientDescent`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct GradientDescentOptions<P: Problem> {
    /// Learning rate. Default: `0.1`.
    step_size: P::Field,
    /// Update rule variant. Default: plain gradient descent (see [`Method`]).
    method: Method<P::Field>,
    /// Stability constant added before divisions in the adaptive methods.
    /// Default: `1e-8`.
    epsilon: P::Field,
    /// Gradient clipping policy. Default: `None`.
    clip: Option<GradClip<P::Field>>,
    /// Maximum number of iterations. Default: `2000`.
    iter_max: usize,
    /// Stopping tolerance for the gradient norm. Default: `1e-8`.
    grad_err_tol: P::Field,
    /// Stopping tolerance for the relative solution change. Default: `1e-14`.
    rel_sol_change_tol: P::Field,
    /// Verdict policy when the loop stops without reaching the gradient norm
    /// tolerance. Default: strict (see [`ConvergencePolicy`]).
    policy: ConvergencePolicy<P::Field>,
}

impl<P: Problem> Default for GradientDescentOptions<P> {
    fn default() -> Self {
        Self {
            step_size: convert(0.1),
            method: Method::default(),
            epsilon: convert(1e-8),
            clip: None,
            iter_max: 2000,
            grad_err_tol: convert(1e-8),
            rel_sol_change_tol: convert(1e-14),
            policy: ConvergencePolicy::Strict,
        }
    }
}

/// Error returned from [`GradientDescent`] optimizer.
#[derive(Debug, Error)]
pub enum GradientDescentError {
    /// Initial point contains non-finite values.
    #[error("initial point contains non-finite values")]
    InvalidInitial,
    /// Initial point does not lie strictly inside an active box.
    #[error("initial point is not strictly inside the bounds")]
    InitialNotInterior,
    /// Bounds of the domain are malformed.
    #[error("{0}")]
    Bounds(#[from] BoundsError),
}

/// Final report of a [`GradientDescent::minimize`] run.
///
/// The final iterate is written into the caller's point regardless of the
/// verdict, so an unsuccessful run still leaves the best point found.
#[derive(Debug, Clone, Copy)]
pub struct Report<T> {
    /// Whether the run satisfied the configured [`ConvergencePolicy`].
    pub success: bool,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Function value in the final iterate.
    pub value: T,
    /// Gradient norm in the final iterate.
    pub grad_norm: T,
}

/// Gradient descent optimizer.
///
/// See [module](self) documentation for more details.
pub struct GradientDescent<P: Problem> {
    options: GradientDescentOptions<P>,
    state: Option<GdState<P>>,
}

impl<P: Problem> GradientDescent<P> {
    /// Initializes gradient descent with default options.
    pub fn new(f: &P, dom: &Domain<P::Field>) -> Self {
        Self::with_options(f, dom, GradientDescentOptions::default())
    }

    /// Initializes gradient descent with given options.
    pub fn with_options(_f: &P, _dom: &Domain<P::Field>, options: GradientDescentOptions<P>) -> Self {
        Self {
            options,
            state: None,
        }
    }

    /// Resets the internal state of the optimizer.
    pub fn reset(&mut self) {
        self.state = None;
    }
}

impl<P: Gradient> GradientDescent<P> {
    /// Runs the whole iteration loop until convergence or one of the stopping
    /// rules triggers.
    ///
    /// On success and on ordinary non-convergence alike, `x` is overwritten
    /// with the final iterate and a [`Report`] is returned. An error is
    /// returned only for malformed inputs detected before the first
    /// iteration, in which case `x` is left untouched.
    pub fn minimize<Sx>(
        &mut self,
        f: &P,
        dom: &Domain<P::Field>,
        x: &mut Vector<P::Field, Dyn, Sx>,
    ) -> Result<Report<P::Field>, GradientDescentError>
    where
        Sx: StorageMut<P::Field, Dyn> + IsContiguous,
    {
        self.minimize_with(f, dom, x, &mut NoTrace)
    }

    /// Like [`GradientDescent::minimize`], but emits an [`IterationRecord`]
    /// into given sink every iteration, including a pre-loop record with index
    /// -1.
    pub fn minimize_with<Sx, R>(
        &mut self,
        f: &P,
        dom: &Domain<P::Field>,
        x: &mut Vector<P::Field, Dyn, Sx>,
        trace: &mut R,
    ) -> Result<Report<P::Field>, GradientDescentError>
    where
        Sx: StorageMut<P::Field, Dyn> + IsContiguous,
        R: Trace<P::Field>,
    {
        // A full run always starts from a fresh state.
        self.state = None;

        let options = &self.options;
        let mut state = GdState::new(f, options, dom, x)?;

        trace.record(&state.record(-1, P::Field::zero()));

        if state.grad_norm <= options.grad_err_tol {
            // Already a stationary point, no iterations needed.
            return Ok(Report {
                success: true,
                iterations: 0,
                value: state.value,
                grad_norm: state.grad_norm,
            });
        }

        while state.grad_norm > options.grad_err_tol
            && state.rel_change > options.rel_sol_change_tol
            && state.iter < options.iter_max
        {
            state.step(f, options);

            debug!(
                "iter = {}\tvalue = {}\tgrad norm = {}\trel change = {}",
                state.iter, state.value, state.grad_norm, state.rel_change
            );

            trace.record(&state.record(state.iter as i64 - 1, state.rel_change));
        }

        // The caller gets the final iterate regardless of the verdict.
        state.transform.inv_transform(&mut state.z);
        x.copy_from(&state.z);

        let success = match options.policy {
            ConvergencePolicy::Strict => state.grad_norm <= options.grad_err_tol,
            ConvergencePolicy::Relaxed { factor } => {
                state.grad_norm <= options.grad_err_tol * factor
            }
        };

        Ok(Report {
            success,
            iterations: state.iter,
            value: state.value,
            grad_norm: state.grad_norm,
        })
    }
}

impl<P: Gradient> Optimizer<P> for GradientDescent<P> {
    const NAME: &'static str = "Gradient descent";

    type Error = GradientDescentError;

    fn opt_next<Sx>(
        &mut self,
        f: &P,
        dom: &Domain<P::Field>,
        x: &mut Vector<P::Field, Dyn, Sx>,
    ) -> Result<P::Field, Self::Error>
    where
        Sx: StorageMut<P::Field, Dyn> + IsContiguous,
    {
        let state = match self.state.take() {
            Some(state) => self.state.insert(state),
            None => self.state.insert(GdState::new(f, &self.options, dom, x)?),
        };

        state.step(f, &self.options);

        // The caller-facing iterate is kept in the original space.
        state.xb.copy_from(&state.z);
        state.transform.inv_transform(&mut state.xb);
        x.copy_from(&state.xb);

        Ok(state.value)
    }
}

/// Update rule with the buffers it maintains across the iterations.
enum Rule<T: RealField + Copy> {
    Plain,
    Momentum {
        momentum: T,
    },
    Nag {
        momentum: T,
    },
    AdaGrad {
        v: OVector<T, Dyn>,
    },
    RmsProp {
        decay: T,
        v: OVector<T, Dyn>,
    },
    Adam {
        beta1: T,
        beta2: T,
        m: OVector<T, Dyn>,
        v: OVector<T, Dyn>,
    },
    AdaMax {
        beta1: T,
        beta2: T,
        m: OVector<T, Dyn>,
        v: OVector<T, Dyn>,
    },
    Nadam {
        beta1: T,
        beta2: T,
        m: OVector<T, Dyn>,
        v: OVector<T, Dyn>,
    },
}

impl<T: RealField + Copy> Rule<T> {
    fn new(method: &Method<T>, dim: usize) -> Self {
        let zeros = || OVector::zeros_generic(Dyn(dim), U1::name());

        match *method {
            Method::Plain => Rule::Plain,
            Method::Momentum { momentum } => Rule::Momentum { momentum },
            Method::Nag { momentum } => Rule::Nag { momentum },
            Method::AdaGrad => Rule::AdaGrad { v: zeros() },
            Method::RmsProp { decay } => Rule::RmsProp { decay, v: zeros() },
            Method::Adam { beta1, beta2 } => Rule::Adam {
                beta1,
                beta2,
                m: zeros(),
                v: zeros(),
            },
            Method::AdaMax { beta1, beta2 } => Rule::AdaMax {
                beta1,
                beta2,
                m: zeros(),
                v: zeros(),
            },
            Method::Nadam { beta1, beta2 } => Rule::Nadam {
                beta1,
                beta2,
                m: zeros(),
                v: zeros(),
            },
        }
    }

    /// Computes the step vector `d` from the gradient `gx`, advancing the
    /// moment buffers. For [`Rule::Nag`], `gx` must be the gradient evaluated
    /// in the momentum-ahead point.
    fn direction(
        &mut self,
        gx: &OVector<T, Dyn>,
        d: &mut OVector<T, Dyn>,
        step_size: T,
        epsilon: T,
        iter: usize,
    ) {
        let one = T::one();

        match self {
            Rule::Plain => {
                for i in 0..d.nrows() {
                    d[i] = step_size * gx[i];
                }
            }
            Rule::Momentum { momentum } | Rule::Nag { momentum } => {
                let mu = *momentum;
                for i in 0..d.nrows() {
                    d[i] = mu * d[i] + step_size * gx[i];
                }
            }
            Rule::AdaGrad { v } => {
                for i in 0..d.nrows() {
                    let g = gx[i];
                    v[i] += g * g;
                    d[i] = step_size * g / (v[i].sqrt() + epsilon);
                }
            }
            Rule::RmsProp { decay, v } => {
                let rho = *decay;
                for i in 0..d.nrows() {
                    let g = gx[i];
                    v[i] = rho * v[i] + (one - rho) * g * g;
                    d[i] = step_size * g / (v[i].sqrt() + epsilon);
                }
            }
            Rule::Adam { beta1, beta2, m, v } => {
                let b1 = *beta1;
                let b2 = *beta2;
                // Startup bias corrections, iter starts at 1. Floating-point
                // power keeps the exponent exact where i32 would wrap.
                let t: T = convert(iter as f64);
                let bc1 = one - b1.powf(t);
                let bc2 = one - b2.powf(t);

                for i in 0..d.nrows() {
                    let g = gx[i];
                    m[i] = b1 * m[i] + (one - b1) * g;
                    v[i] = b2 * v[i] + (one - b2) * g * g;

                    let m_hat = m[i] / bc1;
                    let v_hat = v[i] / bc2;
                    d[i] = step_size * m_hat / (v_hat.sqrt() + epsilon);
                }
            }
            Rule::AdaMax { beta1, beta2, m, v } => {
                let b1 = *beta1;
                let b2 = *beta2;
                let bc1 = one - b1.powf(convert(iter as f64));

                for i in 0..d.nrows() {
                    let g = gx[i];
                    m[i] = b1 * m[i] + (one - b1) * g;
                    // Exponentially-weighted infinity norm, no bias
                    // correction and no square root.
                    v[i] = (b2 * v[i]).max(g.abs());

                    let m_hat = m[i] / bc1;
                    d[i] = step_size * m_hat / (v[i] + epsilon);
                }
            }
            Rule::Nadam { beta1, beta2, m, v } => {
                let b1 = *beta1;
                let b2 = *beta2;
                let t: T = convert(iter as f64);
                let bc1 = one - b1.powf(t);
                let bc2 = one - b2.powf(t);

                for i in 0..d.nrows() {
                    let g = gx[i];
                    m[i] = b1 * m[i] + (one - b1) * g;
                    v[i] = b2 * v[i] + (one - b2) * g * g;

                    let m_hat = m[i] / bc1;
                    let g_hat = g / bc1;
                    let v_hat = v[i] / bc2;
                    d[i] = step_size * (b1 * m_hat + (one - b1) * g_hat)
                        / (v_hat.sqrt() + epsilon);
                }
            }
        }
    }

    fn first_moment(&self) -> Option<&OVector<T, Dyn>> {
        match self {
            Rule::Adam { m, .. } | Rule::AdaMax { m, .. } | Rule::Nadam { m, .. } => Some(m),
            _ => None,
        }
    }

    fn second_moment(&self) -> Option<&OVector<T, Dyn>> {
        match self {
            Rule::AdaGrad { v }
            | Rule::RmsProp { v, .. }
            | Rule::Adam { v, .. }
            | Rule::AdaMax { v, .. }
            | Rule::Nadam { v, .. } => Some(v),
            _ => None,
        }
    }
}

/// State of one run: the working-space iterate and all per-run buffers.
struct GdState<P: Problem> {
    transform: BoundsTransform<P::Field>,
    rule: Rule<P::Field>,
    /// Current iterate in the working space.
    z: OVector<P::Field, Dyn>,
    /// Scratch vector for evaluations in the bounded space.
    xb: OVector<P::Field, Dyn>,
    /// Last step taken.
    d: OVector<P::Field, Dyn>,
    grad: OVector<P::Field, Dyn>,
    iter: usize,
    value: P::Field,
    grad_norm: P::Field,
    rel_change: P::Field,
}

impl<P: Gradient> GdState<P> {
    fn new<Sx>(
        f: &P,
        options: &GradientDescentOptions<P>,
        dom: &Domain<P::Field>,
        x: &Vector<P::Field, Dyn, Sx>,
    ) -> Result<Self, GradientDescentError>
    where
        Sx: Storage<P::Field, Dyn> + IsContiguous,
    {
        let dim = dom.dim();
        assert_eq!(x.nrows(), dim, "invalid dimensionality of the point");

        if !x.iter().all(|xi| xi.is_finite()) {
            return Err(GradientDescentError::InvalidInitial);
        }

        let transform = BoundsTransform::new(dom)?;

        let mut z = x.clone_owned();
        transform.transform(&mut z);

        if !z.iter().all(|zi| zi.is_finite()) {
            return Err(GradientDescentError::InitialNotInterior);
        }

        let mut xb = z.clone_owned();
        let mut grad = OVector::zeros_generic(Dyn(dim), U1::name());
        let d = grad.clone_owned();
        let rule = Rule::new(&options.method, dim);

        let value = transform::eval_grad(f, &transform, &z, &mut xb, &mut grad);
        let grad_norm = grad.norm();

        Ok(Self {
            transform,
            rule,
            z,
            xb,
            d,
            grad,
            iter: 0,
            value,
            grad_norm,
            // Must pass the continuation predicate of the first iteration.
            rel_change: P::Field::one(),
        })
    }

    /// Performs one engine iteration: forms the step, moves the iterate and
    /// evaluates the objective in the new point.
    fn step(&mut self, f: &P, options: &GradientDescentOptions<P>) {
        self.iter += 1;

        let lr = options.step_size;
        let eps = options.epsilon;

        match &mut self.rule {
            Rule::Nag { momentum } => {
                let mu = *momentum;

                // Gradient in the momentum-ahead point z - mu * d.
                let mut look = self.z.clone_owned();
                look.axpy(-mu, &self.d, P::Field::one());

                let mut gl = self.grad.clone_owned();
                transform::eval_grad(f, &self.transform, &look, &mut self.xb, &mut gl);

                for i in 0..self.d.nrows() {
                    self.d[i] = mu * self.d[i] + lr * gl[i];
                }
            }
            rule => rule.direction(&self.grad, &mut self.d, lr, eps, self.iter),
        }

        // Relative solution change of the step about to be taken. The
        // additive floor avoids blow-up near zero-valued coordinates.
        let floor: P::Field = convert(1e-8);
        let mut rel = P::Field::zero();
        for i in 0..self.z.nrows() {
            rel += self.d[i].abs() / (self.z[i].abs() + floor);
        }
        self.rel_change = rel;

        self.z -= &self.d;

        self.value = transform::eval_grad(f, &self.transform, &self.z, &mut self.xb, &mut self.grad);

        if let Some(clip) = options.clip {
            clip.apply(&mut self.grad);
        }

        self.grad_norm = self.grad.norm();
    }

    fn record(&self, iter: i64, rel_change: P::Field) -> IterationRecord<'_, P::Field> {
        IterationRecord {
            iter,
            grad_norm: self.grad_norm,
            rel_change,
            x: &self.z,
            step: &self.d,
            grad: &self.grad,
            first_moment: self.rule.first_moment(),
            second_moment: self.rule.second_moment(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use crate::testing::{Sphere, TestFunction, TestProblem};

    fn minimize(
        f: &Sphere,
        dom: &Domain<f64>,
        mut x: OVector<f64, Dyn>,
        options: GradientDescentOptions<Sphere>,
    ) -> (Report<f64>, OVector<f64, Dyn>) {
        let mut gd = GradientDescent::with_options(f, dom, options);
        let report = gd.minimize(f, dom, &mut x).unwrap();
        (report, x)
    }

    #[test]
    fn trivial_convergence() {
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let dom = f.domain();
        let x0 = f.optima().remove(0);

        let (report, x) = minimize(&f, &dom, x0.clone(), GradientDescentOptions::default());

        assert!(report.success);
        assert_eq!(report.iterations, 0);
        assert_eq!(x, x0);
    }

    #[test]
    fn plain() {
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let dom = f.domain();

        let mut options = GradientDescentOptions::default();
        options
            .set_step_size(0.1)
            .set_grad_err_tol(1e-6)
            .set_iter_max(10_000);

        for x0 in f.initials() {
            let (report, x) = minimize(&f, &dom, x0, options.clone());

            assert!(report.success);
            assert!(f.is_optimum(&x, 1e-4));
        }
    }

    #[test]
    fn momentum_variants() {
        for method in [Method::momentum(), Method::nag()] {
            let f = Sphere::shifted(vec![1.0, 2.0]);
            let dom = f.domain();

            let mut options = GradientDescentOptions::default();
            options
                .set_method(method)
                .set_step_size(0.05)
                .set_grad_err_tol(1e-6)
                .set_iter_max(10_000);

            let (report, x) = minimize(&f, &dom, dvector![0.0, 0.0], options);

            assert!(report.success, "{:?}", method);
            assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-3);
            assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn adaptive_variants() {
        let cases = [
            (Method::AdaGrad, 0.5),
            (Method::rms_prop(), 1e-3),
            (Method::adam(), 1e-3),
            (Method::ada_max(), 1e-3),
            (Method::nadam(), 1e-3),
        ];

        for (method, step_size) in cases {
            let f = Sphere::shifted(vec![1.0, 2.0]);
            let dom = f.domain();

            let mut options = GradientDescentOptions::default();
            options
                .set_method(method)
                .set_step_size(step_size)
                .set_grad_err_tol(1e-2)
                .set_iter_max(50_000);

            let (report, x) = minimize(&f, &dom, dvector![0.0, 0.0], options);

            assert!(report.success, "{:?}", method);
            assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-1);
            assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-1);
        }
    }

    #[test]
    fn bounded_box() {
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let dom = Domain::rect(vec![-5.0, -5.0], vec![5.0, 5.0]);

        let mut options = GradientDescentOptions::default();
        options
            .set_step_size(0.01)
            .set_grad_err_tol(1e-6)
            .set_iter_max(50_000);

        let (report, x) = minimize(&f, &dom, dvector![0.0, 0.0], options);

        assert!(report.success);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-3);
    }

    #[test]
    fn bounded_one_sided() {
        let mut options = GradientDescentOptions::default();
        options
            .set_step_size(0.05)
            .set_grad_err_tol(1e-6)
            .set_iter_max(50_000);

        let f = Sphere::shifted(vec![2.0]);
        let dom = Domain::rect(vec![0.0], vec![f64::INFINITY]);
        let (report, x) = minimize(&f, &dom, dvector![1.0], options.clone());

        assert!(report.success);
        assert_abs_diff_eq!(x[0], 2.0, epsilon = 1e-3);

        let f = Sphere::shifted(vec![-2.0]);
        let dom = Domain::rect(vec![f64::NEG_INFINITY], vec![0.0]);
        let (report, x) = minimize(&f, &dom, dvector![-1.0], options);

        assert!(report.success);
        assert_abs_diff_eq!(x[0], -2.0, epsilon = 1e-3);
    }

    #[test]
    fn invalid_initial() {
        let f = Sphere::new(2);
        let dom = f.domain();
        let mut x = dvector![f64::NAN, 0.0];

        let mut gd = GradientDescent::new(&f, &dom);
        let error = gd.minimize(&f, &dom, &mut x).unwrap_err();

        assert!(matches!(error, GradientDescentError::InvalidInitial));
        assert_eq!(x[1], 0.0);
    }

    #[test]
    fn invalid_bounds() {
        let f = Sphere::new(1);
        let dom = Domain::rect(vec![1.0], vec![0.0]);
        let mut x = dvector![0.5];

        let mut gd = GradientDescent::new(&f, &dom);
        let error = gd.minimize(&f, &dom, &mut x).unwrap_err();

        assert!(matches!(error, GradientDescentError::Bounds(_)));
    }

    #[test]
    fn initial_on_boundary() {
        let f = Sphere::shifted(vec![2.0]);
        let dom = Domain::rect(vec![0.0], vec![f64::INFINITY]);
        let mut x = dvector![0.0];

        let mut gd = GradientDescent::new(&f, &dom);
        let error = gd.minimize(&f, &dom, &mut x).unwrap_err();

        assert!(matches!(error, GradientDescentError::InitialNotInterior));
        assert_eq!(x[0], 0.0);
    }

    #[test]
    fn zero_gradient_is_stable() {
        // Adaptive rules divide by accumulated statistics. A zero gradient
        // must not produce NaN even when the accumulators are still zero.
        for method in [
            Method::AdaGrad,
            Method::rms_prop(),
            Method::adam(),
            Method::ada_max(),
            Method::nadam(),
        ] {
            let mut rule = Rule::new(&method, 2);
            let gx = dvector![0.0, 0.0];
            let mut d = dvector![0.0, 0.0];

            rule.direction(&gx, &mut d, 0.1, 1e-8, 1);
            rule.direction(&gx, &mut d, 0.1, 1e-8, 2);

            assert!(d.iter().all(|di| di.is_finite()), "{:?}", method);
        }
    }

    #[test]
    fn bias_correction_beyond_i32_range() {
        // The bias correction exponent is the iteration counter. It must stay
        // well-behaved even for counters that do not fit in i32.
        let iter = i32::MAX as usize + 1;

        for method in [Method::adam(), Method::ada_max(), Method::nadam()] {
            let mut rule = Rule::new(&method, 1);
            let gx = dvector![1.0];
            let mut d = dvector![0.0];

            rule.direction(&gx, &mut d, 1e-3, 1e-8, iter);

            assert!(d[0].is_finite(), "{:?}", method);
            assert!(d[0] > 0.0, "{:?}", method);
        }
    }

    #[test]
    fn clipping() {
        let mut gx = dvector![3.0, 4.0];
        GradClip::Norm { max_norm: 1.0 }.apply(&mut gx);
        assert_abs_diff_eq!(gx.norm(), 1.0, epsilon = 1e-12);

        let mut gx = dvector![3.0, -4.0];
        GradClip::Value { min: -1.0, max: 1.0 }.apply(&mut gx);
        assert_eq!(gx, dvector![1.0, -1.0]);

        // Clipping only slows down the march from a far-away start, the
        // optimum is still reached.
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let dom = f.domain();

        let mut options = GradientDescentOptions::default();
        options
            .set_step_size(0.1)
            .set_clip(Some(GradClip::Norm { max_norm: 1.0 }))
            .set_grad_err_tol(1e-6)
            .set_iter_max(20_000);

        let (report, x) = minimize(&f, &dom, dvector![100.0, 100.0], options);

        assert!(report.success);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-3);
    }

    #[test]
    fn relaxed_policy() {
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let dom = f.domain();

        let mut options = GradientDescentOptions::default();
        options
            .set_step_size(0.1)
            .set_grad_err_tol(1e-12)
            .set_iter_max(5);

        let (report, _) = minimize(&f, &dom, dvector![0.0, 0.0], options.clone());
        assert!(!report.success);
        assert_eq!(report.iterations, 5);

        options.set_policy(ConvergencePolicy::Relaxed { factor: 1e13 });
        let (report, _) = minimize(&f, &dom, dvector![0.0, 0.0], options);
        assert!(report.success);
        assert_eq!(report.iterations, 5);
    }

    #[test]
    fn stagnation_stop() {
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let dom = f.domain();

        let mut options = GradientDescentOptions::default();
        options
            .set_step_size(0.1)
            .set_grad_err_tol(1e-12)
            .set_rel_sol_change_tol(0.5)
            .set_iter_max(10_000);

        let (report, _) = minimize(&f, &dom, dvector![0.0, 0.0], options);

        assert!(!report.success);
        assert!(report.iterations < 10_000);
    }

    #[test]
    fn trace_records() {
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let dom = f.domain();
        let mut x = dvector![0.0, 0.0];

        let mut options = GradientDescentOptions::default();
        options
            .set_step_size(0.1)
            .set_grad_err_tol(1e-6)
            .set_iter_max(10_000);

        let mut iters = Vec::new();
        let mut trace = |record: &IterationRecord<'_, f64>| iters.push(record.iter);

        let mut gd = GradientDescent::with_options(&f, &dom, options);
        let report = gd.minimize_with(&f, &dom, &mut x, &mut trace).unwrap();

        assert_eq!(iters.first(), Some(&-1));
        assert_eq!(iters.len(), report.iterations + 1);
        assert_eq!(*iters.last().unwrap(), report.iterations as i64 - 1);
    }

    #[test]
    fn driver_like_stepping() {
        let f = Sphere::shifted(vec![1.0, 2.0]);
        let dom = f.domain();
        let mut x = dvector![0.0, 0.0];

        let mut gd = GradientDescent::new(&f, &dom);

        let mut fx = f64::INFINITY;
        for _ in 0..1000 {
            fx = gd.opt_next(&f, &dom, &mut x).unwrap();
        }

        assert_abs_diff_eq!(fx, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-3);
    }
}
