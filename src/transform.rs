//! Change of variables for bound constraints.
//!
//! Box-constrained problems are reduced to unconstrained ones by mapping each
//! bounded coordinate to the whole real line through a smooth, strictly
//! monotonic bijection. First-order methods then iterate in the unconstrained
//! ("working") space and the iterates are mapped back at the end. Gradients
//! computed in the bounded space are converted to the working space by
//! multiplying with the diagonal of the Jacobian of the inverse mapping.
//!
//! The mappings used per coordinate are:
//!
//! * unbounded -- identity,
//! * lower bound *l* -- `z = ln(x - l)`,
//! * upper bound *u* -- `z = -ln(u - x)`,
//! * both bounds -- the logit `z = ln((x - l) / (u - x))`, inverted through
//!   the logistic sigmoid.

use nalgebra::{Dyn, OVector};
use thiserror::Error;

use crate::core::{Domain, Gradient, RealField};

/// Per-coordinate classification of bounds, computed once from the
/// [`Domain`] when a [`BoundsTransform`] is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsType {
    /// No bounds in either direction.
    Unbounded,
    /// Finite lower bound only.
    LowerOnly,
    /// Finite upper bound only.
    UpperOnly,
    /// Finite bounds on both sides.
    TwoSided,
}

/// Error returned when the domain bounds are malformed.
#[derive(Debug, Error)]
pub enum BoundsError {
    /// Lower bound is not strictly less than the upper bound (or one of them
    /// is NaN) in some dimension.
    #[error("invalid bounds in dimension {0}")]
    Invalid(usize),
}

/// Mapping between a rectangular feasible region and the unconstrained working
/// space. See [module](self) documentation for details.
#[derive(Debug, Clone)]
pub struct BoundsTransform<T: RealField + Copy> {
    types: Vec<BoundsType>,
    lower: OVector<T, Dyn>,
    upper: OVector<T, Dyn>,
    active: bool,
}

impl<T: RealField + Copy> BoundsTransform<T> {
    /// Classifies the bounds of the domain, rejecting malformed boxes.
    pub fn new(dom: &Domain<T>) -> Result<Self, BoundsError> {
        let lower = dom.lower().clone_owned();
        let upper = dom.upper().clone_owned();

        let mut types = Vec::with_capacity(dom.dim());
        let mut active = false;

        for (i, (&l, &u)) in lower.iter().zip(upper.iter()).enumerate() {
            // This also rejects NaN bounds, for which no comparison holds.
            if !(l < u) {
                return Err(BoundsError::Invalid(i));
            }

            let ty = match (l.is_finite(), u.is_finite()) {
                (false, false) => BoundsType::Unbounded,
                (true, false) => BoundsType::LowerOnly,
                (false, true) => BoundsType::UpperOnly,
                (true, true) => BoundsType::TwoSided,
            };

            active |= ty != BoundsType::Unbounded;
            types.push(ty);
        }

        Ok(Self {
            types,
            lower,
            upper,
            active,
        })
    }

    /// Returns true if at least one coordinate is bounded.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Maps a feasible point into the working space, in place.
    ///
    /// The point must lie strictly inside the feasible region, otherwise the
    /// result contains non-finite values.
    pub fn transform(&self, x: &mut OVector<T, Dyn>) {
        if !self.active {
            return;
        }

        for i in 0..x.nrows() {
            let xi = x[i];
            x[i] = match self.types[i] {
                BoundsType::Unbounded => xi,
                BoundsType::LowerOnly => (xi - self.lower[i]).ln(),
                BoundsType::UpperOnly => -(self.upper[i] - xi).ln(),
                BoundsType::TwoSided => ((xi - self.lower[i]) / (self.upper[i] - xi)).ln(),
            };
        }
    }

    /// Maps a working-space point back into the feasible region, in place.
    /// Exact inverse of [`BoundsTransform::transform`].
    pub fn inv_transform(&self, z: &mut OVector<T, Dyn>) {
        if !self.active {
            return;
        }

        for i in 0..z.nrows() {
            let zi = z[i];
            z[i] = match self.types[i] {
                BoundsType::Unbounded => zi,
                BoundsType::LowerOnly => self.lower[i] + zi.exp(),
                BoundsType::UpperOnly => self.upper[i] - (-zi).exp(),
                BoundsType::TwoSided => {
                    let width = self.upper[i] - self.lower[i];
                    self.lower[i] + width * sigmoid(zi)
                }
            };
        }
    }

    /// Multiplies a bounded-space gradient elementwise by the diagonal of the
    /// Jacobian of [`BoundsTransform::inv_transform`] in the working-space
    /// point `z`, turning it into the working-space gradient.
    pub fn jacobian_mul(&self, z: &OVector<T, Dyn>, gx: &mut OVector<T, Dyn>) {
        if !self.active {
            return;
        }

        let one = T::one();

        for i in 0..z.nrows() {
            let zi = z[i];
            let jac = match self.types[i] {
                BoundsType::Unbounded => one,
                BoundsType::LowerOnly => zi.exp(),
                BoundsType::UpperOnly => (-zi).exp(),
                BoundsType::TwoSided => {
                    let s = sigmoid(zi);
                    (self.upper[i] - self.lower[i]) * s * (one - s)
                }
            };
            gx[i] *= jac;
        }
    }
}

/// Evaluates the objective presented in the working space.
///
/// When the transform is inactive, this is the objective itself. Otherwise the
/// point is inverse-transformed (using `xb` as scratch space), the objective
/// is evaluated in the bounded point and the gradient is adjusted by the
/// Jacobian diagonal.
pub fn eval_grad<F: Gradient>(
    f: &F,
    transform: &BoundsTransform<F::Field>,
    z: &OVector<F::Field, Dyn>,
    xb: &mut OVector<F::Field, Dyn>,
    gx: &mut OVector<F::Field, Dyn>,
) -> F::Field {
    if !transform.is_active() {
        return f.apply_grad(z, gx);
    }

    xb.copy_from(z);
    transform.inv_transform(xb);

    let value = f.apply_grad(xb, gx);
    transform.jacobian_mul(z, gx);
    value
}

// Overflow-safe logistic sigmoid.
fn sigmoid<T: RealField + Copy>(z: T) -> T {
    let one = T::one();

    if z >= T::zero() {
        one / (one + (-z).exp())
    } else {
        let e = z.exp();
        e / (one + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    fn rect_domain() -> Domain<f64> {
        [
            (f64::NEG_INFINITY, f64::INFINITY),
            (-1.0, f64::INFINITY),
            (f64::NEG_INFINITY, 2.5),
            (-3.0, 4.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn classification() {
        let transform = BoundsTransform::new(&rect_domain()).unwrap();

        assert!(transform.is_active());
        assert_eq!(
            transform.types,
            vec![
                BoundsType::Unbounded,
                BoundsType::LowerOnly,
                BoundsType::UpperOnly,
                BoundsType::TwoSided
            ]
        );

        let unconstrained = BoundsTransform::new(&Domain::<f64>::unconstrained(3)).unwrap();
        assert!(!unconstrained.is_active());
    }

    #[test]
    fn malformed_bounds_rejected() {
        let inverted = Domain::rect(vec![0.0, 1.0], vec![1.0, 0.0]);
        assert!(matches!(
            BoundsTransform::new(&inverted),
            Err(BoundsError::Invalid(1))
        ));

        let degenerate = Domain::rect(vec![1.0], vec![1.0]);
        assert!(matches!(
            BoundsTransform::new(&degenerate),
            Err(BoundsError::Invalid(0))
        ));

        let nan = Domain::rect(vec![f64::NAN], vec![1.0]);
        assert!(BoundsTransform::new(&nan).is_err());
    }

    #[test]
    fn round_trip() {
        let transform = BoundsTransform::new(&rect_domain()).unwrap();

        let x = dvector![1.3, -0.99, 2.49, 3.75];
        let mut z = x.clone();
        transform.transform(&mut z);

        assert!(z.iter().all(|zi| zi.is_finite()));

        transform.inv_transform(&mut z);
        for i in 0..4 {
            assert_abs_diff_eq!(z[i], x[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn inv_transform_stays_feasible() {
        let transform = BoundsTransform::new(&rect_domain()).unwrap();

        // Even extreme working-space points map inside the closed box.
        let mut z = dvector![1e3, -1e3, -1e3, 1e3];
        transform.inv_transform(&mut z);

        assert!(z.iter().all(|zi| zi.is_finite()));
        assert!(z[1] >= -1.0);
        assert!(z[2] <= 2.5);
        assert!(z[3] >= -3.0 && z[3] <= 4.0);
    }

    #[test]
    fn jacobian_matches_finite_difference() {
        let transform = BoundsTransform::new(&rect_domain()).unwrap();

        let z = dvector![0.7, -1.2, 0.4, 1.1];

        let mut gx = dvector![1.0, 1.0, 1.0, 1.0];
        transform.jacobian_mul(&z, &mut gx);

        let h = 1e-7;
        for i in 0..4 {
            let mut zp = z.clone();
            zp[i] += h;
            transform.inv_transform(&mut zp);

            let mut zm = z.clone();
            zm[i] -= h;
            transform.inv_transform(&mut zm);

            let expected = (zp[i] - zm[i]) / (2.0 * h);
            assert_abs_diff_eq!(gx[i], expected, epsilon = 1e-6);
        }

        // Identity for the coordinate without bounds.
        assert_abs_diff_eq!(gx[0], 1.0);
    }
}
