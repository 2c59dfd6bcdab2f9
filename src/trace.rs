//! Per-iteration diagnostics for the optimization loop.
//!
//! A [`Trace`] sink receives one [`IterationRecord`] per engine iteration,
//! including a record with index -1 for the state before the loop starts. The
//! engine calls the sink unconditionally; the default [`NoTrace`]
//! implementation keeps the hot loop on a single code path at no cost.

use nalgebra::{Dyn, OVector};

use crate::core::RealField;

/// Snapshot of the engine state in one iteration.
///
/// All vectors borrow the engine's working buffers and are valid only for the
/// duration of the [`Trace::record`] call. The point and the gradient are
/// expressed in the working space (identical to the original space when no
/// bounds are active).
#[derive(Debug)]
pub struct IterationRecord<'a, T: RealField + Copy> {
    /// Iteration index, -1 for the pre-loop record.
    pub iter: i64,
    /// Euclidean norm of the current gradient.
    pub grad_norm: T,
    /// Relative solution change of the last step.
    pub rel_change: T,
    /// Current iterate.
    pub x: &'a OVector<T, Dyn>,
    /// Last step taken.
    pub step: &'a OVector<T, Dyn>,
    /// Current gradient.
    pub grad: &'a OVector<T, Dyn>,
    /// First-moment buffer, for methods that maintain one.
    pub first_moment: Option<&'a OVector<T, Dyn>>,
    /// Second-moment buffer, for methods that maintain one.
    pub second_moment: Option<&'a OVector<T, Dyn>>,
}

/// Sink for per-iteration records.
pub trait Trace<T: RealField + Copy> {
    /// Receives the record of one iteration.
    fn record(&mut self, record: &IterationRecord<'_, T>);
}

/// No-op trace sink.
pub struct NoTrace;

impl<T: RealField + Copy> Trace<T> for NoTrace {
    fn record(&mut self, _record: &IterationRecord<'_, T>) {}
}

impl<T, F> Trace<T> for F
where
    T: RealField + Copy,
    F: FnMut(&IterationRecord<'_, T>),
{
    fn record(&mut self, record: &IterationRecord<'_, T>) {
        self(record)
    }
}
