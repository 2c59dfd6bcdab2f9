//! Core abstractions and types.
//!
//! *Users* are mainly interested in implementing the [`Function`] and
//! [`Gradient`] traits, optionally specifying the [domain](Domain).
//!
//! Algorithm *developers* are interested in implementing the [`Optimizer`]
//! trait and using the tools in [derivatives](crate::derivatives) and
//! [transform](crate::transform) modules.

mod base;
mod domain;
mod function;
mod optimizer;

pub use base::*;
pub use domain::*;
pub use function::*;
pub use optimizer::*;
