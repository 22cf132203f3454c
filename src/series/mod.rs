//! Time-series fusion: alignment and imputation.
//!
//! Both operations are pure functions over data passed in; all session state
//! lives in [`crate::session`].

mod align;
mod impute;

pub use align::{align, align_covariates, to_future_rows};
pub use impute::{impute, impute_covariates};
