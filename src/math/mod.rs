//! Small numerical helpers shared by the forecasting engine.

mod ols;

pub use ols::solve_least_squares;
