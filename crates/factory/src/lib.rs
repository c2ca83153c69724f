//! # Binx Factory
//!
//! The calc framework. A `Calc` is a user-defined processing step, a
//! `Processor` feeds it input collections, and a `Factory` turns the calc's
//! results into a new, validated output collection.

pub mod calc;
pub mod error;
pub mod factory;

pub use calc::{Calc, CalcResult, setting, setting_or};
pub use error::{CalcError, FactoryError};
pub use factory::{Factory, Processor, expect_input};
