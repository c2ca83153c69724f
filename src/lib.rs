//! # Binx
//!
//! Command-line front end for declared collections: list them, validate input
//! files against them and convert records between JSON, CSV and Parquet.

pub mod commands;
pub mod io;
pub mod logging;
