//! The prelude exports a number of structs which are useful in
//! representing things to do with the PDP-8.  Providing this prelude
//! is the main purpose of the base crate.
pub use super::error::ConversionFailed;
pub use super::instruction::*;
pub use super::types::*;
pub use super::unsigned::*;
pub use super::{u12, u3, u7};
