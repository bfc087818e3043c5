//! Integer math for on-chain amounts. Floating point never touches a value
//! that will be submitted.

pub mod pure_math;

pub use pure_math::{
    canonicalize, multiply_and_divide, pow10, to_base_units, to_display_string,
};
