//! Informational zone - presentation helpers, no chain access

pub mod display;
