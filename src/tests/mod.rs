//! Test-only modules.

pub mod support;
