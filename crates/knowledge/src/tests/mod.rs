//! Crate-level scenario tests.

mod end_to_end;
mod support;
