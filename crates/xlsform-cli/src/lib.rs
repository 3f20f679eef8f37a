//! Library components of the `xlsform` command-line validator.

#![allow(clippy::redundant_closure_for_method_calls)]

pub mod logging;
pub mod pipeline;
pub mod report;
