#![feature(custom_test_frameworks)]
#![test_runner(crate::harness::e2e_test_runner)]

pub mod harness;
pub mod playwright_ext;

#[cfg(test)]
mod tests;

pub use harness::{e2e_test_runner, Context, Testable};
