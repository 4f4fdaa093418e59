//! Kani proofs for the reentrancy allocation model

#![cfg_attr(kani, feature(register_tool), register_tool(kanitool))]

pub mod sanitizer;
pub mod generators;

#[cfg(kani)]
pub mod safety;

#[cfg(kani)]
pub mod minimal;
