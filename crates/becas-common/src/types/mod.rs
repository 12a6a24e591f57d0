//! Core domain types
pub mod individual;
pub mod policy;
pub mod population;
