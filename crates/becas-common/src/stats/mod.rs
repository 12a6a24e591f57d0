//! Statistics primitives over flat numeric sequences
//!
//! Pure functions; none of them keep state or mutate their input.
pub mod inequality;
pub mod moments;

pub use self::inequality::{coverage, gini};
pub use self::moments::{mean, pearson, population_std_dev, top_mean, TopMean};
