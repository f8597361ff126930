#![doc = include_str!("../README.md")]

pub mod nav;
pub mod outline;
mod tracker;
mod viewport;

pub use tracker::*;
pub use viewport::*;
