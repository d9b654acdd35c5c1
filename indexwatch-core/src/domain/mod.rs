//! Domain types for indexwatch

pub mod instrument;
pub mod sample;

pub use instrument::{default_instruments, Instrument};
pub use sample::{Sample, Series};
