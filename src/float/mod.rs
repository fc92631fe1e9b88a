//! Floating-point representations used by the WGDOS wire format.

pub mod ibm;

pub use ibm::{ibm32_to_ieee32, ieee32_to_ibm32};
