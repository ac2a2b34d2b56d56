//! Spatial reference systems for output layers.
//!
//! Definitions are parsed by OSR and handed to layer creation as-is. No
//! coordinate transformation happens anywhere in this crate.

mod srs;

pub use srs::SpatialRef;

#[cfg(test)]
mod tests;
