//! Configuration and constants

pub mod defaults;
pub mod images;
pub mod urls;
