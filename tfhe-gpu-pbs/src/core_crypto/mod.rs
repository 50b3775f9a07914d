pub mod algorithms;
pub mod commons;
pub mod entities;
pub mod gpu;
pub mod prelude;
