pub mod grid;
pub mod keys;
pub mod kinetic;
pub mod pipeline;
pub mod thermal;
