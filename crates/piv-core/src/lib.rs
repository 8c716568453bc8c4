pub mod color;
pub mod consts;
pub mod correlate;
pub mod engine;
pub mod error;
pub mod field;
pub mod frame;
pub mod grid;
