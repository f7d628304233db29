pub mod error;
pub mod tables;
pub mod types;

pub use error::*;
pub use tables::*;
pub use types::*;
