mod config;
mod dataset;
mod error;
mod filter;
mod labels;
mod shuffle;
mod tensor;
mod utils;

pub use config::*;
pub use dataset::*;
pub use error::*;
pub use filter::*;
pub use labels::*;
pub use shuffle::*;
pub use tensor::*;
pub use utils::*;

pub type Float = f32;

pub type ClassId = i64;
