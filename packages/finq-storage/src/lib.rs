pub mod chunk_store;
pub mod macro_series;
pub mod vector_index;

mod error;

pub use error::{Error, Result};
