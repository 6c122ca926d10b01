pub mod chunk;
pub mod extract;
pub mod intent;
pub mod normalize;
pub mod similarity;
pub mod style;
pub mod text;
pub mod vocabulary;
