mod entropy;
mod generator;
mod token;

pub use entropy::*;
pub use generator::*;
pub use token::*;
