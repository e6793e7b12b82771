pub mod parser;

pub use parser::{ParseOptions, StackParser};
