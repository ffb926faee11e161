pub mod classifier;
pub mod code_analysis;
pub mod scanner;
