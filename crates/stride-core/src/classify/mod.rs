pub mod engine;
pub mod segment;
pub mod subtype;

pub use engine::{classify_day, classify_weeks, ClassifyContext};
