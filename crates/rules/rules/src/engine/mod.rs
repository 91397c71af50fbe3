pub mod attributes;
pub mod eval;
pub mod verdict;

pub use attributes::{AttributeValue, RequesterAttributes};
pub use eval::{evaluate, evaluate_verdict};
pub use verdict::Verdict;
