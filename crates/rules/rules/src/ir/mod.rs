pub mod matcher;
pub mod policy;
