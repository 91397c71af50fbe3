pub mod codec;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod ip;
pub mod ir;
pub mod recovery;

pub use codec::{decode, encode};
pub use engine::{AttributeValue, RequesterAttributes, Verdict, evaluate, evaluate_verdict};
pub use error::RuleError;
pub use frontend::PolicyFrontend;
pub use ip::{IpRange, IpRangeError};
pub use ir::matcher::{PolicyRegex, ValueMatcher};
pub use ir::policy::{CompiledPolicy, RuleRow};
pub use recovery::{RecoveryCoordinator, RepairReport};
