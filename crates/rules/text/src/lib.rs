//! Text frontend for FireRole policies.
//!
//! A policy is a list of lines, each either a rule or a comment:
//!
//! ```text
//! # editors may come from the office network
//! allow group 'editors', /^editors-/
//! deny not remote_ip '192.168.0.0/16'
//! allow any
//! ```
//!
//! Rules are tried in order; `allow any` / `deny any` sets the default and
//! ends the policy.

pub mod compiler;
pub mod config;
pub mod grammar;

pub use compiler::{FireroleFrontend, compile};
pub use config::{CompilerConfig, EMPTY_POLICY_SOURCE};
pub use grammar::{Delimiter, ParsedSource, RawExpression, RawRule, parse};
