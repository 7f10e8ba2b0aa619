pub mod action;
pub mod matcher;

pub use crate::config::UrlMode;
pub use action::Action;
pub use matcher::{Rule, RulePlan, RuleSet};
