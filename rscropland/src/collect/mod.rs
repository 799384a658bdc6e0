pub mod ee;
pub mod global_variables;
