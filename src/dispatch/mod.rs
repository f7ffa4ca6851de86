pub mod assign;
pub mod context;
pub mod eligibility;
pub mod run;
