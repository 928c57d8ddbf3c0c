pub mod quota;
pub mod run;
pub mod targets;
