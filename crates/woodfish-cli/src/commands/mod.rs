pub mod config;
pub mod fortune;
pub mod quote;
pub mod run;
pub mod status;
