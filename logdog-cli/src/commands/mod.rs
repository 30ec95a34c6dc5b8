pub mod actions;
pub mod check;
pub mod fire;
pub mod run;
