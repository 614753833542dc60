pub mod clean;
pub mod update;
