pub mod config;
pub mod domain;
pub mod params;
pub mod report;
pub mod sweep;
