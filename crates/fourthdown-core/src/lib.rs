// Library root: the weekly lineup engine and the I/O plumbing around it.

pub mod cache;
pub mod config;
pub mod db;
pub mod eligibility;
pub mod engine;
pub mod lineup;
pub mod model;
pub mod providers;
pub mod scoring;
pub mod signals;
pub mod teams;
pub mod waiver;
pub mod week;
