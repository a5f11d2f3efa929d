//! Manage EC2 instances, their volumes and snapshots, optionally scoped to a
//! `Project` tag.

pub mod aws_config;
pub mod cli;
pub mod ec2;
pub mod error;
pub mod fleet;
pub mod model;
pub mod profile;
pub mod provider;

pub use error::{Result, ShotError};
pub use fleet::{BatchReport, FailurePolicy, Fleet, FleetOptions};
pub use provider::Provider;
