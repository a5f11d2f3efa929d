use clap::{Args, Parser, Subcommand};

use crate::aws_config::DEFAULT_PROFILE;
use crate::fleet::FailurePolicy;

#[derive(Parser, Debug)]
#[command(
    name = "shotty",
    version,
    about = "Manage EC2 instances, volumes and snapshots"
)]
pub struct Cli {
    /// AWS profile to use
    #[arg(long, global = true, env = "SHOTTY_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// AWS region (defaults to the profile's region)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Maximum seconds to wait for an instance to stop or start
    #[arg(long, global = true, env = "SHOTTY_MAX_WAIT", default_value_t = 3600)]
    pub max_wait: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Commands for snapshots
    #[command(subcommand)]
    Snapshots(SnapshotsCommand),
    /// Commands for volumes
    #[command(subcommand)]
    Volumes(VolumesCommand),
    /// Commands for instances
    #[command(subcommand)]
    Instances(InstancesCommand),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArg {
    /// Only resources for project (tag Project:<name>)
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SnapshotsCommand {
    /// List EC2 snapshots
    List {
        #[command(flatten)]
        project: ProjectArg,
        /// List all snapshots for each volume, not just the most recent
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum VolumesCommand {
    /// List EC2 volumes
    List {
        #[command(flatten)]
        project: ProjectArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum InstancesCommand {
    /// List EC2 instances
    List {
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Stop EC2 instances
    Stop {
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Start EC2 instances
    Start {
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Create snapshots of all volumes
    Snapshot {
        #[command(flatten)]
        project: ProjectArg,
        /// What to do when an instance fails mid-run
        #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
        on_error: FailurePolicy,
    },
}

impl Cli {
    /// Log filter directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
