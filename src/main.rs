use anyhow::Context;
use clap::Parser;
use shotty::aws_config::configure_aws;
use shotty::cli::{Cli, Commands, InstancesCommand, SnapshotsCommand, VolumesCommand};
use shotty::ec2::Ec2Provider;
use shotty::{Fleet, FleetOptions};
use std::io::Write;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .init();

    let config = configure_aws(&cli.profile, cli.region.clone()).await;
    let provider = Ec2Provider::new(&config, Duration::from_secs(cli.max_wait));

    let mut options = FleetOptions::default();
    if let Commands::Instances(InstancesCommand::Snapshot { on_error, .. }) = &cli.command {
        options.snapshot_failure_policy = *on_error;
    }
    let fleet = Fleet::with_options(provider, options);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Snapshots(SnapshotsCommand::List { project, all }) => fleet
            .list_snapshots(project.project.as_deref(), all, &mut out)
            .await
            .context("listing snapshots")?,
        Commands::Volumes(VolumesCommand::List { project }) => fleet
            .list_volumes(project.project.as_deref(), &mut out)
            .await
            .context("listing volumes")?,
        Commands::Instances(InstancesCommand::List { project }) => fleet
            .list_instances(project.project.as_deref(), &mut out)
            .await
            .context("listing instances")?,
        Commands::Instances(InstancesCommand::Stop { project }) => {
            let report = fleet
                .stop_instances(project.project.as_deref(), &mut out)
                .await
                .context("stopping instances")?;
            debug!(?report, "stop finished");
        }
        Commands::Instances(InstancesCommand::Start { project }) => {
            let report = fleet
                .start_instances(project.project.as_deref(), &mut out)
                .await
                .context("starting instances")?;
            debug!(?report, "start finished");
        }
        Commands::Instances(InstancesCommand::Snapshot { project, .. }) => {
            let report = fleet
                .create_snapshots(project.project.as_deref(), &mut out)
                .await
                .context("creating snapshots")?;
            debug!(?report, "snapshot run finished");
            if !report.failed.is_empty() {
                out.flush()?;
                anyhow::bail!(
                    "snapshot run failed for {} of {} instances: {}",
                    report.failed.len(),
                    report.instances,
                    report.failed.join(", ")
                );
            }
        }
    }

    out.flush()?;
    Ok(())
}
