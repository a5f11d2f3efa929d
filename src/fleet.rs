//! The operations behind every `shotty` command.
//!
//! Each operation resolves the instances matching the project filter and
//! processes them one at a time, writing comma-separated records to the
//! supplied writer.

use crate::error::{Result, ShotError};
use crate::model::{Instance, SnapshotState, Volume};
use crate::provider::Provider;
use std::io::Write;
use tracing::{info, warn};

pub const SNAPSHOT_DESCRIPTION: &str = "Created by SnapshotAlyzer 30000";
pub const NO_PROJECT: &str = "<no project>";
const START_TIME_FORMAT: &str = "%c";

/// What `create_snapshots` does when one instance fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Stop the whole run at the first error.
    #[default]
    Abort,
    /// Report client and waiter failures, restart the instance if it was
    /// stopped, and move on to the next one.
    Continue,
}

#[derive(Debug, Clone, Default)]
pub struct FleetOptions {
    pub snapshot_failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub instances: usize,
    pub failed: Vec<String>,
    pub snapshots_created: usize,
    pub volumes_skipped: usize,
}

pub struct Fleet<P> {
    provider: P,
    options: FleetOptions,
}

impl<P: Provider> Fleet<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, FleetOptions::default())
    }

    pub fn with_options(provider: P, options: FleetOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn filter_instances(&self, project: Option<&str>) -> Result<Vec<Instance>> {
        let project = project.filter(|p| !p.is_empty());
        let instances = self.provider.instances(project).await?;
        // The provider already filters; keep the invariant even if it did not.
        Ok(instances
            .into_iter()
            .filter(|i| i.matches_project(project))
            .collect())
    }

    /// Whether the most recent snapshot of `volume` is still pending.
    ///
    /// Advisory only: nothing prevents another actor from starting a
    /// snapshot between this check and a subsequent create call.
    pub async fn has_pending_snapshot(&self, volume: &Volume) -> Result<bool> {
        let snapshots = self.provider.snapshots(volume).await?;
        Ok(snapshots
            .first()
            .is_some_and(|s| s.state == SnapshotState::Pending))
    }

    pub async fn list_instances<W: Write>(&self, project: Option<&str>, out: &mut W) -> Result<()> {
        for i in self.filter_instances(project).await? {
            writeln!(
                out,
                "{}",
                [
                    i.id.as_str(),
                    i.instance_type.as_str(),
                    i.availability_zone.as_str(),
                    i.state.as_str(),
                    i.public_dns_name.as_str(),
                    i.project().unwrap_or(NO_PROJECT),
                ]
                .join(",")
            )?;
        }
        Ok(())
    }

    pub async fn list_volumes<W: Write>(&self, project: Option<&str>, out: &mut W) -> Result<()> {
        for i in self.filter_instances(project).await? {
            for v in self.provider.volumes(&i).await? {
                writeln!(
                    out,
                    "{},{},{},{}GiB,{}",
                    v.id,
                    i.id,
                    v.state,
                    v.size_gib,
                    if v.encrypted { "Encrypted" } else { "Not Encrypted" }
                )?;
            }
        }
        Ok(())
    }

    /// Lists snapshots per volume. Unless `list_all` is set, each volume
    /// stops after its newest completed snapshot.
    pub async fn list_snapshots<W: Write>(
        &self,
        project: Option<&str>,
        list_all: bool,
        out: &mut W,
    ) -> Result<()> {
        for i in self.filter_instances(project).await? {
            for v in self.provider.volumes(&i).await? {
                for s in self.provider.snapshots(&v).await? {
                    let start_time = s
                        .start_time
                        .map(|t| t.format(START_TIME_FORMAT).to_string())
                        .unwrap_or_default();
                    writeln!(
                        out,
                        "{},{},{},{},{},{}",
                        s.id, v.id, i.id, s.state, s.progress, start_time
                    )?;

                    if s.state == SnapshotState::Completed && !list_all {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Stops each instance, snapshots its volumes and starts it again.
    ///
    /// Volumes whose latest snapshot is still pending are skipped. Errors are
    /// handled according to [`FleetOptions::snapshot_failure_policy`]; with
    /// [`FailurePolicy::Continue`] an instance that fails after being stopped
    /// is started again before the batch moves on.
    pub async fn create_snapshots<W: Write>(
        &self,
        project: Option<&str>,
        out: &mut W,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for i in self.filter_instances(project).await? {
            report.instances += 1;
            match self.snapshot_instance(&i, out, &mut report).await {
                Ok(()) => {}
                Err(e) if self.recoverable(&e) => {
                    info!(instance_id = %i.id, error = %e, "snapshot run failed for instance");
                    writeln!(out, "Could not snapshot {}. {}", i.id, e)?;
                    report.failed.push(i.id.clone());
                }
                Err(e) => return Err(e),
            }
        }

        writeln!(out, "Job's done!")?;
        Ok(report)
    }

    fn recoverable(&self, err: &ShotError) -> bool {
        self.options.snapshot_failure_policy == FailurePolicy::Continue
            && (err.is_client() || matches!(err, ShotError::Wait { .. }))
    }

    async fn snapshot_instance<W: Write>(
        &self,
        i: &Instance,
        out: &mut W,
        report: &mut BatchReport,
    ) -> Result<()> {
        writeln!(out, "Stopping {}...", i.id)?;
        self.provider.stop_instance(&i.id).await?;

        if let Err(e) = self.snapshot_volumes(i, out, report).await {
            if self.recoverable(&e) {
                self.restart_after_failure(i, out).await?;
            }
            return Err(e);
        }

        writeln!(out, "Starting {}...", i.id)?;
        self.provider.start_instance(&i.id).await?;
        self.provider.wait_until_running(&i.id).await?;
        Ok(())
    }

    async fn snapshot_volumes<W: Write>(
        &self,
        i: &Instance,
        out: &mut W,
        report: &mut BatchReport,
    ) -> Result<()> {
        self.provider.wait_until_stopped(&i.id).await?;

        for v in self.provider.volumes(i).await? {
            if self.has_pending_snapshot(&v).await? {
                writeln!(out, "  Skipping {}, snapshot already in progress", v.id)?;
                report.volumes_skipped += 1;
                continue;
            }

            writeln!(out, "  Creating snapshot of {}", v.id)?;
            let snapshot = self
                .provider
                .create_snapshot(&v.id, SNAPSHOT_DESCRIPTION)
                .await?;
            info!(volume_id = %v.id, snapshot_id = %snapshot.id, "snapshot requested");
            report.snapshots_created += 1;
        }
        Ok(())
    }

    /// Best-effort start for an instance whose snapshot run failed after it
    /// was stopped. A failed start is reported; the running state is not awaited.
    async fn restart_after_failure<W: Write>(&self, i: &Instance, out: &mut W) -> Result<()> {
        writeln!(out, "Starting {}...", i.id)?;
        if let Err(e) = self.provider.start_instance(&i.id).await {
            warn!(instance_id = %i.id, error = %e, "could not restart instance after failure");
            writeln!(out, "Could not start {}. {}", i.id, e)?;
        }
        Ok(())
    }

    /// Requests a stop for every instance. Client errors are reported and
    /// the batch continues; the stopped state is not awaited.
    pub async fn stop_instances<W: Write>(
        &self,
        project: Option<&str>,
        out: &mut W,
    ) -> Result<BatchReport> {
        self.power(project, Power::Stop, out).await
    }

    /// Requests a start for every instance, with the same error handling
    /// as [`Fleet::stop_instances`].
    pub async fn start_instances<W: Write>(
        &self,
        project: Option<&str>,
        out: &mut W,
    ) -> Result<BatchReport> {
        self.power(project, Power::Start, out).await
    }

    async fn power<W: Write>(
        &self,
        project: Option<&str>,
        power: Power,
        out: &mut W,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for i in self.filter_instances(project).await? {
            report.instances += 1;
            writeln!(out, "{} {}...", power.progress(), i.id)?;

            let result = match power {
                Power::Stop => self.provider.stop_instance(&i.id).await,
                Power::Start => self.provider.start_instance(&i.id).await,
            };

            match result {
                Ok(()) => {}
                Err(e) if e.is_client() => {
                    info!(instance_id = %i.id, error = %e, "could not {}", power.verb());
                    writeln!(out, "Could not {} {}. {}", power.verb(), i.id, e)?;
                    report.failed.push(i.id.clone());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

#[derive(Debug, Clone, Copy)]
enum Power {
    Stop,
    Start,
}

impl Power {
    fn verb(self) -> &'static str {
        match self {
            Power::Stop => "stop",
            Power::Start => "start",
        }
    }

    fn progress(self) -> &'static str {
        match self {
            Power::Stop => "Stopping",
            Power::Start => "Starting",
        }
    }
}
