use crate::error::{Result, ShotError};
use crate::model::{self, Instance, Snapshot, SnapshotState, Volume, PROJECT_TAG};
use crate::provider::Provider;
use async_trait::async_trait;
use aws_sdk_ec2::client::Waiters;
use aws_sdk_ec2::primitives::DateTime;
use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::Client as Ec2Client;
use chrono::Utc;
use std::time::Duration;
use tracing::debug;

/// [`Provider`] backed by the EC2 API.
pub struct Ec2Provider {
    client: Ec2Client,
    max_wait: Duration,
}

impl Ec2Provider {
    pub fn new(config: &aws_types::SdkConfig, max_wait: Duration) -> Self {
        Self {
            client: Ec2Client::new(config),
            max_wait,
        }
    }
}

fn filter(name: &str, value: &str) -> Filter {
    Filter::builder().name(name).values(value).build()
}

fn to_chrono(time: Option<&DateTime>) -> Option<chrono::DateTime<Utc>> {
    time.and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
}

fn convert_instance(inst: &aws_sdk_ec2::types::Instance) -> Result<Instance> {
    let id = inst.instance_id().ok_or(ShotError::MissingField {
        resource: "Instance",
        field: "instance_id",
    })?;

    let tags = inst
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
        .collect();

    Ok(Instance {
        id: id.to_string(),
        instance_type: inst
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        availability_zone: inst
            .placement()
            .and_then(|p| p.availability_zone())
            .unwrap_or_default()
            .to_string(),
        state: inst
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string())
            .unwrap_or_default(),
        public_dns_name: inst.public_dns_name().unwrap_or_default().to_string(),
        tags,
    })
}

fn convert_volume(vol: &aws_sdk_ec2::types::Volume, instance_id: &str) -> Result<Volume> {
    let id = vol.volume_id().ok_or(ShotError::MissingField {
        resource: "Volume",
        field: "volume_id",
    })?;

    Ok(Volume {
        id: id.to_string(),
        instance_id: instance_id.to_string(),
        state: vol
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        size_gib: vol.size().unwrap_or_default(),
        encrypted: vol.encrypted().unwrap_or_default(),
    })
}

fn convert_snapshot(snap: &aws_sdk_ec2::types::Snapshot) -> Result<Snapshot> {
    let id = snap.snapshot_id().ok_or(ShotError::MissingField {
        resource: "Snapshot",
        field: "snapshot_id",
    })?;

    Ok(Snapshot {
        id: id.to_string(),
        volume_id: snap.volume_id().unwrap_or_default().to_string(),
        state: snap
            .state()
            .map(|s| SnapshotState::from(s.as_str()))
            .unwrap_or_else(|| SnapshotState::Other(String::new())),
        progress: snap.progress().unwrap_or_default().to_string(),
        start_time: to_chrono(snap.start_time()),
        description: snap.description().unwrap_or_default().to_string(),
    })
}

#[async_trait]
impl Provider for Ec2Provider {
    async fn instances(&self, project: Option<&str>) -> Result<Vec<Instance>> {
        let mut request = self.client.describe_instances();
        if let Some(project) = project.filter(|p| !p.is_empty()) {
            request = request.filters(filter(&format!("tag:{}", PROJECT_TAG), project));
        }

        let mut pages = request.into_paginator().send();
        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| ShotError::client("DescribeInstances", e))?;
            for inst in page.reservations().iter().flat_map(|res| res.instances()) {
                instances.push(convert_instance(inst)?);
            }
        }

        debug!(count = instances.len(), ?project, "described instances");
        Ok(instances)
    }

    async fn volumes(&self, instance: &Instance) -> Result<Vec<Volume>> {
        let mut pages = self
            .client
            .describe_volumes()
            .filters(filter("attachment.instance-id", &instance.id))
            .into_paginator()
            .send();

        let mut volumes = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| ShotError::client("DescribeVolumes", e))?;
            for vol in page.volumes() {
                volumes.push(convert_volume(vol, &instance.id)?);
            }
        }
        Ok(volumes)
    }

    async fn snapshots(&self, volume: &Volume) -> Result<Vec<Snapshot>> {
        let mut pages = self
            .client
            .describe_snapshots()
            .owner_ids("self")
            .filters(filter("volume-id", &volume.id))
            .into_paginator()
            .send();

        let mut snapshots = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| ShotError::client("DescribeSnapshots", e))?;
            for snap in page.snapshots() {
                snapshots.push(convert_snapshot(snap)?);
            }
        }

        // DescribeSnapshots makes no ordering promise.
        model::sort_newest_first(&mut snapshots);
        Ok(snapshots)
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| ShotError::client("StopInstances", e))?;
        Ok(())
    }

    async fn start_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| ShotError::client("StartInstances", e))?;
        Ok(())
    }

    async fn wait_until_stopped(&self, instance_id: &str) -> Result<()> {
        self.client
            .wait_until_instance_stopped()
            .instance_ids(instance_id)
            .wait(self.max_wait)
            .await
            .map_err(|e| ShotError::Wait {
                instance_id: instance_id.to_string(),
                target: "stopped",
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_until_running(&self, instance_id: &str) -> Result<()> {
        self.client
            .wait_until_instance_running()
            .instance_ids(instance_id)
            .wait(self.max_wait)
            .await
            .map_err(|e| ShotError::Wait {
                instance_id: instance_id.to_string(),
                target: "running",
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot> {
        let resp = self
            .client
            .create_snapshot()
            .volume_id(volume_id)
            .description(description)
            .send()
            .await
            .map_err(|e| ShotError::client("CreateSnapshot", e))?;

        let id = resp.snapshot_id().ok_or(ShotError::MissingField {
            resource: "CreateSnapshot",
            field: "snapshot_id",
        })?;

        Ok(Snapshot {
            id: id.to_string(),
            volume_id: resp.volume_id().unwrap_or(volume_id).to_string(),
            state: resp
                .state()
                .map(|s| SnapshotState::from(s.as_str()))
                .unwrap_or(SnapshotState::Pending),
            progress: resp.progress().unwrap_or_default().to_string(),
            start_time: to_chrono(resp.start_time()),
            description: description.to_string(),
        })
    }
}
