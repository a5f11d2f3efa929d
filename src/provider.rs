use crate::error::Result;
use crate::model::{Instance, Snapshot, Volume};
use async_trait::async_trait;

/// Access to the cloud resources the fleet driver operates on.
///
/// All state lives with the provider; implementations hold no caches.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Instances tagged `Project=<project>`, or every instance when `project` is `None`.
    async fn instances(&self, project: Option<&str>) -> Result<Vec<Instance>>;

    /// Volumes attached to `instance`.
    async fn volumes(&self, instance: &Instance) -> Result<Vec<Volume>>;

    /// Snapshots of `volume`, newest first.
    ///
    /// Callers rely on this order: the first element is treated as the most
    /// recent snapshot.
    async fn snapshots(&self, volume: &Volume) -> Result<Vec<Snapshot>>;

    async fn stop_instance(&self, instance_id: &str) -> Result<()>;

    async fn start_instance(&self, instance_id: &str) -> Result<()>;

    async fn wait_until_stopped(&self, instance_id: &str) -> Result<()>;

    async fn wait_until_running(&self, instance_id: &str) -> Result<()>;

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot>;
}
