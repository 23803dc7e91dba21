//! Remote registry sync - publishes the structured-command schema

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::errors::SyncError;
use crate::application::registry::ModuleRegistry;
use crate::domain::entities::StructuredCommandDescriptor;
use crate::domain::traits::{RateLimitNotice, RemoteCommand, RemoteRegistry};

/// Result of a successful deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub sent: usize,
    pub acknowledged: usize,
}

/// Pushes the complete structured-command set to the remote registry.
///
/// The remote side has no incremental update, so every deploy sends the
/// whole set. Failures are logged and returned; the previous remote
/// registrations stay in place until the next successful deploy.
pub struct RemoteRegistrySync {
    remote: Arc<dyn RemoteRegistry>,
    registry: Arc<ModuleRegistry>,
}

impl RemoteRegistrySync {
    pub fn new(remote: Arc<dyn RemoteRegistry>, registry: Arc<ModuleRegistry>) -> Self {
        Self { remote, registry }
    }

    /// Replace the remote set with `descriptors`
    pub async fn deploy(
        &self,
        descriptors: &[Arc<StructuredCommandDescriptor>],
    ) -> Result<DeployReport, SyncError> {
        let payload: Vec<RemoteCommand> = descriptors
            .iter()
            .map(|d| RemoteCommand::from(d.as_ref()))
            .collect();

        tracing::info!("Deploying {} structured commands", payload.len());
        match self.remote.replace_all(&payload).await {
            Ok(acknowledged) => {
                if acknowledged != payload.len() {
                    tracing::warn!(
                        "Remote registry acknowledged {} of {} structured commands",
                        acknowledged,
                        payload.len()
                    );
                }
                tracing::info!("Deployed {} structured commands", acknowledged);
                Ok(DeployReport {
                    sent: payload.len(),
                    acknowledged,
                })
            }
            Err(e) => {
                match &e {
                    SyncError::RateLimited { retry_after } => tracing::warn!(
                        "Structured command deploy rate limited; retry after {:.1}s",
                        retry_after.as_secs_f64()
                    ),
                    SyncError::Validation(body) => {
                        tracing::error!("Remote registry rejected the schema: {}", body)
                    }
                    other => tracing::error!("Structured command deploy failed: {}", other),
                }
                Err(e)
            }
        }
    }

    /// Deploy the registry's current structured snapshot
    pub async fn deploy_current(&self) -> Result<DeployReport, SyncError> {
        let snapshot = self.registry.structured_snapshot();
        self.deploy(&snapshot).await
    }

    /// Log every rate-limit notice arriving on `notices` until the sender is dropped
    pub fn spawn_notice_logger(
        mut notices: mpsc::UnboundedReceiver<RateLimitNotice>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                log_notice(&notice);
            }
        })
    }
}

pub fn log_notice(notice: &RateLimitNotice) {
    tracing::warn!(
        method = %notice.method,
        path = %notice.path,
        status = notice.status,
        limit = ?notice.limit,
        remaining = ?notice.remaining,
        reset_after_secs = ?notice.reset_after.map(|d| d.as_secs_f64()),
        bucket = ?notice.bucket,
        global = notice.global,
        "Rate limit notice from remote registry"
    );
}
