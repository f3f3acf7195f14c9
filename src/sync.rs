//! Best-effort mirroring of confirmed orders to the remote store.
//!
//! Local persistence is authoritative and always happens first. A sync
//! attempt never returns an error: remote failures are logged and reported
//! as [`SyncOutcome::Failed`]. There is no retry queue; a reconnect or a
//! sign-in triggers a full resync, which is safe because every upsert is
//! keyed by the local order id.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::AuthSession;
use crate::commands::orders;
use crate::connectivity::Connectivity;
use crate::db::KeyValueStore;
use crate::error::PosResult;
use crate::models::ConfirmedOrder;
use crate::remote::{RemoteError, RemoteOrderRecord, RemoteOrders};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced,
    Failed,
    /// Offline or signed out; nothing was sent.
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Synced => self.synced += 1,
            SyncOutcome::Failed => self.failed += 1,
            SyncOutcome::Skipped => self.skipped += 1,
        }
    }
}

pub struct SyncBridge {
    remote: Arc<dyn RemoteOrders>,
    auth: Arc<dyn AuthSession>,
    connectivity: Arc<dyn Connectivity>,
}

impl SyncBridge {
    pub fn new(
        remote: Arc<dyn RemoteOrders>,
        auth: Arc<dyn AuthSession>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            remote,
            auth,
            connectivity,
        }
    }

    pub fn can_sync(&self) -> bool {
        self.connectivity.is_online() && self.auth.is_authenticated()
    }

    /// Idempotent upsert of one order.
    pub async fn sync(&self, order: &ConfirmedOrder) -> SyncOutcome {
        if !self.can_sync() {
            debug!(order_id = %order.id, "sync skipped: offline or not signed in");
            return SyncOutcome::Skipped;
        }

        match self.upsert(order).await {
            Ok(record_id) => {
                debug!(order_id = %order.id, record_id = %record_id, "order synced");
                SyncOutcome::Synced
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "order sync failed; kept locally");
                SyncOutcome::Failed
            }
        }
    }

    async fn upsert(&self, order: &ConfirmedOrder) -> Result<String, RemoteError> {
        let user = self.auth.current_user().map(|u| u.id);
        let record = RemoteOrderRecord::from_order(order, user.as_deref())?;

        match self.remote.find_by_order_id(&order.id).await {
            Ok(record_id) => {
                self.remote.update(&record_id, &record).await?;
                Ok(record_id)
            }
            Err(RemoteError::NotFound) => self.remote.create(&record).await,
            Err(e) => Err(e),
        }
    }

    /// Sync orders one after another. A failure does not stop the batch.
    pub async fn sync_all(&self, orders: &[ConfirmedOrder]) -> SyncReport {
        let mut report = SyncReport::default();

        if !self.can_sync() {
            debug!(count = orders.len(), "bulk sync skipped: offline or not signed in");
            report.skipped = orders.len();
            return report;
        }

        info!(count = orders.len(), "bulk order sync started");
        for order in orders {
            report.record(self.sync(order).await);
        }
        info!(
            synced = report.synced,
            failed = report.failed,
            skipped = report.skipped,
            "bulk order sync finished"
        );

        report
    }

    /// Orders mirrored for the signed-in user, newest first. Empty when
    /// offline, signed out, or on any remote error.
    pub async fn fetch_remote_orders(&self) -> Vec<ConfirmedOrder> {
        if !self.can_sync() {
            return Vec::new();
        }
        let Some(user) = self.auth.current_user() else {
            return Vec::new();
        };

        let records = match self.remote.list_for_user(&user.id).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "failed to fetch remote orders");
                return Vec::new();
            }
        };

        records
            .into_iter()
            .filter_map(|record| {
                let order_id = record.order_id.clone();
                record
                    .into_order()
                    .map_err(|e| warn!(order_id = %order_id, error = %e, "skipping malformed remote order"))
                    .ok()
            })
            .collect()
    }

    /// Reload every local order and push it.
    pub async fn resync_store<S: KeyValueStore>(&self, store: &S) -> PosResult<SyncReport> {
        let local = orders::get_orders(store)?;
        Ok(self.sync_all(&local).await)
    }
}

/// Fire-and-forget sync of a freshly saved order.
pub fn spawn_sync(bridge: Arc<SyncBridge>, order: ConfirmedOrder) -> JoinHandle<SyncOutcome> {
    tokio::spawn(async move { bridge.sync(&order).await })
}

/// Resync the whole store on every offline -> online transition. Runs until
/// the sending side of `online_rx` is dropped.
pub fn spawn_resync_on_reconnect<S>(
    bridge: Arc<SyncBridge>,
    store: Arc<S>,
    online_rx: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: KeyValueStore + Send + Sync + 'static,
{
    spawn_resync_on_rise(bridge, store, online_rx, "reconnect")
}

/// Resync the whole store every time a user signs in, so orders confirmed
/// while signed out reach the remote. Feed it [`TokenSession::subscribe`].
///
/// [`TokenSession::subscribe`]: crate::auth::TokenSession::subscribe
pub fn spawn_resync_on_login<S>(
    bridge: Arc<SyncBridge>,
    store: Arc<S>,
    auth_rx: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: KeyValueStore + Send + Sync + 'static,
{
    spawn_resync_on_rise(bridge, store, auth_rx, "login")
}

/// Resync on each false -> true change of `rx`.
fn spawn_resync_on_rise<S>(
    bridge: Arc<SyncBridge>,
    store: Arc<S>,
    mut rx: watch::Receiver<bool>,
    trigger: &'static str,
) -> JoinHandle<()>
where
    S: KeyValueStore + Send + Sync + 'static,
{
    let mut was_up = *rx.borrow_and_update();

    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let up = *rx.borrow_and_update();
            if up && !was_up {
                match bridge.resync_store(store.as_ref()).await {
                    Ok(report) => info!(
                        trigger,
                        synced = report.synced,
                        failed = report.failed,
                        "resync complete"
                    ),
                    Err(e) => warn!(trigger, error = %e, "resync could not read local orders"),
                }
            }
            was_up = up;
        }
    })
}
