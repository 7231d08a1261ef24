//! Simulated host implementing every host operation port.
//!
//! Models only the state transitions the tools need (array up/down, parity
//! progress, VM power states, notification inbox). Used by the binary for
//! local runs and by the tests. Not connected to any real hardware.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::domain::foundation::{OperationError, Timestamp};
use crate::ports::{
    ArrayControl, ArrayState, Importance, Notification, NotificationFilter, NotificationStore,
    ParityAction, ParityStatus, PowerSource, QueryPassthrough, UpsMonitor, UpsStatus, VmAction,
    VmControl, VmInfo, VmSpec, VmState,
};

/// Most recent passthrough queries kept for inspection.
pub const QUERY_LOG_CAPACITY: usize = 64;

/// In-memory stand-in for a storage server's control plane.
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    state: Arc<RwLock<HostState>>,
    /// When set, every operation fails with a backend error.
    offline: Arc<AtomicBool>,
    /// Delay applied before every operation.
    latency: Duration,
}

#[derive(Debug)]
struct HostState {
    array: ArrayState,
    parity: ParityStatus,
    vms: BTreeMap<String, VmInfo>,
    next_vm: u32,
    notifications: BTreeMap<String, Notification>,
    ups: UpsStatus,
    queries: VecDeque<String>,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            array: ArrayState::Stopped,
            parity: ParityStatus::idle(),
            vms: BTreeMap::new(),
            next_vm: 1,
            notifications: BTreeMap::new(),
            ups: UpsStatus {
                model: "Back-UPS 1500".to_string(),
                source: PowerSource::Mains,
                battery_charge_percent: 100,
                runtime_secs: 2_400,
                load_percent: 18,
            },
            queries: VecDeque::new(),
        }
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHost {
    /// An idle host: array stopped, no VMs, empty inbox.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(HostState::default())),
            offline: Arc::new(AtomicBool::new(false)),
            latency: Duration::ZERO,
        }
    }

    /// A host with the array started, two VMs and three notifications.
    pub fn seeded() -> Self {
        let mut state = HostState {
            array: ArrayState::Started,
            ..HostState::default()
        };
        for (name, vm_state, memory_mib, vcpus) in [
            ("home-assistant", VmState::Running, 2_048, 2),
            ("windows-11", VmState::Stopped, 8_192, 4),
        ] {
            let id = format!("vm-{}", state.next_vm);
            state.next_vm += 1;
            state.vms.insert(
                id.clone(),
                VmInfo {
                    id,
                    name: name.to_string(),
                    state: vm_state,
                    memory_mib,
                    vcpus,
                },
            );
        }
        for (n, subject, importance, archived) in [
            (1, "Parity check finished (0 errors)", Importance::Normal, false),
            (2, "Disk 3 temperature 52C", Importance::Warning, false),
            (3, "Docker image update available", Importance::Normal, true),
        ] {
            let id = n.to_string();
            state.notifications.insert(
                id.clone(),
                Notification {
                    id,
                    subject: subject.to_string(),
                    importance,
                    archived,
                    created_at: Timestamp::now(),
                },
            );
        }
        Self {
            state: Arc::new(RwLock::new(state)),
            offline: Arc::new(AtomicBool::new(false)),
            latency: Duration::ZERO,
        }
    }

    /// Delays every operation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Simulates the control plane becoming unreachable (or coming back).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// The last [`QUERY_LOG_CAPACITY`] queries received by the passthrough,
    /// oldest first.
    pub async fn executed_queries(&self) -> Vec<String> {
        self.state.read().await.queries.iter().cloned().collect()
    }

    /// Current VM record, if any.
    pub async fn vm(&self, vm_id: &str) -> Option<VmInfo> {
        self.state.read().await.vms.get(vm_id).cloned()
    }

    /// Number of notifications, archived included.
    pub async fn notification_count(&self) -> usize {
        self.state.read().await.notifications.len()
    }

    async fn preflight(&self) -> Result<(), OperationError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(OperationError::backend("control plane unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ArrayControl for SimulatedHost {
    async fn start_array(&self) -> Result<ArrayState, OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        if state.array == ArrayState::Started {
            return Err(OperationError::invalid_state("array is already started"));
        }
        state.array = ArrayState::Started;
        Ok(state.array)
    }

    async fn stop_array(&self) -> Result<ArrayState, OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        if state.array == ArrayState::Stopped {
            return Err(OperationError::invalid_state("array is already stopped"));
        }
        if state.parity.running {
            return Err(OperationError::invalid_state(
                "cannot stop the array while a parity check is running",
            ));
        }
        state.array = ArrayState::Stopped;
        for vm in state.vms.values_mut() {
            vm.state = VmState::Stopped;
        }
        Ok(state.array)
    }

    async fn array_state(&self) -> Result<ArrayState, OperationError> {
        self.preflight().await?;
        Ok(self.state.read().await.array)
    }

    async fn parity_check(&self, action: ParityAction) -> Result<ParityStatus, OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        let array_started = state.array == ArrayState::Started;
        let parity = &mut state.parity;
        match action {
            ParityAction::Start | ParityAction::StartCorrecting => {
                if parity.running {
                    return Err(OperationError::invalid_state("a parity check is already running"));
                }
                if !array_started {
                    return Err(OperationError::invalid_state(
                        "the array must be started to run a parity check",
                    ));
                }
                *parity = ParityStatus {
                    running: true,
                    correcting: action == ParityAction::StartCorrecting,
                    ..ParityStatus::idle()
                };
            }
            ParityAction::Pause => {
                if !parity.running || parity.paused {
                    return Err(OperationError::invalid_state("no running parity check to pause"));
                }
                parity.paused = true;
            }
            ParityAction::Resume => {
                if !parity.paused {
                    return Err(OperationError::invalid_state("no paused parity check to resume"));
                }
                parity.paused = false;
            }
            ParityAction::Cancel => {
                if !parity.running {
                    return Err(OperationError::invalid_state("no parity check to cancel"));
                }
                *parity = ParityStatus::idle();
            }
        }
        Ok(parity.clone())
    }

    async fn parity_status(&self) -> Result<ParityStatus, OperationError> {
        self.preflight().await?;
        Ok(self.state.read().await.parity.clone())
    }
}

#[async_trait]
impl VmControl for SimulatedHost {
    async fn list_vms(&self) -> Result<Vec<VmInfo>, OperationError> {
        self.preflight().await?;
        Ok(self.state.read().await.vms.values().cloned().collect())
    }

    async fn control_vm(&self, vm_id: &str, action: VmAction) -> Result<VmInfo, OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        let array_started = state.array == ArrayState::Started;
        let vm = state
            .vms
            .get_mut(vm_id)
            .ok_or_else(|| OperationError::not_found(format!("vm {vm_id}")))?;

        let next = match (action, vm.state) {
            (VmAction::Start, VmState::Stopped) if !array_started => {
                return Err(OperationError::invalid_state(
                    "the array must be started before starting a vm",
                ));
            }
            (VmAction::Start, VmState::Stopped) => VmState::Running,
            (VmAction::Stop | VmAction::ForceStop, VmState::Running | VmState::Paused) => {
                VmState::Stopped
            }
            (VmAction::Pause, VmState::Running) => VmState::Paused,
            (VmAction::Resume, VmState::Paused) => VmState::Running,
            (VmAction::Reboot, VmState::Running) => VmState::Running,
            (action, current) => {
                return Err(OperationError::invalid_state(format!(
                    "cannot {action} vm {vm_id} while it is {current}"
                )));
            }
        };
        vm.state = next;
        Ok(vm.clone())
    }

    async fn create_vm(&self, spec: &VmSpec) -> Result<VmInfo, OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        if state.vms.values().any(|vm| vm.name == spec.name) {
            return Err(OperationError::invalid_state(format!(
                "a vm named {} already exists",
                spec.name
            )));
        }
        let id = format!("vm-{}", state.next_vm);
        state.next_vm += 1;
        let vm = VmInfo {
            id: id.clone(),
            name: spec.name.clone(),
            state: VmState::Stopped,
            memory_mib: spec.memory_mib,
            vcpus: spec.vcpus,
        };
        state.vms.insert(id, vm.clone());
        Ok(vm)
    }

    async fn delete_vm(&self, vm_id: &str) -> Result<(), OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        let vm_state = state
            .vms
            .get(vm_id)
            .map(|vm| vm.state)
            .ok_or_else(|| OperationError::not_found(format!("vm {vm_id}")))?;
        if vm_state != VmState::Stopped {
            return Err(OperationError::invalid_state(format!(
                "vm {vm_id} must be stopped before it can be deleted"
            )));
        }
        state.vms.remove(vm_id);
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for SimulatedHost {
    async fn list_notifications(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, OperationError> {
        self.preflight().await?;
        Ok(self
            .state
            .read()
            .await
            .notifications
            .values()
            .filter(|n| filter.include_archived || !n.archived)
            .cloned()
            .collect())
    }

    async fn delete_notification(&self, id: &str) -> Result<(), OperationError> {
        self.preflight().await?;
        self.state
            .write()
            .await
            .notifications
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| OperationError::not_found(format!("notification {id}")))
    }

    async fn archive_notification(&self, id: &str) -> Result<Notification, OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        let notification = state
            .notifications
            .get_mut(id)
            .ok_or_else(|| OperationError::not_found(format!("notification {id}")))?;
        if notification.archived {
            return Err(OperationError::invalid_state(format!(
                "notification {id} is already archived"
            )));
        }
        notification.archived = true;
        Ok(notification.clone())
    }

    async fn delete_all_notifications(&self) -> Result<usize, OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        let removed = state.notifications.len();
        state.notifications.clear();
        Ok(removed)
    }
}

#[async_trait]
impl UpsMonitor for SimulatedHost {
    async fn ups_status(&self) -> Result<UpsStatus, OperationError> {
        self.preflight().await?;
        Ok(self.state.read().await.ups.clone())
    }
}

#[async_trait]
impl QueryPassthrough for SimulatedHost {
    async fn execute(&self, query: &str, variables: Option<&Value>) -> Result<Value, OperationError> {
        self.preflight().await?;
        let mut state = self.state.write().await;
        if state.queries.len() == QUERY_LOG_CAPACITY {
            state.queries.pop_front();
        }
        state.queries.push_back(query.to_string());
        Ok(json!({
            "data": {
                "received": query.len(),
                "variables": variables.cloned().unwrap_or(Value::Null),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn array_start_and_stop_transitions() {
        let host = SimulatedHost::new();

        assert_eq!(host.start_array().await.unwrap(), ArrayState::Started);
        assert!(matches!(
            host.start_array().await,
            Err(OperationError::InvalidState(_))
        ));
        assert_eq!(host.stop_array().await.unwrap(), ArrayState::Stopped);
    }

    #[tokio::test]
    async fn stop_is_refused_during_parity_check() {
        let host = SimulatedHost::seeded();
        host.parity_check(ParityAction::Start).await.unwrap();

        let err = host.stop_array().await.unwrap_err();
        assert!(err.to_string().contains("parity check"));

        host.parity_check(ParityAction::Cancel).await.unwrap();
        assert!(host.stop_array().await.is_ok());
    }

    #[tokio::test]
    async fn parity_pause_resume_cycle() {
        let host = SimulatedHost::seeded();

        assert!(host.parity_check(ParityAction::Pause).await.is_err());
        let status = host.parity_check(ParityAction::StartCorrecting).await.unwrap();
        assert!(status.running && status.correcting);

        assert!(host.parity_check(ParityAction::Pause).await.unwrap().paused);
        assert!(!host.parity_check(ParityAction::Resume).await.unwrap().paused);
    }

    #[tokio::test]
    async fn vm_control_enforces_state_machine() {
        let host = SimulatedHost::seeded();

        let vm = host.control_vm("vm-1", VmAction::Pause).await.unwrap();
        assert_eq!(vm.state, VmState::Paused);

        let err = host.control_vm("vm-1", VmAction::Reboot).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot reboot vm vm-1 while it is paused");

        let err = host.control_vm("vm-42", VmAction::Start).await.unwrap_err();
        assert_eq!(err, OperationError::not_found("vm vm-42"));
    }

    #[tokio::test]
    async fn running_vm_cannot_be_deleted() {
        let host = SimulatedHost::seeded();

        assert!(matches!(
            host.delete_vm("vm-1").await,
            Err(OperationError::InvalidState(_))
        ));
        host.delete_vm("vm-2").await.unwrap();
        assert!(host.vm("vm-2").await.is_none());
    }

    #[tokio::test]
    async fn create_vm_assigns_fresh_id_and_rejects_duplicates() {
        let host = SimulatedHost::seeded();
        let spec = VmSpec {
            name: "pihole".to_string(),
            memory_mib: 512,
            vcpus: 1,
        };

        let vm = host.create_vm(&spec).await.unwrap();
        assert_eq!(vm.id, "vm-3");
        assert_eq!(vm.state, VmState::Stopped);
        assert!(host.create_vm(&spec).await.is_err());
    }

    #[tokio::test]
    async fn notifications_filter_archive_and_delete() {
        let host = SimulatedHost::seeded();

        let active = host
            .list_notifications(&NotificationFilter::default())
            .await
            .unwrap();
        assert_eq!(active.len(), 2);

        host.archive_notification("1").await.unwrap();
        assert!(host.archive_notification("1").await.is_err());

        let all = host
            .list_notifications(&NotificationFilter {
                include_archived: true,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        host.delete_notification("2").await.unwrap();
        assert_eq!(host.delete_all_notifications().await.unwrap(), 2);
        assert_eq!(host.notification_count().await, 0);
    }

    #[tokio::test]
    async fn offline_host_reports_backend_errors() {
        let host = SimulatedHost::seeded();
        host.set_offline(true);

        let err = host.ups_status().await.unwrap_err();
        assert_eq!(err, OperationError::backend("control plane unreachable"));

        host.set_offline(false);
        assert!(host.ups_status().await.is_ok());
    }

    #[tokio::test]
    async fn passthrough_records_queries() {
        let host = SimulatedHost::new();
        host.execute("query { array { state } }", None).await.unwrap();

        assert_eq!(
            host.executed_queries().await,
            vec!["query { array { state } }".to_string()]
        );
    }

    #[tokio::test]
    async fn query_log_keeps_only_recent_queries() {
        let host = SimulatedHost::new();
        for i in 0..QUERY_LOG_CAPACITY + 10 {
            host.execute(&format!("query {{ q{i} }}"), None).await.unwrap();
        }

        let queries = host.executed_queries().await;
        assert_eq!(queries.len(), QUERY_LOG_CAPACITY);
        assert_eq!(queries[0], "query { q10 }");
        assert_eq!(
            queries.last().unwrap(),
            &format!("query {{ q{} }}", QUERY_LOG_CAPACITY + 9)
        );
    }
}
