//! Tool catalog - wires every tool to its gate.
//!
//! Each domain group gets its own tracker so groups never contend on one
//! lock. Informational tools share a gate without a tracker.
//!
//! | Tracker         | Gated tools                                  |
//! |-----------------|----------------------------------------------|
//! | `array`         | `array_start`, `array_stop`, `parity_check`  |
//! | `vm`            | `vm_control`, `vm_create`, `vm_delete`       |
//! | `notifications` | `notifications`                              |
//! | `query`         | `graphql_query`                              |

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::domain::confirmation::{ConfirmationPolicy, ConfirmationTracker};
use crate::ports::{
    ArrayControl, AuditSink, NotificationStore, QueryPassthrough, UpsMonitor, VmControl,
};

use super::dispatcher::{DispatchError, ToolDispatcher};
use super::gate::ToolGate;
use super::tools::{
    ArrayStartTool, ArrayStopTool, GraphqlQueryTool, NotificationsTool, ParityCheckTool,
    UpsStatusTool, VmControlTool, VmCreateTool, VmDeleteTool, VmListTool, ARRAY_START, ARRAY_STOP,
    GRAPHQL_QUERY, NOTIFICATIONS, PARITY_CHECK, VM_CONTROL, VM_CREATE, VM_DELETE,
};

/// Host operation ports the tools call into.
#[derive(Clone)]
pub struct HostPorts {
    pub array: Arc<dyn ArrayControl>,
    pub vms: Arc<dyn VmControl>,
    pub notifications: Arc<dyn NotificationStore>,
    pub ups: Arc<dyn UpsMonitor>,
    pub query: Arc<dyn QueryPassthrough>,
}

impl HostPorts {
    /// Uses one adapter for every port.
    pub fn from_host<H>(host: Arc<H>) -> Self
    where
        H: ArrayControl + VmControl + NotificationStore + UpsMonitor + QueryPassthrough + 'static,
    {
        Self {
            array: host.clone(),
            vms: host.clone(),
            notifications: host.clone(),
            ups: host.clone(),
            query: host,
        }
    }
}

/// Gate settings applied to every group.
#[derive(Clone, Default)]
pub struct GateSettings {
    pub policy: ConfirmationPolicy,
    pub operation_timeout: Option<Duration>,
    pub audit: Option<Arc<dyn AuditSink>>,
}

/// The assembled dispatcher plus the trackers behind it.
#[derive(Debug)]
pub struct ToolCatalog {
    pub dispatcher: ToolDispatcher,
    trackers: Vec<Arc<ConfirmationTracker>>,
}

impl ToolCatalog {
    /// Registers every tool against `ports`.
    pub fn build(ports: &HostPorts, settings: &GateSettings) -> Result<Self, DispatchError> {
        let mut trackers = Vec::new();
        let mut gate_for = |scope: &str, tools: &[&str]| {
            let tracker = Arc::new(
                ConfirmationTracker::new(scope, tools.iter().copied()).with_policy(settings.policy),
            );
            trackers.push(tracker.clone());
            Arc::new(
                ToolGate::new(Some(tracker), settings.audit.clone())
                    .with_operation_timeout(settings.operation_timeout),
            )
        };

        let array = gate_for("array", &[ARRAY_START, ARRAY_STOP, PARITY_CHECK]);
        let vm = gate_for("vm", &[VM_CONTROL, VM_CREATE, VM_DELETE]);
        let notifications = gate_for("notifications", &[NOTIFICATIONS]);
        let query = gate_for("query", &[GRAPHQL_QUERY]);
        let open = Arc::new(
            ToolGate::ungated(settings.audit.clone())
                .with_operation_timeout(settings.operation_timeout),
        );

        let mut dispatcher = ToolDispatcher::new();
        dispatcher.register(ArrayStartTool::new(ports.array.clone()), array.clone())?;
        dispatcher.register(ArrayStopTool::new(ports.array.clone()), array.clone())?;
        dispatcher.register(ParityCheckTool::new(ports.array.clone()), array)?;
        dispatcher.register(VmListTool::new(ports.vms.clone()), open.clone())?;
        dispatcher.register(VmControlTool::new(ports.vms.clone()), vm.clone())?;
        dispatcher.register(VmCreateTool::new(ports.vms.clone()), vm.clone())?;
        dispatcher.register(VmDeleteTool::new(ports.vms.clone()), vm)?;
        dispatcher.register(NotificationsTool::new(ports.notifications.clone()), notifications)?;
        dispatcher.register(UpsStatusTool::new(ports.ups.clone()), open)?;
        dispatcher.register(GraphqlQueryTool::new(ports.query.clone()), query)?;

        Ok(Self {
            dispatcher,
            trackers,
        })
    }

    /// Trackers in registration order.
    pub fn trackers(&self) -> &[Arc<ConfirmationTracker>] {
        &self.trackers
    }

    /// Returns the tracker with the given scope.
    pub fn tracker(&self, scope: &str) -> Option<&Arc<ConfirmationTracker>> {
        self.trackers.iter().find(|t| t.scope() == scope)
    }

    /// Drops expired prompts from every tracker.
    pub fn purge_expired(&self) -> usize {
        self.trackers.iter().map(|t| t.purge_expired()).sum()
    }

    /// Purges expired prompts every `every` until the task is aborted.
    pub fn spawn_expiry_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let trackers = self.trackers.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let purged: usize = trackers.iter().map(|t| t.purge_expired()).sum();
                if purged > 0 {
                    debug!(purged, "purged expired confirmations");
                }
            }
        })
    }
}
