//! Virtual machine tools: `vm_list`, `vm_control`, `vm_create`, `vm_delete`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::{OperationError, ValidationError};
use crate::domain::tools::ToolParameters;
use crate::ports::{
    ConfirmationPrompt, GatedTool, OperationContext, ToolOutput, VmAction, VmControl, VmSpec,
};

pub const VM_LIST: &str = "vm_list";
pub const VM_CONTROL: &str = "vm_control";
pub const VM_CREATE: &str = "vm_create";
pub const VM_DELETE: &str = "vm_delete";

pub const DEFAULT_MEMORY_MIB: u64 = 2_048;
pub const DEFAULT_VCPUS: u32 = 2;

const MEMORY_MIB_RANGE: (u64, u64) = (128, 1_048_576);
const VCPU_RANGE: (u64, u64) = (1, 64);
const MAX_NAME_LEN: usize = 64;

// ═══════════════════════════════════════════════════════════════════════
// vm_list
// ═══════════════════════════════════════════════════════════════════════

pub struct VmListTool {
    vms: Arc<dyn VmControl>,
}

impl VmListTool {
    pub fn new(vms: Arc<dyn VmControl>) -> Self {
        Self { vms }
    }
}

#[async_trait]
impl GatedTool for VmListTool {
    type Request = ();

    fn name(&self) -> &'static str {
        VM_LIST
    }

    fn validate(&self, _params: &ToolParameters) -> Result<(), ValidationError> {
        Ok(())
    }

    fn is_destructive(&self, _request: &()) -> bool {
        false
    }

    fn describe_for_prompt(&self, _request: &()) -> ConfirmationPrompt {
        ConfirmationPrompt::new("vms", "Lists virtual machines.")
    }

    async fn execute(&self, _request: &(), _ctx: &OperationContext) -> Result<ToolOutput, OperationError> {
        let vms = self.vms.list_vms().await?;
        let summary = vms
            .iter()
            .map(|vm| format!("{} ({}): {}", vm.name, vm.id, vm.state))
            .collect::<Vec<_>>();
        let message = if summary.is_empty() {
            "No virtual machines.".to_string()
        } else {
            summary.join("\n")
        };
        Ok(ToolOutput::new(message).with_data(json!(vms)))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// vm_control
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmControlRequest {
    pub vm_id: String,
    pub action: VmAction,
}

pub struct VmControlTool {
    vms: Arc<dyn VmControl>,
}

impl VmControlTool {
    pub fn new(vms: Arc<dyn VmControl>) -> Self {
        Self { vms }
    }
}

#[async_trait]
impl GatedTool for VmControlTool {
    type Request = VmControlRequest;

    fn name(&self) -> &'static str {
        VM_CONTROL
    }

    fn validate(&self, params: &ToolParameters) -> Result<VmControlRequest, ValidationError> {
        let vm_id = params.required_str("vm_id")?.to_string();
        let action = params.required_str("action")?;
        let action = VmAction::parse(action).ok_or_else(|| {
            let allowed: Vec<&str> = VmAction::ALL.iter().map(VmAction::as_str).collect();
            ValidationError::invalid_choice("action", action, &allowed)
        })?;
        Ok(VmControlRequest { vm_id, action })
    }

    fn is_destructive(&self, request: &VmControlRequest) -> bool {
        request.action.interrupts_guest()
    }

    fn describe_for_prompt(&self, request: &VmControlRequest) -> ConfirmationPrompt {
        let description = match request.action {
            VmAction::Stop => "Sends an ACPI shutdown to the guest.",
            VmAction::ForceStop => "Powers the guest off immediately. Unsaved guest data is lost.",
            VmAction::Reboot => "Restarts the guest.",
            VmAction::Start => "Starts the guest.",
            VmAction::Pause => "Suspends the guest in memory.",
            VmAction::Resume => "Resumes the suspended guest.",
        };
        ConfirmationPrompt::new(format!("vm {}", request.vm_id), description)
    }

    async fn execute(
        &self,
        request: &VmControlRequest,
        _ctx: &OperationContext,
    ) -> Result<ToolOutput, OperationError> {
        let vm = self.vms.control_vm(&request.vm_id, request.action).await?;
        Ok(
            ToolOutput::new(format!("VM {} ({}) is now {}.", vm.name, vm.id, vm.state))
                .with_data(json!(vm)),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
// vm_create
// ═══════════════════════════════════════════════════════════════════════

pub struct VmCreateTool {
    vms: Arc<dyn VmControl>,
}

impl VmCreateTool {
    pub fn new(vms: Arc<dyn VmControl>) -> Self {
        Self { vms }
    }
}

fn bounded(
    params: &ToolParameters,
    field: &str,
    default: u64,
    (min, max): (u64, u64),
) -> Result<u64, ValidationError> {
    let value = params.optional_u64(field)?.unwrap_or(default);
    if value < min || value > max {
        let clamp = |v: u64| i64::try_from(v).unwrap_or(i64::MAX);
        return Err(ValidationError::out_of_range(field, clamp(min), clamp(max), clamp(value)));
    }
    Ok(value)
}

#[async_trait]
impl GatedTool for VmCreateTool {
    type Request = VmSpec;

    fn name(&self) -> &'static str {
        VM_CREATE
    }

    fn validate(&self, params: &ToolParameters) -> Result<VmSpec, ValidationError> {
        let name = params.required_str("name")?;
        if name.len() > MAX_NAME_LEN {
            return Err(ValidationError::invalid_format(
                "name",
                format!("at most {MAX_NAME_LEN} characters"),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ValidationError::invalid_format(
                "name",
                "only letters, digits, '-', '_' and '.' are allowed",
            ));
        }
        let memory_mib = bounded(params, "memory_mib", DEFAULT_MEMORY_MIB, MEMORY_MIB_RANGE)?;
        let vcpus = bounded(params, "vcpus", u64::from(DEFAULT_VCPUS), VCPU_RANGE)?;
        Ok(VmSpec {
            name: name.to_string(),
            memory_mib,
            // bounded above by VCPU_RANGE
            vcpus: u32::try_from(vcpus).unwrap_or(DEFAULT_VCPUS),
        })
    }

    fn is_destructive(&self, _request: &VmSpec) -> bool {
        true
    }

    fn describe_for_prompt(&self, spec: &VmSpec) -> ConfirmationPrompt {
        ConfirmationPrompt::new(
            format!("vm {}", spec.name),
            format!(
                "Creates VM '{}' with {} MiB memory and {} vCPUs, allocating a new disk image.",
                spec.name, spec.memory_mib, spec.vcpus
            ),
        )
    }

    async fn execute(&self, spec: &VmSpec, _ctx: &OperationContext) -> Result<ToolOutput, OperationError> {
        let vm = self.vms.create_vm(spec).await?;
        Ok(ToolOutput::new(format!("Created VM {} ({}).", vm.name, vm.id)).with_data(json!(vm)))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// vm_delete
// ═══════════════════════════════════════════════════════════════════════

pub struct VmDeleteTool {
    vms: Arc<dyn VmControl>,
}

impl VmDeleteTool {
    pub fn new(vms: Arc<dyn VmControl>) -> Self {
        Self { vms }
    }
}

#[async_trait]
impl GatedTool for VmDeleteTool {
    /// The VM id.
    type Request = String;

    fn name(&self) -> &'static str {
        VM_DELETE
    }

    fn validate(&self, params: &ToolParameters) -> Result<String, ValidationError> {
        Ok(params.required_str("vm_id")?.to_string())
    }

    fn is_destructive(&self, _vm_id: &String) -> bool {
        true
    }

    fn describe_for_prompt(&self, vm_id: &String) -> ConfirmationPrompt {
        ConfirmationPrompt::new(
            format!("vm {vm_id}"),
            "Deletes the VM and its disk images. This cannot be undone.",
        )
    }

    async fn execute(&self, vm_id: &String, _ctx: &OperationContext) -> Result<ToolOutput, OperationError> {
        self.vms.delete_vm(vm_id).await?;
        Ok(ToolOutput::new(format!("Deleted VM {vm_id}.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::simulated::SimulatedHost;
    use crate::ports::VmState;

    fn host() -> Arc<SimulatedHost> {
        Arc::new(SimulatedHost::seeded())
    }

    fn params(value: serde_json::Value) -> ToolParameters {
        ToolParameters::from_value(value).unwrap()
    }

    #[test]
    fn control_gates_only_interrupting_actions() {
        let tool = VmControlTool::new(host());

        let stop = tool
            .validate(&params(json!({ "vm_id": "vm-1", "action": "force_stop" })))
            .unwrap();
        let pause = tool
            .validate(&params(json!({ "vm_id": "vm-1", "action": "pause" })))
            .unwrap();

        assert!(tool.is_destructive(&stop));
        assert!(!tool.is_destructive(&pause));
        assert_eq!(tool.describe_for_prompt(&stop).resource_label, "vm vm-1");
    }

    #[test]
    fn control_rejects_unknown_action() {
        let err = VmControlTool::new(host())
            .validate(&params(json!({ "vm_id": "vm-1", "action": "hibernate" })))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidChoice { .. }));
    }

    #[test]
    fn create_applies_defaults_and_bounds() {
        let tool = VmCreateTool::new(host());

        let spec = tool.validate(&params(json!({ "name": "pihole" }))).unwrap();
        assert_eq!(spec.memory_mib, DEFAULT_MEMORY_MIB);
        assert_eq!(spec.vcpus, DEFAULT_VCPUS);

        let err = tool
            .validate(&params(json!({ "name": "big", "vcpus": 128 })))
            .unwrap_err();
        assert_eq!(err, ValidationError::out_of_range("vcpus", 1, 64, 128));

        assert!(tool.validate(&params(json!({ "name": "bad name!" }))).is_err());
        assert!(tool.validate(&params(json!({ "name": "x".repeat(65) }))).is_err());
    }

    #[tokio::test]
    async fn list_summarises_each_vm() {
        let output = VmListTool::new(host())
            .execute(&(), &OperationContext::new())
            .await
            .unwrap();

        assert!(output.message.contains("home-assistant (vm-1): running"));
        assert_eq!(output.data.unwrap().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn control_then_delete() {
        let host = host();
        let ctx = OperationContext::new();

        VmControlTool::new(host.clone())
            .execute(
                &VmControlRequest {
                    vm_id: "vm-1".to_string(),
                    action: VmAction::Stop,
                },
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(host.vm("vm-1").await.unwrap().state, VmState::Stopped);

        let output = VmDeleteTool::new(host.clone())
            .execute(&"vm-1".to_string(), &ctx)
            .await
            .unwrap();
        assert_eq!(output.message, "Deleted VM vm-1.");
    }
}
