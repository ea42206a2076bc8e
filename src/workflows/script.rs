// Canned text the conductor "produces" during a simulated run

use super::types::AgentRole;

pub const RECEIVED: &str = "Conductor received request: Analyzing intent...";
pub const INTENT_IDENTIFIED: &str = "Intent identified: Multi-agent coordination required.";
pub const MERGING: &str = "Agents completed. Merging outputs...";
pub const COMPLETE: &str = "Workflow complete. Final response generated.";

/// The routing announcement, built from the agent labels so the two never drift
pub fn routing_announcement() -> String {
    let targets: Vec<String> = AgentRole::ALL
        .iter()
        .map(|role| format!("{} ({})", role.label(), role.provider()))
        .collect();
    format!("Routing to: {}", targets.join(", "))
}

/// Progress line an agent reports while processing
pub fn agent_report(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Infra => "Infra Agent: Processing architecture diagrams...",
        AgentRole::Security => "Compliance Agent: Verifying data residency requirements...",
        AgentRole::Cost => "Cost Agent: Calculating projected spend against budget...",
    }
}

pub const FINAL_OUTPUT: &str = "## Observability Platform Implementation Plan

### 1. Architecture (Infra Agent)
- **Core:** Prometheus + Grafana stack on EKS.
- **Storage:** Amazon Managed Service for Prometheus (AMP).
- **Ingestion:** Fluent Bit sidecars for log forwarding.

### 2. Security & Compliance (Compliance Agent)
- **Data Residency:** All logs must stay within us-east-1 (Internal Policy #882).
- **Encryption:** KMS integration required for all at-rest data.
- **Access:** RBAC mapped to internal AD groups.

### 3. Cost Analysis (Cost Agent)
- **Estimated Monthly Cost:** $1,250 (based on current Salesforce volume).
- **Optimization:** Use Spot Instances for worker nodes to reduce compute costs by 40%.
";
