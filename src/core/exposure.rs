use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::manifest::{self, IntOrString, Service};

/// How broadly the endpoint is reachable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExposureMode {
    /// Cluster-internal routing only; the wire object omits the
    /// service type so the orchestrator default applies.
    #[default]
    Internal,
    /// Ask the orchestration layer to provision an external load
    /// balancer in front of the selected pods.
    LoadBalanced,
}

/// Target of the single port rule: either a numeric container port or
/// the name a container gave its port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TargetPort {
    Number(u16),
    Name(String),
}

/// A network endpoint routing one port to the pods selected by label.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExposureSpec {
    pub name: String,
    /// Must equal the paired workload's label set.
    pub selector: BTreeMap<String, String>,
    pub port: u16,
    pub target_port: TargetPort,
    #[serde(default)]
    pub mode: ExposureMode,
}

impl ExposureSpec {
    /// Build the service create payload.
    pub fn to_manifest(&self) -> Service {
        Service {
            api_version: "v1".to_string(),
            kind: "Service".to_string(),
            metadata: manifest::ObjectMeta {
                name: Some(self.name.clone()),
                labels: Some(self.selector.clone()),
            },
            spec: manifest::ServiceSpec {
                ports: vec![manifest::ServicePort {
                    port: i32::from(self.port),
                    target_port: match &self.target_port {
                        TargetPort::Number(port) => IntOrString::Int(i32::from(*port)),
                        TargetPort::Name(name) => IntOrString::Str(name.clone()),
                    },
                }],
                selector: self.selector.clone(),
                service_type: match self.mode {
                    ExposureMode::Internal => None,
                    ExposureMode::LoadBalanced => Some("LoadBalancer".to_string()),
                },
            },
        }
    }
}
