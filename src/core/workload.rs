use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::core::manifest::{self, WorkloadManifest};

/// Which workload primitive create calls are issued against.
///
/// Both make the orchestrator keep the requested replica count
/// running; the deployment primitive additionally supports
/// declarative rolling updates, which this tool does not exercise.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    ReplicationController,
    #[default]
    Deployment,
}

impl Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadKind::ReplicationController => write!(f, "replication-controller"),
            WorkloadKind::Deployment => write!(f, "deployment"),
        }
    }
}

/// One replicated workload: keep `replicas` copies of a single
/// container running, exposing one named port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: String,
    /// Applied to the workload and to every pod it owns; the paired
    /// exposure selector must carry the same set or routing breaks.
    pub labels: BTreeMap<String, String>,
    pub replicas: u16,
    pub container: ContainerSpec,
}

/// The single container a workload runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub port_name: String,
    pub port: u16,
}

impl WorkloadSpec {
    /// Build the create payload in the shape of the requested
    /// primitive.
    pub fn to_manifest(&self, kind: WorkloadKind) -> WorkloadManifest {
        match kind {
            WorkloadKind::ReplicationController => {
                WorkloadManifest::ReplicationController(manifest::ReplicationController {
                    api_version: "v1".to_string(),
                    kind: "ReplicationController".to_string(),
                    metadata: self.metadata(),
                    spec: manifest::ReplicationControllerSpec {
                        replicas: i32::from(self.replicas),
                        selector: self.labels.clone(),
                        template: self.pod_template(),
                    },
                })
            }
            WorkloadKind::Deployment => WorkloadManifest::Deployment(manifest::Deployment {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
                metadata: self.metadata(),
                spec: manifest::DeploymentSpec {
                    replicas: i32::from(self.replicas),
                    selector: manifest::LabelSelector {
                        match_labels: self.labels.clone(),
                    },
                    template: self.pod_template(),
                },
            }),
        }
    }

    fn metadata(&self) -> manifest::ObjectMeta {
        manifest::ObjectMeta {
            name: Some(self.name.clone()),
            labels: Some(self.labels.clone()),
        }
    }

    fn pod_template(&self) -> manifest::PodTemplateSpec {
        manifest::PodTemplateSpec {
            metadata: manifest::ObjectMeta {
                name: None,
                labels: Some(self.labels.clone()),
            },
            spec: manifest::PodSpec {
                containers: vec![manifest::Container {
                    name: self.container.name.clone(),
                    image: self.container.image.clone(),
                    ports: vec![manifest::ContainerPort {
                        name: Some(self.container.port_name.clone()),
                        container_port: i32::from(self.container.port),
                    }],
                }],
            },
        }
    }
}
