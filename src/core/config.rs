use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::workload::WorkloadKind;

/// `Configuration` holds everything a run needs: how to reach the
/// remote cluster and which knobs shape the submitted objects.
///
/// Values come from the credentials file, with `STACKUP_*`
/// environment variables layered on top (`STACKUP_CLUSTER__SERVER`
/// overrides `cluster.server`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Configuration {
    /// Cluster related configuration
    pub cluster: Cluster,
    /// Namespace every object of the run is created in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Which workload primitive create calls are issued against.
    #[serde(default)]
    pub workload_kind: WorkloadKind,
}

/// `Cluster` holds the configuration block at the key `cluster`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Cluster {
    /// The name of the cluster
    pub name: String,
    /// The endpoint of the cluster
    pub server: String,
    /// Optional bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

/// Credentials file errors; all of them abort the run before any
/// submission is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read the credentials file {path}: {source}")]
    Read {
        path: String,
        source: config::ConfigError,
    },
    #[error("credentials file {path} is malformed: {source}")]
    Parse {
        path: String,
        source: config::ConfigError,
    },
}

impl Configuration {
    /// Load the credentials file at `path`.
    ///
    /// The file is parsed as JSON regardless of its extension, so the
    /// conventional bare `./config` name works.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json))
            .add_source(
                Environment::with_prefix("STACKUP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;

        config
            .try_deserialize::<Configuration>()
            .map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            namespace: default_namespace(),
            workload_kind: WorkloadKind::default(),
        }
    }
}

impl Default for Cluster {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
            server: "http://127.0.0.1:8080".to_string(),
            token: None,
        }
    }
}
