use std::collections::BTreeMap;
use std::fmt::Display;

use tracing::{error, info};

use crate::core::client::{SubmissionError, Submitter};
use crate::core::exposure::{ExposureMode, ExposureSpec, TargetPort};
use crate::core::workload::{ContainerSpec, WorkloadKind, WorkloadSpec};

/// One application tier: a workload and the endpoint exposing it.
///
/// Both halves are built from the same label set so the exposure
/// selector always matches the workload's pods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub workload: WorkloadSpec,
    pub exposure: ExposureSpec,
}

/// The ordered list of tiers a run submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub tiers: Vec<Tier>,
}

impl Recipe {
    /// The built-in three-tier demo stack: a key-value store primary,
    /// its replicas, and the web front end.
    pub fn demo(kind: WorkloadKind) -> Self {
        let primary_labels = labels(&[("app", "store"), ("role", "primary")]);
        let replica_labels = labels(&[("app", "store"), ("role", "replica")]);
        let frontend_labels = labels(&[("app", "frontend")]);

        let replica_count = match kind {
            WorkloadKind::ReplicationController => 3,
            WorkloadKind::Deployment => 2,
        };

        Self {
            tiers: vec![
                Tier {
                    workload: WorkloadSpec {
                        name: "primary".to_string(),
                        labels: primary_labels.clone(),
                        replicas: 1,
                        container: ContainerSpec {
                            name: "primary".to_string(),
                            image: "store-primary-image".to_string(),
                            port_name: "store-server".to_string(),
                            port: 6379,
                        },
                    },
                    exposure: ExposureSpec {
                        name: "primary".to_string(),
                        selector: primary_labels,
                        port: 6379,
                        target_port: TargetPort::Name("store-server".to_string()),
                        mode: ExposureMode::Internal,
                    },
                },
                Tier {
                    workload: WorkloadSpec {
                        name: "replica".to_string(),
                        labels: replica_labels.clone(),
                        replicas: replica_count,
                        container: ContainerSpec {
                            name: "replica".to_string(),
                            image: "store-replica-image".to_string(),
                            port_name: "store-server".to_string(),
                            port: 6379,
                        },
                    },
                    exposure: ExposureSpec {
                        name: "replica".to_string(),
                        selector: replica_labels,
                        port: 6379,
                        target_port: TargetPort::Name("store-server".to_string()),
                        mode: ExposureMode::Internal,
                    },
                },
                Tier {
                    workload: WorkloadSpec {
                        name: "frontend".to_string(),
                        labels: frontend_labels.clone(),
                        replicas: 3,
                        container: ContainerSpec {
                            name: "frontend".to_string(),
                            image: "web-frontend-image".to_string(),
                            port_name: "http-server".to_string(),
                            port: 3000,
                        },
                    },
                    exposure: ExposureSpec {
                        name: "frontend".to_string(),
                        selector: frontend_labels,
                        port: 3000,
                        target_port: TargetPort::Name("http-server".to_string()),
                        mode: ExposureMode::LoadBalanced,
                    },
                },
            ],
        }
    }
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Which half of a tier a step submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Workload,
    Exposure,
}

impl Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::Workload => write!(f, "workload"),
            StepKind::Exposure => write!(f, "exposure"),
        }
    }
}

/// The recorded result of one submission step.
#[derive(Debug)]
pub struct StepOutcome {
    pub kind: StepKind,
    pub name: String,
    pub result: Result<(), SubmissionError>,
}

impl StepOutcome {
    fn record(kind: StepKind, name: &str, result: Result<(), SubmissionError>) -> Self {
        if let Err(err) = &result {
            error!("{err}");
        }
        Self {
            kind,
            name: name.to_string(),
            result,
        }
    }
}

/// Executes a recipe strictly in order, one blocking call at a time.
///
/// Failed steps are logged and recorded; the run never short-circuits
/// and always attempts every step.
#[derive(Debug)]
pub struct Runner {
    namespace: String,
    recipe: Recipe,
}

impl Runner {
    pub fn new(namespace: impl Into<String>, recipe: Recipe) -> Self {
        Self {
            namespace: namespace.into(),
            recipe,
        }
    }

    #[tracing::instrument(name = "Runner::run", skip_all)]
    pub async fn run(&self, client: &dyn Submitter) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(self.recipe.tiers.len() * 2);

        for tier in &self.recipe.tiers {
            info!(workload = %tier.workload.name, "creating workload");
            let result = client.submit_workload(&self.namespace, &tier.workload).await;
            outcomes.push(StepOutcome::record(
                StepKind::Workload,
                &tier.workload.name,
                result,
            ));

            info!(exposure = %tier.exposure.name, "creating exposure");
            let result = client.submit_exposure(&self.namespace, &tier.exposure).await;
            outcomes.push(StepOutcome::record(
                StepKind::Exposure,
                &tier.exposure.name,
                result,
            ));
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::ApiError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use rstest::rstest;
    use std::sync::Mutex;

    enum Behavior {
        AcceptAll,
        RejectAll,
        RejectWorkload(&'static str),
    }

    struct RecordingSubmitter {
        behavior: Behavior,
        calls: Mutex<Vec<(StepKind, String, String)>>,
    }

    impl RecordingSubmitter {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(StepKind, String, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn rejection(kind: StepKind, name: &str) -> SubmissionError {
            let source = ApiError::Rejected {
                status: StatusCode::CONFLICT,
                message: "object already exists".to_string(),
            };
            match kind {
                StepKind::Workload => SubmissionError::Workload {
                    name: name.to_string(),
                    source,
                },
                StepKind::Exposure => SubmissionError::Exposure {
                    name: name.to_string(),
                    source,
                },
            }
        }
    }

    #[async_trait]
    impl Submitter for RecordingSubmitter {
        async fn submit_workload(
            &self,
            namespace: &str,
            workload: &WorkloadSpec,
        ) -> Result<(), SubmissionError> {
            self.calls.lock().unwrap().push((
                StepKind::Workload,
                workload.name.clone(),
                namespace.to_string(),
            ));
            match &self.behavior {
                Behavior::RejectAll => Err(Self::rejection(StepKind::Workload, &workload.name)),
                Behavior::RejectWorkload(name) if *name == workload.name => {
                    Err(Self::rejection(StepKind::Workload, &workload.name))
                }
                _ => Ok(()),
            }
        }

        async fn submit_exposure(
            &self,
            namespace: &str,
            exposure: &ExposureSpec,
        ) -> Result<(), SubmissionError> {
            self.calls.lock().unwrap().push((
                StepKind::Exposure,
                exposure.name.clone(),
                namespace.to_string(),
            ));
            match &self.behavior {
                Behavior::RejectAll => Err(Self::rejection(StepKind::Exposure, &exposure.name)),
                _ => Ok(()),
            }
        }
    }

    #[rstest]
    #[case::replication_controller(WorkloadKind::ReplicationController)]
    #[case::deployment(WorkloadKind::Deployment)]
    fn every_tier_shares_its_labels_with_its_exposure(#[case] kind: WorkloadKind) {
        let recipe = Recipe::demo(kind);
        assert_eq!(recipe.tiers.len(), 3);
        for tier in &recipe.tiers {
            assert!(!tier.workload.labels.is_empty());
            assert_eq!(tier.workload.labels, tier.exposure.selector);
        }
    }

    #[test]
    fn demo_recipe_describes_the_three_tier_stack() {
        let recipe = Recipe::demo(WorkloadKind::Deployment);

        let names: Vec<&str> = recipe
            .tiers
            .iter()
            .map(|tier| tier.workload.name.as_str())
            .collect();
        assert_eq!(names, vec!["primary", "replica", "frontend"]);

        let replicas: Vec<u16> = recipe
            .tiers
            .iter()
            .map(|tier| tier.workload.replicas)
            .collect();
        assert_eq!(replicas, vec![1, 2, 3]);

        let images: Vec<&str> = recipe
            .tiers
            .iter()
            .map(|tier| tier.workload.container.image.as_str())
            .collect();
        assert_eq!(
            images,
            vec![
                "store-primary-image",
                "store-replica-image",
                "web-frontend-image"
            ]
        );

        assert_eq!(recipe.tiers[0].exposure.port, 6379);
        assert_eq!(
            recipe.tiers[0].exposure.target_port,
            TargetPort::Name("store-server".to_string())
        );
        assert_eq!(recipe.tiers[2].exposure.port, 3000);
        assert_eq!(
            recipe.tiers[2].exposure.target_port,
            TargetPort::Name("http-server".to_string())
        );
    }

    #[test]
    fn only_the_frontend_is_load_balanced() {
        let recipe = Recipe::demo(WorkloadKind::Deployment);
        let modes: Vec<ExposureMode> = recipe
            .tiers
            .iter()
            .map(|tier| tier.exposure.mode)
            .collect();
        assert_eq!(
            modes,
            vec![
                ExposureMode::Internal,
                ExposureMode::Internal,
                ExposureMode::LoadBalanced
            ]
        );
    }

    #[test]
    fn replica_count_follows_the_workload_kind() {
        let rc = Recipe::demo(WorkloadKind::ReplicationController);
        assert_eq!(rc.tiers[1].workload.replicas, 3);

        let deployment = Recipe::demo(WorkloadKind::Deployment);
        assert_eq!(deployment.tiers[1].workload.replicas, 2);
    }

    #[tokio::test]
    async fn run_attempts_every_step_even_when_all_fail() {
        let submitter = RecordingSubmitter::new(Behavior::RejectAll);
        let runner = Runner::new("default", Recipe::demo(WorkloadKind::Deployment));

        let outcomes = runner.run(&submitter).await;

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(|outcome| outcome.result.is_err()));
        assert_eq!(submitter.calls().len(), 6);
    }

    #[tokio::test]
    async fn run_records_steps_in_submission_order() {
        let submitter = RecordingSubmitter::new(Behavior::AcceptAll);
        let runner = Runner::new("staging", Recipe::demo(WorkloadKind::Deployment));

        let outcomes = runner.run(&submitter).await;

        let steps: Vec<(StepKind, &str)> = outcomes
            .iter()
            .map(|outcome| (outcome.kind, outcome.name.as_str()))
            .collect();
        assert_eq!(
            steps,
            vec![
                (StepKind::Workload, "primary"),
                (StepKind::Exposure, "primary"),
                (StepKind::Workload, "replica"),
                (StepKind::Exposure, "replica"),
                (StepKind::Workload, "frontend"),
                (StepKind::Exposure, "frontend"),
            ]
        );
        assert!(outcomes.iter().all(|outcome| outcome.result.is_ok()));
        assert!(submitter
            .calls()
            .iter()
            .all(|(_, _, namespace)| namespace == "staging"));
    }

    #[tokio::test]
    async fn a_failing_first_workload_does_not_stop_the_run() {
        let submitter = RecordingSubmitter::new(Behavior::RejectWorkload("primary"));
        let runner = Runner::new("default", Recipe::demo(WorkloadKind::Deployment));

        let outcomes = runner.run(&submitter).await;

        assert_eq!(outcomes.len(), 6);
        assert_eq!(submitter.calls().len(), 6);
        assert!(outcomes[0].result.is_err());
        assert!(outcomes[1..]
            .iter()
            .all(|outcome| outcome.result.is_ok()));
    }
}
