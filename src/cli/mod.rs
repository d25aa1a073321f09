use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use prettytable::{row, Table};
use tracing::{info, warn};

use crate::core::client::Client;
use crate::core::config::Configuration;
use crate::core::get_display_table;
use crate::core::recipe::{Recipe, Runner, StepOutcome};

/// Stand up the three-tier demo stack on a cluster.
#[derive(Parser, Debug)]
#[clap(version, author)]
pub struct CommandLineInterface {
    /// Path to the cluster credentials file.
    #[clap(
        long,
        value_name = "PATH",
        default_value = "./config",
        env = "STACKUP_KUBECONFIG"
    )]
    pub kubeconfig: PathBuf,
}

impl CommandLineInterface {
    /// Loads the credentials, builds the client and submits every step
    /// of the demo recipe.
    ///
    /// Only credential or client failures bubble up as an error; step
    /// failures are reported in the outcome table and on the logs.
    #[tracing::instrument(name = "CommandLineInterface::handler", skip(self))]
    pub async fn handler(&self) -> Result<()> {
        let config = Configuration::load(&self.kubeconfig)?;
        let client = Client::init(&config)?;
        info!(
            cluster = %config.cluster.name,
            endpoint = %config.cluster.server,
            kind = %config.workload_kind,
            "submitting the demo stack"
        );

        let runner = Runner::new(config.namespace.clone(), Recipe::demo(config.workload_kind));
        let outcomes = runner.run(&client).await;

        let table = outcome_table(&outcomes);
        table.printstd();

        let failed = outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count();
        if failed > 0 {
            warn!("{failed} of {} steps were not accepted", outcomes.len());
        } else {
            info!("all {} steps were accepted", outcomes.len());
        }
        Ok(())
    }
}

fn outcome_table(outcomes: &[StepOutcome]) -> Table {
    let mut table = get_display_table();
    table.set_titles(row!["OBJECT", "NAME", "RESULT"]);
    if outcomes.is_empty() {
        table.add_row(row!["", "", ""]);
    }
    for outcome in outcomes {
        let result = match &outcome.result {
            Ok(()) => "created".to_string(),
            Err(err) => err.to_string(),
        };
        table.add_row(row![outcome.kind, outcome.name, result]);
    }
    table
}
