//! Loads the files a run uploads and assembles the plan.

use std::path::{Path, PathBuf};

use saga::{CollaborationSpec, SecretUpload, SmokeTestPlan};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

async fn read(path: &Path) -> Result<Vec<u8>, InputError> {
    tokio::fs::read(path).await.map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the MPC program, the cluster config and the CSV input, and
/// combines them with the configured names and policy.
pub async fn load_plan(config: &Config) -> Result<SmokeTestPlan, InputError> {
    let mut collaboration = CollaborationSpec::new(
        read(&config.mpc_program_path).await?,
        read(&config.cs_config_path).await?,
    );
    collaboration.name = config.collaboration_name.clone();
    collaboration.csv_header_line = config.csv_header_line.clone();
    collaboration.number_of_parties = config.number_of_parties;

    let secret = SecretUpload::new(read(&config.test_data_path).await?);
    tracing::debug!(
        program_bytes = collaboration.mpc_program.len(),
        secret_bytes = secret.data_csv.len(),
        "inputs loaded"
    );

    Ok(SmokeTestPlan {
        collaboration,
        secret,
        party: config.party,
        callback_url: config.callback_url.clone(),
        notification: config.notification_policy(),
    })
}
