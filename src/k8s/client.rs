/// kubectl client invocation
use tracing::{debug, info};

use super::models::{ClientVersion, VersionInfo};
use crate::error::ValidationError;
use crate::utils::command::CommandBuilder;

/// Arguments that make kubectl report its own version without contacting a cluster
const VERSION_ARGS: [&str; 4] = ["version", "--client", "-o", "json"];

/// Runs the locally installed kubectl
#[derive(Debug, Clone)]
pub struct KubectlClient {
    binary: String,
}

impl KubectlClient {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Platform-specific name of the kubectl executable
    pub fn default_binary() -> String {
        format!("kubectl{}", std::env::consts::EXE_SUFFIX)
    }

    fn version_command(&self) -> CommandBuilder {
        CommandBuilder::new(&self.binary)
            .args(VERSION_ARGS)
            .context(format!("Failed to run {}", self.binary))
    }

    /// Query the installed client's version report
    ///
    /// Any failure to spawn, a non-zero exit, or output that does not match
    /// the expected JSON shape is reported as [`ValidationError::ClientNotInstalled`].
    pub async fn client_version(&self) -> Result<ClientVersion, ValidationError> {
        let command = self.version_command();
        info!("{}", command.command_line());

        let stdout = command
            .run()
            .await
            .map_err(|e| self.not_installed(format!("{:#}", e)))?;

        let report: VersionInfo = serde_json::from_str(&stdout)
            .map_err(|e| self.not_installed(format!("unexpected version output: {}", e)))?;

        let client = report.client_version;
        info!("installed version: {}", client.git_version);
        debug!("{}", describe_build(&client, report.kustomize_version.as_deref()));

        Ok(client)
    }

    fn not_installed(&self, reason: String) -> ValidationError {
        ValidationError::ClientNotInstalled {
            binary: self.binary.clone(),
            reason,
        }
    }
}

/// One-line summary of the optional build fields in a version report
fn describe_build(client: &ClientVersion, kustomize_version: Option<&str>) -> String {
    let field = |value: Option<&str>| value.unwrap_or("unknown").to_string();
    format!(
        "client build: major={} minor={} platform={} commit={} built={} go={} kustomize={}",
        field(client.major.as_deref()),
        field(client.minor.as_deref()),
        field(client.platform.as_deref()),
        field(client.git_commit.as_deref()),
        field(client.build_date.as_deref()),
        field(client.go_version.as_deref()),
        field(kustomize_version),
    )
}
