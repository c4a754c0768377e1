/// Models for `kubectl version --client -o json`
use serde::Deserialize;

/// Top-level version report
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub client_version: ClientVersion,
    #[serde(default)]
    pub kustomize_version: Option<String>,
}

/// Client build information
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientVersion {
    pub git_version: String,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub minor: Option<String>,
    #[serde(default)]
    pub git_commit: Option<String>,
    #[serde(default)]
    pub build_date: Option<String>,
    #[serde(default)]
    pub go_version: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}
