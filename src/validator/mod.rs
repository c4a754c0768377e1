/// Installed kubectl version validation
pub mod expression;

use tracing::{info, warn};

pub use expression::{VersionExpression, VersionTarget};

use crate::config::ValidatorConfig;
use crate::error::ValidationError;
use crate::k8s::KubectlClient;
use crate::release::StableVersionResolver;

/// Result of a completed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub passed: bool,
    pub message: String,
}

impl Outcome {
    fn passed() -> Self {
        Self {
            passed: true,
            message: "Test passed".to_string(),
        }
    }

    fn failed(expression: &VersionExpression) -> Self {
        Self {
            passed: false,
            message: format!("Setting up of {} kubectl failed", expression),
        }
    }
}

/// Exact matches require equality, negated matches require inequality
pub fn satisfies(installed: &str, target: &str, negated: bool) -> bool {
    (installed == target) != negated
}

/// Compares the installed kubectl against a version expression
pub struct Validator {
    kubectl: KubectlClient,
    resolver: StableVersionResolver,
}

impl Validator {
    pub fn new(kubectl: KubectlClient, resolver: StableVersionResolver) -> Self {
        Self { kubectl, resolver }
    }

    pub fn from_config(config: &ValidatorConfig) -> anyhow::Result<Self> {
        let resolver = StableVersionResolver::new(
            config.stable_url.clone(),
            config.retry.policy(),
            config.http_timeout(),
        )?;
        Ok(Self::new(KubectlClient::new(config.kubectl.clone()), resolver))
    }

    /// Validate the installed client against `expression`
    ///
    /// Returns `Err` only when the client is not installed. Every other
    /// problem is logged and yields a failed [`Outcome`].
    pub async fn run(&self, expression: &VersionExpression) -> Result<Outcome, ValidationError> {
        let installed = self.kubectl.client_version().await?;

        let passed = match self.evaluate(&installed.git_version, expression).await {
            Ok(passed) => passed,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("{}", e);
                false
            }
        };

        if passed {
            Ok(Outcome::passed())
        } else {
            Ok(Outcome::failed(expression))
        }
    }

    async fn evaluate(
        &self,
        installed: &str,
        expression: &VersionExpression,
    ) -> Result<bool, ValidationError> {
        match expression {
            VersionExpression::Negated(undesired) => {
                info!("undesired version: {}", undesired);
                ensure_comparable(undesired)?;

                let passed = satisfies(installed, undesired, true);
                if !passed {
                    info!(
                        "installed version ({}) matches undesired {} - FAIL",
                        installed, undesired
                    );
                }
                Ok(passed)
            }
            VersionExpression::Exact(target) => {
                let desired = match target {
                    VersionTarget::Latest => self
                        .resolver
                        .resolve_latest()
                        .await
                        .map_err(ValidationError::Resolution)?,
                    VersionTarget::Literal(version) => version.clone(),
                };
                info!("desired version: {}", desired);
                ensure_comparable(&desired)?;

                let passed = satisfies(installed, &desired, false);
                if !passed {
                    info!(
                        "installed version ({}) does not match desired ({}) - FAIL",
                        installed, desired
                    );
                }
                Ok(passed)
            }
        }
    }
}

fn ensure_comparable(target: &str) -> Result<(), ValidationError> {
    if target.is_empty() {
        return Err(ValidationError::Comparison {
            reason: "target version is empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::retry::RetryPolicy;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn resolver_for(url: &str) -> StableVersionResolver {
        StableVersionResolver::new(
            url,
            RetryPolicy::new(2, Duration::from_millis(1)),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn offline_validator() -> Validator {
        Validator::new(
            KubectlClient::new("kubectl"),
            resolver_for("http://127.0.0.1:9/stable.txt"),
        )
    }

    fn expr(raw: &str) -> VersionExpression {
        raw.parse().unwrap()
    }

    #[test]
    fn test_satisfies() {
        assert!(satisfies("v1.29.2", "v1.29.2", false));
        assert!(!satisfies("v1.29.2", "v1.30.0", false));
        assert!(satisfies("v1.29.2", "v1.30.0", true));
        assert!(!satisfies("v1.29.2", "v1.29.2", true));
        assert!(!satisfies("v1.29.2", "V1.29.2", false));
    }

    #[test]
    fn test_failure_message_names_expression() {
        let outcome = Outcome::failed(&expr("v1.30.0"));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("v1.30.0"));
    }

    #[tokio::test]
    async fn test_literal_expressions() {
        let validator = offline_validator();

        assert!(validator.evaluate("v1.29.2", &expr("v1.29.2")).await.unwrap());
        assert!(!validator.evaluate("v1.29.2", &expr("v1.30.0")).await.unwrap());
        assert!(validator.evaluate("v1.29.2", &expr("!v1.30.0")).await.unwrap());
        assert!(!validator.evaluate("v1.29.2", &expr("!v1.29.2")).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_negated_target_cannot_be_compared() {
        let err = offline_validator()
            .evaluate("v1.29.2", &expr("!"))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::Comparison { .. }));
    }

    #[tokio::test]
    async fn test_latest_resolution_failure_is_not_fatal() {
        let err = offline_validator()
            .evaluate("v1.29.2", &expr("latest"))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::Resolution(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_latest_matches_stable_pointer() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/stable.txt");
                then.status(200).body("v1.30.1\n");
            })
            .await;

        let validator = Validator::new(
            KubectlClient::new("kubectl"),
            resolver_for(&server.url("/stable.txt")),
        );

        assert!(validator.evaluate("v1.30.1", &expr("latest")).await.unwrap());
        assert!(!validator.evaluate("v1.29.2", &expr("latest")).await.unwrap());
    }

    #[tokio::test]
    async fn test_run_without_client_is_fatal() {
        let validator = Validator::new(
            KubectlClient::new("/nonexistent/kubectl"),
            resolver_for("http://127.0.0.1:9/stable.txt"),
        );

        let err = validator.run(&expr("v1.29.2")).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let kubectl = crate::k8s::client::tests::kubectl_reporting(dir.path(), "v1.29.2");
        let validator = Validator::new(
            KubectlClient::new(kubectl.to_string_lossy()),
            resolver_for("http://127.0.0.1:9/stable.txt"),
        );

        let outcome = validator.run(&expr("v1.29.2")).await.unwrap();
        assert_eq!(outcome, Outcome::passed());

        let outcome = validator.run(&expr("!v1.29.2")).await.unwrap();
        assert!(!outcome.passed);
        assert!(outcome.message.contains("!v1.29.2"));

        // Resolution errors collapse into an ordinary failure.
        let outcome = validator.run(&expr("latest")).await.unwrap();
        assert!(!outcome.passed);
        assert!(outcome.message.contains("latest"));
    }
}
