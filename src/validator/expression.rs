/// Version expressions accepted on the command line
use std::fmt;
use std::str::FromStr;

/// Keyword that resolves to the current stable release
pub const LATEST: &str = "latest";

/// What the installed version is compared against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionTarget {
    /// The current stable release
    Latest,
    /// A literal git version such as `v1.29.2`
    Literal(String),
}

/// A parsed version expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionExpression {
    /// Installed version must equal the target
    Exact(VersionTarget),
    /// Installed version must differ from the literal that follows `!`
    Negated(String),
}

impl FromStr for VersionExpression {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err("version expression cannot be empty".to_string());
        }

        // Only one `!` is consumed; `!latest` is compared literally.
        if let Some(undesired) = raw.strip_prefix('!') {
            return Ok(VersionExpression::Negated(undesired.to_string()));
        }

        if raw == LATEST {
            Ok(VersionExpression::Exact(VersionTarget::Latest))
        } else {
            Ok(VersionExpression::Exact(VersionTarget::Literal(
                raw.to_string(),
            )))
        }
    }
}

impl fmt::Display for VersionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionExpression::Exact(VersionTarget::Latest) => f.write_str(LATEST),
            VersionExpression::Exact(VersionTarget::Literal(v)) => f.write_str(v),
            VersionExpression::Negated(v) => write!(f, "!{}", v),
        }
    }
}
