use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLLABORATION_CAP: u32 = 2;
pub const DEFAULT_LOAD_CAP: usize = 4;
pub const DEFAULT_GROUP_DELIMITER: &str = "-";
pub const DEFAULT_DOMAIN: &str = "kth.se";
pub const POLICY_ENV_VAR: &str = "TEAMMATE_POLICY";

/// Rules for who may still be suggested as a teammate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EligibilityPolicy {
    /// Students with this many group memberships or more are busy.
    pub collaboration_cap: u32,
    /// Students with this many completed categories or more are busy.
    pub load_cap: usize,
    pub group_delimiter: String,
    pub domain: String,
    pub exclude_past_partners: bool,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            collaboration_cap: DEFAULT_COLLABORATION_CAP,
            load_cap: DEFAULT_LOAD_CAP,
            group_delimiter: DEFAULT_GROUP_DELIMITER.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            exclude_past_partners: false,
        }
    }
}

impl EligibilityPolicy {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.collaboration_cap == 0 {
            anyhow::bail!("collaboration_cap must be at least 1");
        }
        if self.load_cap == 0 {
            anyhow::bail!("load_cap must be at least 1");
        }
        if self.group_delimiter.is_empty() {
            anyhow::bail!("group_delimiter must not be empty");
        }
        if self.domain.trim().is_empty() {
            anyhow::bail!("domain must not be empty");
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let policy: Self = serde_json::from_str(text).context("invalid policy JSON")?;
        policy.validate()?;
        Ok(policy)
    }
}

/// Loads the policy from `path`, falling back to `TEAMMATE_POLICY` and then
/// to the compiled defaults.
pub fn load(path: Option<&Path>) -> anyhow::Result<EligibilityPolicy> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var_os(POLICY_ENV_VAR).map(Into::into),
    };

    let Some(path) = path else {
        tracing::debug!("no policy file given, using defaults");
        return Ok(EligibilityPolicy::default());
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read policy file {}", path.display()))?;
    let policy = EligibilityPolicy::from_json(&text)
        .with_context(|| format!("failed to load policy from {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        collaboration_cap = policy.collaboration_cap,
        load_cap = policy.load_cap,
        exclude_past_partners = policy.exclude_past_partners,
        "loaded eligibility policy"
    );
    Ok(policy)
}
