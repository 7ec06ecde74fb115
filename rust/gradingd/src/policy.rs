use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::calc::TermWeights;
use crate::scale::{GradeScale, DEFAULT_SCALE_VERSION};

pub const POLICY_ENV: &str = "GRADINGD_POLICY";

/// Institution-wide grading policy. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    pub term_weights: TermWeights,
    pub scale_version: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            term_weights: TermWeights::default(),
            scale_version: DEFAULT_SCALE_VERSION.to_string(),
        }
    }
}

impl Policy {
    /// Reads and validates a policy file, returning it with the scale it selects.
    pub fn load(path: &Path) -> anyhow::Result<(Self, &'static GradeScale)> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy {}", path.to_string_lossy()))?;
        let policy: Policy = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse policy {}", path.to_string_lossy()))?;
        let scale = policy
            .resolve_scale()
            .with_context(|| format!("invalid policy {}", path.to_string_lossy()))?;
        Ok((policy, scale))
    }

    /// Validates the policy and returns the scale it selects.
    pub fn resolve_scale(&self) -> anyhow::Result<&'static GradeScale> {
        self.term_weights.validate()?;
        let scale = GradeScale::by_version(&self.scale_version)?;
        scale.validate()?;
        Ok(scale)
    }
}
