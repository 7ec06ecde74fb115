use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::policy::Policy;
use crate::scale::GradeScale;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub policy_path: Option<PathBuf>,
    pub policy: Policy,
    pub scale: &'static GradeScale,
}

impl AppState {
    pub fn new(policy: Policy, scale: &'static GradeScale) -> Self {
        Self {
            policy_path: None,
            policy,
            scale,
        }
    }

    /// Swaps in the policy at `path`. The active policy is untouched on error.
    pub fn select_policy(&mut self, path: &Path) -> anyhow::Result<()> {
        let (policy, scale) = Policy::load(path)?;
        self.policy = policy;
        self.scale = scale;
        self.policy_path = Some(path.to_path_buf());
        Ok(())
    }
}
