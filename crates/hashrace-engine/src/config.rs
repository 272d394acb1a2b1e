use crate::error::{CompetitionError, Result};
use hashrace_types::Amount;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Competition parameters, fixed for the lifetime of an engine instance and
/// exposed back to callers as read-only state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionConfig {
    /// Window length in blocks. A task stays open while its block resolves
    /// to a lookback strictly below this value.
    pub blocks_to_create_task: u64,

    /// Minimum stake attached to a commitment.
    pub bet_size: Amount,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            blocks_to_create_task: 10,
            bet_size: Amount::from_units(1_000),
        }
    }
}

impl CompetitionConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        // A window of 1 leaves no in-range lookback, so nothing could ever
        // be claimed.
        if self.blocks_to_create_task < 2 {
            return Err(CompetitionError::InvalidConfiguration(
                "blocks_to_create_task must be at least 2".to_string(),
            ));
        }
        if self.bet_size == Amount::ZERO {
            return Err(CompetitionError::InvalidConfiguration(
                "bet_size must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
