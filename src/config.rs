use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::repair::RepairOptions;

/// Contents of `relink.toml`. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RelinkConfig {
    pub group_size: Option<usize>,
    pub max_imports: Option<usize>,
    pub imports_before_pausing: Option<usize>,
    pub move_aae: Option<bool>,
    pub settle_delay_ms: Option<u64>,
    pub pause_delay_ms: Option<u64>,
    pub scratch_library: Option<PathBuf>,
}

impl RelinkConfig {
    /// A config with every default spelled out, for `relink init`
    pub fn with_defaults() -> Self {
        let defaults = RepairOptions::default();
        Self {
            group_size: Some(defaults.group_size),
            max_imports: Some(defaults.max_imports),
            imports_before_pausing: Some(defaults.imports_before_pausing),
            move_aae: Some(defaults.move_aae),
            settle_delay_ms: Some(defaults.settle_delay.as_millis() as u64),
            pause_delay_ms: Some(defaults.pause_delay.as_millis() as u64),
            scratch_library: None,
        }
    }

    /// Overlay the configured values onto `options`
    pub fn apply(&self, options: &mut RepairOptions) {
        if let Some(group_size) = self.group_size {
            options.group_size = group_size;
        }
        if let Some(max_imports) = self.max_imports {
            options.max_imports = max_imports;
        }
        if let Some(imports_before_pausing) = self.imports_before_pausing {
            options.imports_before_pausing = imports_before_pausing;
        }
        if let Some(move_aae) = self.move_aae {
            options.move_aae = move_aae;
        }
        if let Some(ms) = self.settle_delay_ms {
            options.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.pause_delay_ms {
            options.pause_delay = Duration::from_millis(ms);
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("relink.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RelinkConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RelinkConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RelinkConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
