use serde::{Deserialize, Serialize};

use crate::{artifacts::ArtifactLocation, simulator::MAX_CURVE_POINTS};

/// Longest accepted password lifetime, in days.
pub const MAX_EXPIRY_DAYS: i64 = 3650;

/// Argon2 cost parameters. Production defaults follow the argon2 crate's
/// recommended settings; tests use a much cheaper profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingConfig {
    pub memory_kib:  u32,
    pub iterations:  u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib:  19 * 1024,
            iterations:  2,
            parallelism: 1,
        }
    }
}

/// Price sweep used for the sensitivity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    pub points:      usize,
    pub low_factor:  f64,
    pub high_factor: f64,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            points:      20,
            low_factor:  0.8,
            high_factor: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub database_path: String,
    pub artifact_root: String,
    pub model: ArtifactLocation,
    #[serde(default = "default_reference_table")]
    pub reference_table: String,
    #[serde(default = "default_expiry_days")]
    pub password_expiry_days: i64,
    #[serde(default)]
    pub hashing: HashingConfig,
    #[serde(default)]
    pub sensitivity: SensitivityConfig,
    /// Half-width of the price input band, as a fraction of current price.
    #[serde(default = "default_price_band")]
    pub price_band: f64,
}

fn default_reference_table() -> String {
    "dm_elasticity".to_string()
}

fn default_expiry_days() -> i64 {
    15
}

fn default_price_band() -> f64 {
    0.10
}

impl PanelConfig {
    /// Load from `<data_dir>/panel.json`.
    /// In tests, use PanelConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/panel.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PanelConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        log::info!(
            "config: loaded {path} (model={}, table={}, expiry_days={})",
            config.model,
            config.reference_table,
            config.password_expiry_days
        );
        Ok(config)
    }

    /// Reject settings the rest of the core relies on never seeing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_plain_identifier(&self.reference_table) {
            anyhow::bail!(
                "reference_table '{}' must be a plain SQL identifier",
                self.reference_table
            );
        }
        if !(1..=MAX_EXPIRY_DAYS).contains(&self.password_expiry_days) {
            anyhow::bail!("password_expiry_days must be between 1 and {MAX_EXPIRY_DAYS}");
        }
        if !(2..=MAX_CURVE_POINTS).contains(&self.sensitivity.points) {
            anyhow::bail!("sensitivity.points must be between 2 and {MAX_CURVE_POINTS}");
        }
        if !(self.sensitivity.low_factor > 0.0
            && self.sensitivity.low_factor < self.sensitivity.high_factor)
        {
            anyhow::bail!("sensitivity factors must satisfy 0 < low_factor < high_factor");
        }
        if !(self.price_band > 0.0 && self.price_band < 1.0) {
            anyhow::bail!("price_band must be in (0, 1)");
        }
        Ok(())
    }

    /// In-memory database, cheap hashing, default sweep.
    pub fn default_test() -> Self {
        Self {
            database_path: ":memory:".into(),
            artifact_root: "./artifacts".into(),
            model: ArtifactLocation::new("panel-artifacts", "models/elasticity/model.json"),
            reference_table: default_reference_table(),
            password_expiry_days: default_expiry_days(),
            hashing: HashingConfig {
                memory_kib:  1024,
                iterations:  1,
                parallelism: 1,
            },
            sensitivity: SensitivityConfig::default(),
            price_band: default_price_band(),
        }
    }
}

/// The reference table name is spliced into SQL, so it is limited to
/// ASCII letters, digits and underscores.
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
