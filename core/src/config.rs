use crate::attribution::SynonymTable;
use crate::errors::CostReportError;
use crate::invocation::ObjectLayout;
use crate::utils::env_var_nonempty;
use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub const BUCKET_ENV: &str = "COST_CENTERS_BUCKET";
pub const STORAGE_ROOT_ENV: &str = "COST_CENTERS_STORAGE_ROOT";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub version: Option<u32>,
    pub bucket: Option<String>,
    pub storage_root: Option<PathBuf>,
    pub cur_prefix: Option<String>,
    pub report_name: Option<String>,
    pub account_csv_key: Option<String>,
    pub timezone: Option<String>,
    /// Extra label rewrites applied after the built-in ones.
    pub cost_center_synonyms: Option<BTreeMap<String, String>>,
}

impl Config {
    pub fn load(path_override: Option<&PathBuf>) -> Result<Self> {
        let path = Config::path(path_override)?;

        if !path.exists() {
            return Ok(Config::default());
        }

        let contents =
            fs::read_to_string(&path).with_context(|| format!("read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn path(path_override: Option<&PathBuf>) -> Result<PathBuf> {
        path_override
            .cloned()
            .or_else(default_config_path)
            .ok_or_else(|| CostReportError::ConfigPathUnavailable.into())
    }

    pub fn save(&self, path_override: Option<&PathBuf>) -> Result<()> {
        let path = Config::path(path_override)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(&path, data)?;
        Ok(())
    }

    pub fn bucket(&self) -> Option<String> {
        env_var_nonempty(&[BUCKET_ENV]).or_else(|| self.bucket.clone())
    }

    pub fn storage_root(&self) -> Option<PathBuf> {
        env_var_nonempty(&[STORAGE_ROOT_ENV])
            .map(PathBuf::from)
            .or_else(|| self.storage_root.clone())
    }

    pub fn layout(&self) -> ObjectLayout {
        let defaults = ObjectLayout::default();
        ObjectLayout {
            cur_prefix: self.cur_prefix.clone().unwrap_or(defaults.cur_prefix),
            report_name: self.report_name.clone().unwrap_or(defaults.report_name),
            account_csv_key: self
                .account_csv_key
                .clone()
                .unwrap_or(defaults.account_csv_key),
        }
    }

    /// Configured timezone, then `TZ`, then UTC.
    pub fn timezone(&self) -> Result<Tz> {
        if let Some(value) = self.timezone.as_deref() {
            return value
                .trim()
                .parse::<Tz>()
                .map_err(|_| anyhow!("invalid timezone: {}", value));
        }

        if let Some(value) = env_var_nonempty(&["TZ"])
            && let Ok(timezone) = value.parse::<Tz>()
        {
            return Ok(timezone);
        }

        Ok(chrono_tz::UTC)
    }

    pub fn synonyms(&self) -> SynonymTable {
        let mut table = SynonymTable::default();
        if let Some(extra) = &self.cost_center_synonyms {
            table.extend(extra.clone());
        }
        table
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = BaseDirs::new()?.home_dir().to_path_buf();
    Some(home.join(".cost-centers").join("config.json"))
}
