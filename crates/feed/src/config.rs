use aduan_model::CONFIRMATIONS_TO_CLOSE;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Tunable limits for the feed components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedTuning {
    /// Items per "load more" fetch. A shorter page signals exhaustion.
    pub page_size: usize,
    /// Comments/reports allowed per user per rolling window.
    pub rate_limit_per_hour: usize,
    pub rate_window_ms: u64,
    /// Trending candidate pool: most recent N items are scored, never
    /// the whole collection.
    pub trending_pool: usize,
    /// How many leading entries get a top-rank badge when unfiltered.
    pub top_ranked: usize,
    /// Display-only closing target; status transitions are backend policy.
    pub confirmations_to_close: u64,
}

impl Default for FeedTuning {
    fn default() -> Self {
        Self {
            page_size: 10,
            rate_limit_per_hour: 5,
            rate_window_ms: 60 * 60 * 1000,
            trending_pool: 50,
            top_ranked: 3,
            confirmations_to_close: CONFIRMATIONS_TO_CLOSE,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawTuning {
    schema_version: Option<u32>,
    page_size: Option<usize>,
    rate_limit_per_hour: Option<usize>,
    rate_window_ms: Option<u64>,
    trending_pool: Option<usize>,
    top_ranked: Option<usize>,
    confirmations_to_close: Option<u64>,
}

impl FeedTuning {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read tuning file {}", path.display()))?;
        Self::from_bytes(&bytes)
    }

    /// Accepts JSON or TOML, matching however the deployment ships its
    /// config.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: RawTuning = match serde_json::from_slice(bytes) {
            Ok(raw) => raw,
            Err(json_err) => {
                let utf8 = std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
                toml::from_str(utf8).map_err(|toml_err| {
                    anyhow!(
                        "Tuning is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                    )
                })?
            }
        };
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTuning) -> Result<Self> {
        if let Some(schema_version) = raw.schema_version {
            if schema_version != 1 {
                return Err(anyhow!(
                    "tuning.schema_version {schema_version} is not supported (expected 1)"
                ));
            }
        }

        let defaults = Self::default();

        let page_size = raw.page_size.unwrap_or(defaults.page_size);
        if !(1..=100).contains(&page_size) {
            return Err(anyhow!("page_size must be in [1, 100] (got {page_size})"));
        }

        let rate_limit_per_hour = raw
            .rate_limit_per_hour
            .unwrap_or(defaults.rate_limit_per_hour);
        if rate_limit_per_hour == 0 {
            return Err(anyhow!("rate_limit_per_hour must be at least 1"));
        }

        let rate_window_ms = raw.rate_window_ms.unwrap_or(defaults.rate_window_ms);
        if rate_window_ms == 0 {
            return Err(anyhow!("rate_window_ms must be positive"));
        }

        let trending_pool = raw
            .trending_pool
            .unwrap_or(defaults.trending_pool)
            .clamp(1, 500);
        let top_ranked = raw.top_ranked.unwrap_or(defaults.top_ranked).clamp(0, 10);

        Ok(Self {
            page_size,
            rate_limit_per_hour,
            rate_window_ms,
            trending_pool,
            top_ranked,
            confirmations_to_close: raw
                .confirmations_to_close
                .unwrap_or(defaults.confirmations_to_close),
        })
    }
}
