use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::assets::color::ColorDef;
use crate::compose::CompositorOpts;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{BadgeError, BadgeResult};
use crate::encode::verification::{MAX_MARK_SIZE, VerificationOpts};
use crate::render::raster::DEFAULT_FONT_FAMILY;

/// Environment variable overriding [`BadgeConfig::origin`].
pub const ENV_ORIGIN: &str = "BADGEPRESS_ORIGIN";
/// Environment variable overriding [`BadgeConfig::api_base_url`].
pub const ENV_API_BASE_URL: &str = "BADGEPRESS_API_BASE_URL";
/// Environment variable overriding [`BadgeConfig::max_in_flight`].
pub const ENV_MAX_IN_FLIGHT: &str = "BADGEPRESS_MAX_IN_FLIGHT";
/// Environment variable overriding [`BadgeConfig::scale`].
pub const ENV_SCALE: &str = "BADGEPRESS_SCALE";

/// Runtime configuration. Every field has a default, so `{}` is a valid document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BadgeConfig {
    /// Serving origin; verification payloads and origin-relative image paths use it.
    pub origin: String,
    /// Base URL of the dispatch API. Falls back to `origin`.
    pub api_base_url: Option<String>,
    /// Accent band color.
    pub brand_color: ColorDef,
    /// Footer label.
    pub footer_label: String,
    /// Device scale factor.
    pub scale: f32,
    /// CSS font-family list for text layers.
    pub font_family: String,
    /// Verification mark parameters.
    pub verification: VerificationOpts,
    /// Per-image fetch timeout.
    pub fetch_timeout_ms: u64,
    /// Dispatch request timeout.
    pub dispatch_timeout_ms: u64,
    /// Concurrent compositor runs in a bulk session.
    pub max_in_flight: usize,
    /// Extra font directory loaded next to system fonts.
    pub fonts_dir: Option<PathBuf>,
    /// Resolve image references below this directory instead of over HTTP.
    pub assets_root: Option<PathBuf>,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_owned(),
            api_base_url: None,
            brand_color: ColorDef(Rgba8::opaque(0x1E, 0x40, 0xAF)),
            footer_label: "VISITOR".to_owned(),
            scale: 1.0,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            verification: VerificationOpts::default(),
            fetch_timeout_ms: 10_000,
            dispatch_timeout_ms: 60_000,
            max_in_flight: 8,
            fonts_dir: None,
            assets_root: None,
        }
    }
}

impl BadgeConfig {
    /// Parse a JSON document.
    pub fn from_json_str(s: &str) -> BadgeResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a JSON file. Relative `fontsDir`/`assetsRoot` resolve against the file's
    /// directory.
    pub fn from_json_file(path: &Path) -> BadgeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let mut cfg = Self::from_json_str(&text)?;
        if let Some(base) = path.parent() {
            for dir in [&mut cfg.fonts_dir, &mut cfg.assets_root].into_iter().flatten() {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        Ok(cfg)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> BadgeResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` (keyed by the `BADGEPRESS_*` names). Blank values are
    /// ignored.
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> BadgeResult<()> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_ORIGIN) {
            self.origin = v;
        }
        if let Some(v) = get(ENV_API_BASE_URL) {
            self.api_base_url = Some(v);
        }
        if let Some(v) = get(ENV_MAX_IN_FLIGHT) {
            self.max_in_flight = v.parse().map_err(|e| {
                BadgeError::validation(format!("{ENV_MAX_IN_FLIGHT}='{v}': {e}"))
            })?;
        }
        if let Some(v) = get(ENV_SCALE) {
            self.scale = v
                .parse()
                .map_err(|e| BadgeError::validation(format!("{ENV_SCALE}='{v}': {e}")))?;
        }
        Ok(())
    }

    /// Reject settings that can never work.
    pub fn validate(&self) -> BadgeResult<()> {
        if self.origin.trim().trim_end_matches('/').is_empty() {
            return Err(BadgeError::validation("origin must be non-empty"));
        }
        Canvas::BADGE.pixel_size(self.scale)?;
        if self.max_in_flight == 0 {
            return Err(BadgeError::validation("maxInFlight must be > 0"));
        }
        if self.verification.size == 0 || self.verification.size > MAX_MARK_SIZE {
            return Err(BadgeError::validation(format!(
                "verification size must be in 1..={MAX_MARK_SIZE}"
            )));
        }
        if self.fetch_timeout_ms == 0 || self.dispatch_timeout_ms == 0 {
            return Err(BadgeError::validation("timeouts must be > 0"));
        }
        Ok(())
    }

    /// Dispatch API base: `api_base_url`, or `origin` when unset.
    pub fn dispatch_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(&self.origin)
    }

    /// Image fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Dispatch timeout.
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    /// Compositor settings carried by this configuration.
    pub fn compositor_opts(&self) -> CompositorOpts {
        CompositorOpts {
            origin: self.origin.clone(),
            brand_color: self.brand_color,
            footer_label: self.footer_label.clone(),
            scale: self.scale,
            font_family: self.font_family.clone(),
            verification: self.verification.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
