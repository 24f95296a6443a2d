//! Trend thresholds and their live-updated store.
//!
//! The trend engine only ever receives a [`TrendSettings`] value. Services that
//! watch a configuration document keep a [`TrendSettingsStore`] and pass the
//! settings of its current [`TrendSnapshot`] into each call.
//!
//! A settings document looks like:
//!
//! ```json
//! { "trend": { "slope": 22.5, "threshold": 0.1 } }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Default minimum slope angle, in degrees.
pub const DEFAULT_SLOPE_DEGREES: f64 = 22.5;

/// Default minimum relative range of a series.
pub const DEFAULT_FLATNESS_THRESHOLD: f64 = 0.1;

/// Thresholds used by trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSettings {
    /// A trend verdict needs a regression line at least this steep.
    #[serde(rename = "slope", alias = "slope_threshold_degrees", default = "default_slope")]
    pub slope_threshold_degrees: f64,
    /// A series whose `max / min - 1` is below this is flat.
    #[serde(rename = "threshold", alias = "flatness_threshold", default = "default_threshold")]
    pub flatness_threshold: f64,
}

const fn default_slope() -> f64 {
    DEFAULT_SLOPE_DEGREES
}

const fn default_threshold() -> f64 {
    DEFAULT_FLATNESS_THRESHOLD
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SLOPE_DEGREES, DEFAULT_FLATNESS_THRESHOLD)
    }
}

impl TrendSettings {
    #[must_use]
    pub const fn new(slope_threshold_degrees: f64, flatness_threshold: f64) -> Self {
        Self {
            slope_threshold_degrees,
            flatness_threshold,
        }
    }

    /// Parse a settings document.
    ///
    /// # Errors
    ///
    /// Fails if `json` is not a settings document.
    pub fn from_document(json: &str) -> Result<Self> {
        let doc: SettingsDocument =
            serde_json::from_str(json).context("parsing trend settings document")?;
        Ok(doc.trend)
    }

    /// Load a settings document from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a settings document.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading trend settings from {}", path.display()))?;
        Self::from_document(&json).with_context(|| format!("loading {}", path.display()))
    }
}

/// Top level of a settings document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub trend: TrendSettings,
}

/// Settings as of one update of a [`TrendSettingsStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSnapshot {
    /// Number of updates applied before this snapshot, starting at 0.
    pub version: u64,
    pub settings: TrendSettings,
}

/// Holds the current [`TrendSnapshot`] of a watched settings document.
///
/// Starts at the defaults. Every update, including a reset after a bad
/// document, bumps the version.
#[derive(Debug)]
pub struct TrendSettingsStore {
    current: RwLock<Arc<TrendSnapshot>>,
}

impl Default for TrendSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendSettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(TrendSnapshot {
                version: 0,
                settings: TrendSettings::default(),
            })),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TrendSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    fn publish(&self, settings: TrendSettings) -> Arc<TrendSnapshot> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(TrendSnapshot {
            version: guard.version + 1,
            settings,
        });
        *guard = Arc::clone(&next);
        debug!(version = next.version, ?settings, "trend settings updated");
        next
    }

    /// Apply one settings document.
    ///
    /// # Errors
    ///
    /// A document that does not parse resets the store to the defaults and is
    /// returned as an error.
    pub fn apply_document(&self, json: &str) -> Result<Arc<TrendSnapshot>> {
        match TrendSettings::from_document(json) {
            Ok(settings) => Ok(self.publish(settings)),
            Err(e) => {
                warn!(error = %e, "invalid trend settings document, using defaults");
                self.publish(TrendSettings::default());
                Err(e)
            }
        }
    }

    /// Restore the default settings.
    pub fn reset(&self) -> Arc<TrendSnapshot> {
        self.publish(TrendSettings::default())
    }

    /// Apply every document of `updates` until the stream ends or fails.
    ///
    /// A stream error or an unparsable document restores the defaults and
    /// stops following; the error is returned.
    ///
    /// # Errors
    ///
    /// The first stream or document error.
    pub fn follow<I, E>(&self, updates: I) -> Result<()>
    where
        I: IntoIterator<Item = std::result::Result<String, E>>,
        E: fmt::Display,
    {
        for update in updates {
            match update {
                Ok(json) => {
                    self.apply_document(&json)?;
                }
                Err(e) => {
                    warn!(error = %e, "trend settings stream failed, using defaults");
                    self.reset();
                    anyhow::bail!("trend settings stream failed: {e}");
                }
            }
        }
        Ok(())
    }
}
