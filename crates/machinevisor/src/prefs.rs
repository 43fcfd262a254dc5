//! Persisted user preferences: server override and speech settings.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::endpoint::normalize_base_url;
use crate::types::{VisorError, VisorResult};

pub const DEFAULT_SPEECH_RATE: f32 = 1.0;
pub const MIN_SPEECH_RATE: f32 = 0.2;
pub const MAX_SPEECH_RATE: f32 = 1.5;

/// Stored preference values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub server_base_url: Option<String>,
    pub tts_speed: f32,
    pub tts_voice: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            server_base_url: None,
            tts_speed: DEFAULT_SPEECH_RATE,
            tts_voice: None,
        }
    }
}

/// Clamp a speech rate into the supported range; NaN maps to the default.
pub fn clamp_speech_rate(rate: f32) -> f32 {
    if rate.is_nan() {
        DEFAULT_SPEECH_RATE
    } else {
        rate.clamp(MIN_SPEECH_RATE, MAX_SPEECH_RATE)
    }
}

/// JSON-file preference store. Every write is persisted immediately.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    data: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Open the store at `path`. A missing or unreadable file yields defaults.
    pub fn open(path: impl Into<PathBuf>) -> VisorResult<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt preferences {}: {e}", path.display());
                Preferences::default()
            })
        } else {
            tracing::debug!("No preferences at {}, using defaults", path.display());
            Preferences::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory(data: Preferences) -> Self {
        Self {
            path: None,
            data: RwLock::new(data),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> Preferences {
        self.read().clone()
    }

    pub fn server_base_url(&self) -> Option<String> {
        self.read().server_base_url.clone()
    }

    /// Validate, normalize and persist a server address.
    pub fn save_server_base_url(&self, raw: &str) -> VisorResult<String> {
        let normalized = normalize_base_url(raw);
        if normalized.is_empty() {
            return Err(VisorError::InvalidEndpoint(raw.trim().to_string()));
        }
        self.update(|p| p.server_base_url = Some(normalized.clone()))?;
        tracing::info!("Saved server address {normalized}");
        Ok(normalized)
    }

    pub fn tts_speed(&self) -> f32 {
        clamp_speech_rate(self.read().tts_speed)
    }

    pub fn set_tts_speed(&self, rate: f32) -> VisorResult<f32> {
        let rate = clamp_speech_rate(rate);
        self.update(|p| p.tts_speed = rate)?;
        Ok(rate)
    }

    pub fn tts_voice(&self) -> Option<String> {
        self.read().tts_voice.clone()
    }

    pub fn set_tts_voice(&self, voice: Option<String>) -> VisorResult<()> {
        self.update(|p| p.tts_voice = voice)
    }

    fn update(&self, apply: impl FnOnce(&mut Preferences)) -> VisorResult<()> {
        let mut guard = self.write();
        let mut next = guard.clone();
        apply(&mut next);
        // memory only changes once the file write succeeded
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, data: &Preferences) -> VisorResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        std::fs::write(path, serialized).map_err(|e| {
            VisorError::Preferences(format!("Failed to write {}: {e}", path.display()))
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Preferences> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Preferences> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::in_memory(Preferences::default())
    }
}
