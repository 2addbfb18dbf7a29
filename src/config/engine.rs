//! Engine configuration structures.

use serde::{Deserialize, Serialize};

/// Store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-memory store for development/testing.
    InMemory,
    /// Postgres store (schema-only adapter until wired to a client).
    Postgres,
}

/// Notification bus backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusBackendConfig {
    /// In-memory fan-out bus.
    InMemory,
}

/// Claim and completion policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSettings {
    /// Allow completion straight from `claimed`, without explicit assignment.
    pub complete_from_claimed: bool,
    /// Bounded transparent retries for transient store failures.
    pub max_store_retries: u32,
    /// Base backoff between retries in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            complete_from_claimed: true,
            max_store_retries: 3,
            retry_backoff_ms: 50,
        }
    }
}

/// Auto-dispatch scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Seconds between scheduler ticks.
    pub tick_interval_secs: u64,
    /// Seconds an offered worker has to acknowledge.
    pub ack_window_secs: u64,
    /// Offers per task before auto-dispatch gives up.
    pub max_escalations: u32,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            ack_window_secs: 300,
            max_escalations: 3,
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Claim and completion policy.
    pub claim: ClaimSettings,
    /// Auto-dispatch scheduler settings.
    pub dispatch: DispatchSettings,
    /// Store backend selection.
    pub store: StoreBackendConfig,
    /// Notification bus backend selection.
    pub bus: BusBackendConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            claim: ClaimSettings::default(),
            dispatch: DispatchSettings::default(),
            store: StoreBackendConfig::InMemory,
            bus: BusBackendConfig::InMemory,
        }
    }
}

impl DispatchSettings {
    /// Validate dispatch settings values.
    ///
    /// # Errors
    ///
    /// A human-readable reason when a value is out of range.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_secs == 0 {
            return Err("tick_interval_secs must be greater than 0".into());
        }
        if self.ack_window_secs == 0 {
            return Err("ack_window_secs must be greater than 0".into());
        }
        if self.max_escalations == 0 {
            return Err("max_escalations must be greater than 0".into());
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// A human-readable reason when any section is invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.dispatch
            .validate()
            .map_err(|e| format!("dispatch settings invalid: {e}"))?;
        if self.claim.retry_backoff_ms == 0 {
            return Err("claim settings invalid: retry_backoff_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse engine configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// A parse or validation failure message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a configuration from defaults plus `HALL_*` environment
    /// overrides, loading a `.env` file first when present.
    ///
    /// # Errors
    ///
    /// A message naming the unparseable variable, or a validation failure.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("HALL_TICK_INTERVAL_SECS") {
            cfg.dispatch.tick_interval_secs = v
                .parse()
                .map_err(|e| format!("HALL_TICK_INTERVAL_SECS: {e}"))?;
        }
        if let Ok(v) = std::env::var("HALL_ACK_WINDOW_SECS") {
            cfg.dispatch.ack_window_secs =
                v.parse().map_err(|e| format!("HALL_ACK_WINDOW_SECS: {e}"))?;
        }
        if let Ok(v) = std::env::var("HALL_MAX_ESCALATIONS") {
            cfg.dispatch.max_escalations =
                v.parse().map_err(|e| format!("HALL_MAX_ESCALATIONS: {e}"))?;
        }
        if let Ok(v) = std::env::var("HALL_COMPLETE_FROM_CLAIMED") {
            cfg.claim.complete_from_claimed = v
                .parse()
                .map_err(|e| format!("HALL_COMPLETE_FROM_CLAIMED: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
