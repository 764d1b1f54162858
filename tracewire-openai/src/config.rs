use regex::Regex;
use tracewire_core::TracewireError;

pub const DEFAULT_MAX_FIELD_BYTES: usize = 100_000;

const ENABLED_VAR: &str = "TRACEWIRE_ENABLED";
const REDACT_VAR: &str = "TRACEWIRE_REDACT";
const MAX_FIELD_BYTES_VAR: &str = "TRACEWIRE_MAX_FIELD_BYTES";
const CAPTURE_HEADERS_VAR: &str = "TRACEWIRE_CAPTURE_HEADERS";

#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// When false every wrapped call is a pass-through and no span is opened.
    pub enabled: bool,
    /// Matches in span inputs and metadata are replaced with `[REDACTED]`.
    pub redact_regex: Option<Regex>,
    pub max_field_bytes: usize,
    /// Read cache-hit headers from endpoints that expose raw responses.
    pub capture_headers: bool,
}

impl TracerConfig {
    pub fn new() -> Self {
        Self {
            enabled: true,
            redact_regex: None,
            max_field_bytes: DEFAULT_MAX_FIELD_BYTES,
            capture_headers: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_redact_regex(mut self, regex: Regex) -> Self {
        self.redact_regex = Some(regex);
        self
    }

    pub fn with_max_field_bytes(mut self, max_field_bytes: usize) -> Self {
        self.max_field_bytes = max_field_bytes;
        self
    }

    pub fn with_capture_headers(mut self, capture_headers: bool) -> Self {
        self.capture_headers = capture_headers;
        self
    }

    /// Reads `TRACEWIRE_ENABLED`, `TRACEWIRE_REDACT`,
    /// `TRACEWIRE_MAX_FIELD_BYTES` and `TRACEWIRE_CAPTURE_HEADERS`.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, TracewireError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`TracerConfig::from_env`], with variables resolved by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TracewireError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(raw) = lookup(ENABLED_VAR) {
            config.enabled = parse_flag(ENABLED_VAR, &raw)?;
        }
        if let Some(raw) = lookup(REDACT_VAR).filter(|raw| !raw.trim().is_empty()) {
            let regex = Regex::new(&raw).map_err(|err| {
                TracewireError::InvalidConfig(format!("{REDACT_VAR} is not a valid regex: {err}"))
            })?;
            config.redact_regex = Some(regex);
        }
        if let Some(raw) = lookup(MAX_FIELD_BYTES_VAR) {
            config.max_field_bytes = raw.trim().parse().map_err(|_| {
                TracewireError::InvalidConfig(format!(
                    "{MAX_FIELD_BYTES_VAR} must be a byte count, got {raw:?}"
                ))
            })?;
        }
        if let Some(raw) = lookup(CAPTURE_HEADERS_VAR) {
            config.capture_headers = parse_flag(CAPTURE_HEADERS_VAR, &raw)?;
        }
        Ok(config)
    }
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, TracewireError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TracewireError::InvalidConfig(format!(
            "{name} must be a boolean, got {raw:?}"
        ))),
    }
}
