use std::time::Duration;
use tracing::warn;
use wr_api_types::PayloadSchema;

pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_millis(1200);
pub const DEFAULT_RESTORE_DELAY: Duration = Duration::from_millis(2000);

/// Main-button captions for each step of the confirm sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captions {
    pub confirm: String,
    pub processing: String,
    pub sending: String,
    pub completed: String,
    pub signature_failed: String,
    pub send_failed: String,
}

impl Default for Captions {
    fn default() -> Self {
        Self {
            confirm: "CONFIRM WALLET".to_owned(),
            processing: "PROCESSING...".to_owned(),
            sending: "SENDING...".to_owned(),
            completed: "COMPLETED ✓".to_owned(),
            signature_failed: "SIGNATURE FAILED".to_owned(),
            send_failed: "ERROR SENDING".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub schema: PayloadSchema,
    pub captions: Captions,
    /// Pause between the completed caption and closing the view.
    pub close_delay: Duration,
    /// Pause before a failed-signature caption reverts to the confirm caption.
    pub restore_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            schema: PayloadSchema::default(),
            captions: Captions::default(),
            close_delay: DEFAULT_CLOSE_DELAY,
            restore_delay: DEFAULT_RESTORE_DELAY,
        }
    }
}

impl ControllerConfig {
    /// Builds the config from raw build-time environment values.
    ///
    /// `WR_PAYLOAD_SCHEMA`, `WR_CLOSE_DELAY_MS` and `WR_RESTORE_DELAY_MS` are
    /// baked in by the browser crate with `option_env!`. Invalid values fall
    /// back to the defaults with a warning.
    pub fn from_env_values(
        schema: Option<&str>,
        close_delay_ms: Option<&str>,
        restore_delay_ms: Option<&str>,
    ) -> Self {
        let mut config = Self::default();

        if let Some(raw) = schema.filter(|v| !v.trim().is_empty()) {
            match raw.parse() {
                Ok(schema) => config.schema = schema,
                Err(err) => warn!("{err}; using {:?}", config.schema),
            }
        }
        if let Some(delay) = parse_millis("WR_CLOSE_DELAY_MS", close_delay_ms) {
            config.close_delay = delay;
        }
        if let Some(delay) = parse_millis("WR_RESTORE_DELAY_MS", restore_delay_ms) {
            config.restore_delay = delay;
        }

        config
    }

    pub fn with_schema(mut self, schema: PayloadSchema) -> Self {
        self.schema = schema;
        self
    }
}

fn parse_millis(name: &str, raw: Option<&str>) -> Option<Duration> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!("{name}={raw} is not a millisecond count; using default");
            None
        }
    }
}
