use wr_controller::ControllerConfig;

/// Build-time configuration, baked in with `option_env!`.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// WalletConnect relay project id; the relay connector is off without it.
    pub wc_project_id: Option<String>,
    pub controller: ControllerConfig,
}

impl AppConfig {
    pub fn from_build_env() -> Self {
        Self::from_values(
            option_env!("WR_WC_PROJECT_ID"),
            option_env!("WR_PAYLOAD_SCHEMA"),
            option_env!("WR_CLOSE_DELAY_MS"),
            option_env!("WR_RESTORE_DELAY_MS"),
        )
    }

    pub fn from_values(
        project_id: Option<&str>,
        schema: Option<&str>,
        close_delay_ms: Option<&str>,
        restore_delay_ms: Option<&str>,
    ) -> Self {
        Self {
            wc_project_id: project_id
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned),
            controller: ControllerConfig::from_env_values(schema, close_delay_ms, restore_delay_ms),
        }
    }
}
