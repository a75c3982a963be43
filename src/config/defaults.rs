use super::*;

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://end-user-api.prod.garo-next-gen.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: "2tbuisnbl1t2a5gc36lhb2b6c3".to_string(),
            region: "eu-west-1".to_string(),
        }
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            trigger_poll_attempts: 10,
            trigger_poll_delay_ms: 2000,
        }
    }
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 10,
            poll_delay_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/stratus.log".to_string(),
            max_file_size_mb: 10,
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            identity: IdentityConfig::default(),
            access_token: String::new(),
            poll_interval_seconds: 900,
            meter: MeterConfig::default(),
            commit: CommitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
