use super::models::app_config::AppConfig;
use super::models::app_env::Env;
use std::fs;

impl AppConfig {
    pub fn new(env: &Env) -> AppConfig {
        let path = format!("config/{}.toml", env);
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read config file {}: {}", path, e));
        let config: AppConfig = toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse config file {}: {}", path, e));

        // Неверные пороги останавливают запуск
        if let Err(e) = config.indicator.validate() {
            panic!("Invalid config file {}: {}", path, e);
        }

        config
    }
}
