use dotenvy::dotenv;
use log::{error, warn};
use serde::Deserialize;
use std::{env, path::PathBuf, str::FromStr};

const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub data_dir: String,
    pub basics_file: String,
    pub characteristics_file: String,
    pub images_file: String,
    pub default_limit: usize,
    pub max_limit: usize,
    pub case_sensitive_location: bool,
    pub openai_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_seconds: u64,
    pub database_url: Option<String>,
    pub pricing_enabled: bool,
    pub http_bind_address: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: "data".to_string(),
            basics_file: "property_basics.json".to_string(),
            characteristics_file: "property_characteristics.json".to_string(),
            images_file: "property_images.json".to_string(),
            default_limit: 5,
            max_limit: 100,
            case_sensitive_location: false,
            openai_api_key: None,
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-3.5-turbo".to_string(),
            llm_timeout_seconds: 20,
            database_url: None,
            pricing_enabled: true,
            http_bind_address: None,
        }
    }
}

impl Config {
    pub fn data_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(&self.data_dir).join(file_name)
    }

    fn apply_env_overrides(&mut self) {
        override_value(&mut self.data_dir, "DATA_DIR");
        override_value(&mut self.basics_file, "PROPERTY_BASICS_FILE");
        override_value(&mut self.characteristics_file, "PROPERTY_CHARACTERISTICS_FILE");
        override_value(&mut self.images_file, "PROPERTY_IMAGES_FILE");
        override_value(&mut self.default_limit, "DEFAULT_PROPERTY_LIMIT");
        override_value(&mut self.max_limit, "MAX_PROPERTY_LIMIT");
        override_flag(&mut self.case_sensitive_location, "CASE_SENSITIVE_LOCATION");
        override_optional(&mut self.openai_api_key, "OPENAI_API_KEY");
        override_value(&mut self.llm_base_url, "LLM_BASE_URL");
        override_value(&mut self.llm_model, "LLM_MODEL");
        override_value(&mut self.llm_timeout_seconds, "LLM_TIMEOUT_SECONDS");
        override_optional(&mut self.database_url, "DATABASE_URL");
        override_flag(&mut self.pricing_enabled, "PRICING_ENABLED");
        override_optional(&mut self.http_bind_address, "HTTP_BIND_ADDRESS");
    }
}

fn override_value<T: FromStr>(target: &mut T, key: &str) {
    if let Ok(raw) = env::var(key) {
        match raw.parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!("ignoring invalid value for {key}: {raw}"),
        }
    }
}

fn override_flag(target: &mut bool, key: &str) {
    if let Ok(raw) = env::var(key) {
        *target = raw.trim().eq_ignore_ascii_case("true");
    }
}

fn override_optional(target: &mut Option<String>, key: &str) {
    if let Ok(raw) = env::var(key) {
        if !raw.trim().is_empty() {
            *target = Some(raw);
        }
    }
}

pub fn create_test_config() -> Config {
    Config {
        data_dir: "xxx".to_string(),
        llm_timeout_seconds: 1,
        ..Config::default()
    }
}

pub fn read_config() -> Config {
    dotenv().ok();
    let mut config = match env::var(CONFIG_PATH_ENV) {
        Ok(config_path) => std::fs::read_to_string(config_path)
            .map_err(|e| e.to_string())
            .and_then(|contents| toml::from_str::<Config>(&contents).map_err(|e| e.to_string()))
            .unwrap_or_else(|err| {
                error!("failed to read config: {err}");
                std::process::exit(1);
            }),
        Err(_) => {
            warn!("{CONFIG_PATH_ENV} not set, using default configuration");
            Config::default()
        }
    };
    config.apply_env_overrides();
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/srv/listings"
            max_limit = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, "/srv/listings");
        assert_eq!(config.max_limit, 50);
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.basics_file, "property_basics.json");
        assert!(config.pricing_enabled);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn data_path_joins_directory_and_file() {
        let config = create_test_config();
        assert_eq!(
            config.data_path(&config.images_file),
            PathBuf::from("xxx").join("property_images.json")
        );
    }
}
