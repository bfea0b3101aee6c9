use std::path::Path;
use std::path::PathBuf;

use farmware_core::Config;
use farmware_core::ConfigError;

const APP_DIR: &str = "farmware";

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

pub fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("farmware.log")
}

/// Defaults, then the config file, then environment, then `--base-url`.
pub fn resolve_config<F>(
    explicit: Option<&Path>,
    fallback: Option<&Path>,
    base_url_flag: Option<&str>,
    env: F,
) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = Config::load(explicit, fallback)?;
    config.apply_env(env)?;
    if let Some(base_url) = base_url_flag.map(str::trim).filter(|url| !url.is_empty()) {
        config.backend.base_url = base_url.to_string();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use farmware_core::ENV_BASE_URL;
    use pretty_assertions::assert_eq;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("config.toml");

        let config = resolve_config(None, Some(&fallback), None, no_env).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[backend]\nbase_url = \"http://file:5000\"\n").unwrap();
        let env = |key: &str| (key == ENV_BASE_URL).then(|| "http://env:5000".to_string());

        let from_file = resolve_config(Some(&path), None, None, no_env).unwrap();
        assert_eq!(from_file.backend.base_url, "http://file:5000");

        let from_env = resolve_config(Some(&path), None, None, env).unwrap();
        assert_eq!(from_env.backend.base_url, "http://env:5000");

        let from_flag = resolve_config(Some(&path), None, Some("http://flag:5000"), env).unwrap();
        assert_eq!(from_flag.backend.base_url, "http://flag:5000");
    }

    #[test]
    fn invalid_result_is_rejected_after_merging() {
        let err = resolve_config(None, None, Some("not-a-url"), no_env).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIGURATION");
    }

    #[test]
    fn default_log_path_ends_in_app_dir() {
        let path = default_log_path();
        assert!(path.ends_with("farmware/farmware.log"));
    }
}
