//! # PMOVoice Configuration Module
//!
//! This module provides configuration management for the PMOVoice skill, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! // Get the global configuration
//! let config = get_config();
//!
//! // Access configuration values
//! let level = config.get_log_min_level()?;
//! let data_dir = config.get_managed_dir(&["skill", "data_dir"], "skill_data")?;
//!
//! // Update configuration values
//! config.set_log_enable_console(false)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmovoice.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PMOVoice configuration"));
}

const ENV_CONFIG_DIR: &str = "PMOVOICE_CONFIG";
const ENV_PREFIX: &str = "PMOVOICE_CONFIG__";
const CONFIG_DIR_NAME: &str = ".pmovoice";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<u64> {
            Ok(self.get_u64($path).unwrap_or($default))
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            Ok(self.get_bool($path).unwrap_or($default))
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for PMOVoice
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

// Implémentation manuelle de Clone
impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self
            .data
            .lock()
            .map(|d| d.clone())
            .unwrap_or(Value::Null);
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        CONFIG_DIR_NAME.to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOVOICE_CONFIG` environment variable
    /// 3. `.pmovoice` in the current directory
    /// 4. `.pmovoice` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for read/write permissions.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or empty to use defaults
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        // Charger la configuration par défaut
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file=%path, "Loaded config file");
            data
        } else {
            info!(config_file=%path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Merger avec la config par défaut
        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        Self::apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Returns the directory this configuration was loaded from
    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self
            .data
            .lock()
            .map_err(|e| anyhow!("Config lock poisoned: {}", e))?;
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["cast", "connect_timeout"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|e| anyhow!("Config lock poisoned: {}", e))?;
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self
            .data
            .lock()
            .map_err(|e| anyhow!("Config lock poisoned: {}", e))?;
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    /// Reads an unsigned integer, accepting numbers and numeric strings.
    ///
    /// Returns `None` (with a warning) when the value is missing or invalid.
    pub fn get_u64(&self, path: &[&str]) -> Option<u64> {
        match self.get_value(path) {
            Ok(Value::Number(n)) => match n.as_u64() {
                Some(v) => Some(v),
                None => {
                    warn!(path = %path.join("."), value = %n, "Invalid unsigned value");
                    None
                }
            },
            Ok(Value::String(s)) => match s.trim().parse::<u64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(path = %path.join("."), value = %s, "Invalid unsigned value");
                    None
                }
            },
            Ok(_) => {
                warn!(path = %path.join("."), "Value is not a number");
                None
            }
            Err(err) => {
                warn!(path = %path.join("."), error = %err, "Missing configuration value");
                None
            }
        }
    }

    /// Reads a boolean, `None` when missing or not a bool.
    pub fn get_bool(&self, path: &[&str]) -> Option<bool> {
        match self.get_value(path) {
            Ok(Value::Bool(b)) => Some(b),
            Ok(other) => {
                warn!(path = %path.join("."), value = ?other, "Value is not a boolean");
                None
            }
            Err(_) => None,
        }
    }

    /// Reads a string, `None` when missing, not a string or empty.
    pub fn get_string(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if key.starts_with(ENV_PREFIX) {
                let key_path = key
                    .trim_start_matches(ENV_PREFIX)
                    .split("__")
                    .collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        new_map.insert(Value::String(s.to_lowercase()), Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Résout un chemin relatif ou absolu et crée le répertoire si nécessaire
    fn resolve_and_create_dir(&self, dir_path: &str) -> Result<String> {
        let path = Path::new(dir_path);

        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            // Chemin relatif : le résoudre par rapport à config_dir
            Path::new(&self.config_dir).join(path)
        };

        if !absolute_path.exists() {
            fs::create_dir_all(&absolute_path)?;
            info!(directory=%absolute_path.display(), "Created managed directory");
        }

        Ok(absolute_path.to_string_lossy().to_string())
    }

    /// Récupère un répertoire géré par la configuration
    ///
    /// Le répertoire peut être absolu ou relatif au répertoire de
    /// configuration. Il sera créé s'il n'existe pas.
    ///
    /// # Arguments
    ///
    /// * `path` - Chemin dans l'arbre de configuration (ex: `&["skill", "data_dir"]`)
    /// * `default` - Nom de répertoire par défaut si non configuré
    ///
    /// # Exemple
    ///
    /// ```no_run
    /// use pmoconfig::get_config;
    ///
    /// let config = get_config();
    /// let data_dir = config.get_managed_dir(&["skill", "data_dir"], "skill_data")?;
    /// println!("Skill data directory: {}", data_dir);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<String> {
        let dir_path = match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => {
                self.set_managed_dir(path, default.to_string())?;
                default.to_string()
            }
        };
        self.resolve_and_create_dir(&dir_path)
    }

    /// Définit un répertoire géré par la configuration
    pub fn set_managed_dir(&self, path: &[&str], directory: String) -> Result<()> {
        self.set_value(path, Value::String(directory))
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    impl_u64_config!(
        get_discovery_interval_secs,
        set_discovery_interval_secs,
        &["cast", "discovery_interval"],
        600
    );

    impl_u64_config!(
        get_discovery_window_secs,
        set_discovery_window_secs,
        &["cast", "discovery_window"],
        5
    );

    impl_u64_config!(
        get_connect_timeout_secs,
        set_connect_timeout_secs,
        &["cast", "connect_timeout"],
        10
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> Result<String> {
        Ok(self
            .get_string(&["host", "logger", "min_level"])
            .unwrap_or_else(|| DEFAULT_LOG_MIN_LEVEL.to_string()))
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Returns the global configuration instance
///
/// The instance is lazily loaded on first access from the directory found by
/// [`Config::config_dir`].
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}
