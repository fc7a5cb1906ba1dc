use contracts::shared::scoring::AchievementPolicy;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid server address {}:{}: {}", self.host, self.port, e))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// ":memory:" или путь к файлу SQLite
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Заполнить пустую БД демонстрационными данными
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            seed_demo_data: true,
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path.trim() == IN_MEMORY_PATH
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScoringConfig {
    #[serde(default)]
    pub achievement_policy: AchievementPolicy,
}

pub const IN_MEMORY_PATH: &str = ":memory:";

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    IN_MEMORY_PATH.into()
}

fn default_true() -> bool {
    true
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[database]
path = ":memory:"
seed_demo_data = true

[scoring]
achievement_policy = "ratio"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    toml::from_str(contents).map_err(|e| anyhow::anyhow!("Invalid config.toml: {}", e))
}

/// Запомнить конфигурацию процесса (однократно, при старте)
pub fn install(config: Config) -> anyhow::Result<&'static Config> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Configuration is already installed"))?;
    CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("Configuration is not installed"))
}

/// Политика расчёта выполнения; до установки конфигурации действует `Ratio`
pub fn achievement_policy() -> AchievementPolicy {
    CONFIG
        .get()
        .map(|c| c.scoring.achievement_policy)
        .unwrap_or_default()
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    Ok(PathBuf::from(db_path_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, ":memory:");
        assert!(config.database.is_in_memory());
        assert!(config.database.seed_demo_data);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.scoring.achievement_policy, AchievementPolicy::Ratio);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config(
            r#"
            [database]
            path = "data/scorecard.db"

            [scoring]
            achievement_policy = "category_aware"
            "#,
        )
        .unwrap();
        assert!(!config.database.is_in_memory());
        assert!(config.database.seed_demo_data);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.scoring.achievement_policy,
            AchievementPolicy::CategoryAware
        );
        assert_eq!(config.server.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = parse_config("[scoring]\nachievement_policy = \"linear\"\n");
        assert!(result.is_err());
    }
}
