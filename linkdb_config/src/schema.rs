use linkdb_core::{DEFAULT_BACKUP_FILE, DEFAULT_TAGGING_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

const DATABASE_URL_VAR: &str = "DATABASE_URL";
const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
const OPERATOR_ID_VAR: &str = "LINKDB_OPERATOR_ID";

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

impl DatabaseConfig {
    fn default_url() -> String {
        dirs::home_dir().map_or_else(
            || "sqlite://links.db?mode=rwc".to_string(),
            |home| {
                format!(
                    "sqlite://{}?mode=rwc",
                    home.join("linkdb").join("links.db").display()
                )
            },
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    /// User id of the only account whose messages are interpreted.
    #[serde(default)]
    pub operator_id: u64,
    #[serde(default = "TelegramConfig::default_tagging_timeout_secs")]
    pub tagging_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            operator_id: 0,
            tagging_timeout_secs: Self::default_tagging_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    const fn default_tagging_timeout_secs() -> u64 {
        DEFAULT_TAGGING_TIMEOUT.as_secs()
    }

    #[must_use]
    pub const fn tagging_timeout(&self) -> Duration {
        Duration::from_secs(self.tagging_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackupConfig {
    #[serde(default = "BackupConfig::default_path")]
    pub path: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

impl BackupConfig {
    fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_BACKUP_FILE)
    }
}

impl Config {
    /// Load `~/linkdb/config.json` (defaults when absent), then apply
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config = Self::from_json(&content)?;
            info!("Loaded config from {}", config_path.display());
            config
        } else {
            info!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Override settings from environment variables looked up through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var(DATABASE_URL_VAR) {
            self.database.url = url;
        }
        if let Some(token) = var(TOKEN_VAR) {
            self.telegram.token = token;
        }
        if let Some(id) = var(OPERATOR_ID_VAR) {
            self.telegram.operator_id = id
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid {OPERATOR_ID_VAR} {id:?}: {e}"))?;
        }
        Ok(())
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("linkdb"))
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let mut template = Self::default();
        template.telegram.token = "your-telegram-bot-token-here".to_string();
        std::fs::write(&config_path, serde_json::to_string_pretty(&template)?)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your Telegram bot token and your Telegram user id (operator_id)");
        println!("   2. Point database.url at PostgreSQL, MySQL or keep the SQLite default");
        println!("   3. Run 'linkdb bot' to start the bot");
        println!();
        println!("🔧 Environment overrides: {DATABASE_URL_VAR}, {TOKEN_VAR}, {OPERATOR_ID_VAR}");
        println!();
        Ok(())
    }
}
