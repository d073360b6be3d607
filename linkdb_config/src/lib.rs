mod schema;

pub use schema::{BackupConfig, Config, DatabaseConfig, TelegramConfig};
