use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// 設定関連のエラー型
/// 環境変数、設定ファイル、設定値の検証など設定に関するエラーを定義
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 環境変数が見つからない
    #[error("環境変数が見つかりません: {name}")]
    MissingEnvironmentVariable { name: String },

    /// 設定値が不正
    #[error("設定値が不正です: {reason}")]
    InvalidValue { reason: String },

    /// 設定ファイルが見つからない
    #[error("設定ファイルが見つかりません: {path}")]
    MissingConfigFile { path: String },
}

impl ConfigError {
    /// 環境変数不足エラーを作成
    pub fn missing_env_var<N: Into<String>>(name: N) -> Self {
        Self::MissingEnvironmentVariable { name: name.into() }
    }

    /// 不正な設定値エラーを作成
    pub fn invalid_value<R: Into<String>>(reason: R) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// 設定ファイル不足エラーを作成
    pub fn missing_config_file<P: Into<String>>(path: P) -> Self {
        Self::MissingConfigFile { path: path.into() }
    }
}

/// 設定エラーのResult型エイリアス
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// アプリケーション設定
/// .envファイルと環境変数から読み込む
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// `DATABASE_URL`は必須。`DATABASE_MAX_CONNECTIONS`と
    /// `DATABASE_ACQUIRE_TIMEOUT_SECS`は未設定ならデフォルト値を使う。
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む（テストではHashMapを渡す）
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::missing_env_var("DATABASE_URL"))?;
        if database_url.trim().is_empty() {
            return Err(ConfigError::invalid_value("DATABASE_URLが空です"));
        }

        let max_connections = parse_optional(&lookup, "DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(ConfigError::invalid_value(
                "DATABASE_MAX_CONNECTIONSは1以上である必要があります",
            ));
        }
        let acquire_timeout_secs = parse_optional(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS);

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }
}

fn parse_optional<T, F>(lookup: &F, name: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::invalid_value(format!("{}の値を解釈できません: {}", name, raw))
        }),
        None => Ok(None),
    }
}
