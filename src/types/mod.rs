//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - 設定: 環境変数からの読み込みと設定エラー
//! - エラー: 記事ドメインとインフラ層のエラー型

pub mod config;
pub mod error;
pub mod infra;

// 便利な再エクスポート
pub use config::{AppConfig, ConfigError, ConfigResult};
pub use error::{ArticleError, ArticleResult};
pub use infra::{InfraError, InfraResult};
