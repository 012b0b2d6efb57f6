//! ニュースサイトの記事データアクセス層
//!
//! - `domain::article`: 記事モデル、一覧条件の組み立て、ストア、サービス
//! - `domain::seed`: YAMLからのシード投入
//! - `infra`: DB接続・マイグレーション・ファイル読み込み
//! - `types`: 設定とエラー型

pub mod domain;
pub mod infra;
pub mod types;
