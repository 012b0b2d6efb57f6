use thiserror::Error;

/// 記事ドメインのエラー型
///
/// 記事が存在しないことはエラーではなく、`None`または`false`で表現する。
#[derive(Error, Debug)]
pub enum ArticleError {
    /// 入力値の検証エラー（ストアへのアクセス前に検出）
    #[error("入力値が不正です: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// データベース操作エラー
    #[error("データベースエラー: {operation} - {source}")]
    Database {
        operation: String,
        #[source]
        source: sqlx::Error,
    },
}

impl ArticleError {
    /// 検証エラーを作成
    pub fn validation<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// データベースエラーを作成
    pub fn database<O: Into<String>>(operation: O, source: sqlx::Error) -> Self {
        Self::Database {
            operation: operation.into(),
            source,
        }
    }

    /// 検証エラーかどうか
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// 記事エラーのResult型エイリアス
pub type ArticleResult<T> = std::result::Result<T, ArticleError>;
