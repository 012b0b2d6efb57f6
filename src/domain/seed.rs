use crate::domain::article::{ArticleService, ArticleStore, NewArticle};
use crate::infra::storage::file::load_yaml_from_file;
use crate::types::ArticleError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;

// YAMLファイルの構造に対応する型
#[derive(Debug, Deserialize)]
struct SeedFile {
    articles: Vec<NewArticle>,
}

/// シード投入の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: usize,
    pub skipped: usize,
}

impl fmt::Display for SeedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "シード投入完了: 新規{}件、スキップ{}件",
            self.inserted, self.skipped
        )
    }
}

/// YAMLファイルからシード記事を読み込む
pub fn load_seed_articles(file_path: &str) -> Result<Vec<NewArticle>> {
    let seed: SeedFile = load_yaml_from_file(file_path)
        .with_context(|| format!("シードYAMLファイルの読み込みに失敗: {}", file_path))?;
    Ok(seed.articles)
}

/// シード記事を順に作成する
///
/// 入力が不正な記事はスキップし、データベースエラーはその場で中断する。
pub async fn seed_articles<S: ArticleStore>(
    service: &ArticleService<S>,
    articles: Vec<NewArticle>,
) -> Result<SeedResult> {
    let mut inserted = 0;
    let mut skipped = 0;

    for article in articles {
        let title = article.title.clone();
        match service.create(article).await {
            Ok(_) => inserted += 1,
            Err(e @ ArticleError::Validation { .. }) => {
                tracing::warn!(%title, error = %e, "シード記事をスキップしました");
                skipped += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("シード記事の作成に失敗: {}", title));
            }
        }
    }

    Ok(SeedResult { inserted, skipped })
}
