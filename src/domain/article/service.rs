use super::model::{Article, ArticleList, ArticleUpdate, Category, NewArticle};
use super::query::{ArticleFilter, ArticleOrder};
use super::repository::ArticleStore;
use crate::types::{ArticleError, ArticleResult};
use serde::{Deserialize, Serialize};

/// 一覧取得の件数上限とデフォルト値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBounds {
    pub default: i64,
    pub max: i64,
}

pub const FILTERED_LIMIT: LimitBounds = LimitBounds { default: 10, max: 100 };
pub const CATEGORY_LIMIT: LimitBounds = LimitBounds { default: 10, max: 50 };
pub const FEATURED_LIMIT: LimitBounds = LimitBounds { default: 5, max: 20 };
pub const LATEST_LIMIT: LimitBounds = LimitBounds { default: 10, max: 50 };
pub const POPULAR_LIMIT: LimitBounds = LimitBounds { default: 10, max: 50 };

// トップページの各セクションの件数
const HOMEPAGE_FEATURED: i64 = 3;
const HOMEPAGE_LATEST: i64 = 8;
const HOMEPAGE_POPULAR: i64 = 6;
// 検索結果ページは先頭50件のみ
const SEARCH_RESULTS_LIMIT: i64 = 50;

impl LimitBounds {
    /// 未指定ならデフォルト値、指定されていれば1..=maxの範囲か検証する
    pub fn resolve(&self, limit: Option<i64>) -> ArticleResult<i64> {
        let limit = limit.unwrap_or(self.default);
        if limit < 1 || limit > self.max {
            return Err(ArticleError::validation(
                "limit",
                format!("1以上{}以下である必要があります: {}", self.max, limit),
            ));
        }
        Ok(limit)
    }
}

fn resolve_offset(offset: Option<i64>) -> ArticleResult<i64> {
    let offset = offset.unwrap_or(0);
    if offset < 0 {
        return Err(ArticleError::validation(
            "offset",
            format!("0以上である必要があります: {}", offset),
        ));
    }
    Ok(offset)
}

/// トップページに表示する3つのセクション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homepage {
    pub featured: ArticleList,
    pub latest: ArticleList,
    pub popular: ArticleList,
}

/// 記事サービス
///
/// 入力の検証と件数の上限チェックを行ってからストアを呼び出します。
/// 検証エラーの場合、ストアには一切アクセスしません。
pub struct ArticleService<S> {
    store: S,
}

impl<S: ArticleStore> ArticleService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 記事を作成する（管理画面）
    pub async fn create(&self, input: NewArticle) -> ArticleResult<Article> {
        if let Err(e) = input.validate() {
            tracing::warn!(error = %e, "記事作成の入力が不正です");
            return Err(e);
        }
        let article = self.store.insert(&input).await?;
        tracing::info!(id = article.id, category = %article.category, "記事を作成しました");
        Ok(article)
    }

    /// idで記事を取得する。存在しなければNone。
    pub async fn get_by_id(&self, id: i32) -> ArticleResult<Option<Article>> {
        tracing::debug!(id, "記事を取得します");
        self.store.find_by_id(id).await
    }

    /// カテゴリ・注目記事・検索語で絞り込んだ一覧（新着順）
    pub async fn list_filtered(
        &self,
        filter: ArticleFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ArticleResult<ArticleList> {
        let limit = FILTERED_LIMIT.resolve(limit)?;
        let offset = resolve_offset(offset)?;
        let filter = filter.normalized();
        tracing::debug!(?filter, limit, offset, "記事一覧を取得します");
        self.store
            .list(&filter, ArticleOrder::Latest, limit, offset)
            .await
    }

    /// カテゴリ別の一覧（新着順）
    pub async fn list_by_category(
        &self,
        category: Category,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ArticleResult<ArticleList> {
        let limit = CATEGORY_LIMIT.resolve(limit)?;
        let offset = resolve_offset(offset)?;
        tracing::debug!(%category, limit, offset, "カテゴリ別一覧を取得します");
        self.store
            .list(
                &ArticleFilter::by_category(category),
                ArticleOrder::Latest,
                limit,
                offset,
            )
            .await
    }

    /// 注目記事（新着順）。totalは注目記事の総数。
    pub async fn list_featured(&self, limit: Option<i64>) -> ArticleResult<ArticleList> {
        let limit = FEATURED_LIMIT.resolve(limit)?;
        tracing::debug!(limit, "注目記事を取得します");
        self.store
            .list(&ArticleFilter::featured_only(), ArticleOrder::Latest, limit, 0)
            .await
    }

    /// 最新記事。totalは全記事数。
    pub async fn list_latest(&self, limit: Option<i64>) -> ArticleResult<ArticleList> {
        let limit = LATEST_LIMIT.resolve(limit)?;
        tracing::debug!(limit, "最新記事を取得します");
        self.list_all(ArticleOrder::Latest, limit).await
    }

    /// 人気記事（閲覧数の多い順）。totalは全記事数。
    pub async fn list_popular(&self, limit: Option<i64>) -> ArticleResult<ArticleList> {
        let limit = POPULAR_LIMIT.resolve(limit)?;
        tracing::debug!(limit, "人気記事を取得します");
        self.list_all(ArticleOrder::Popular, limit).await
    }

    // 絞り込みなしの先頭ページ。totalは全記事数。
    async fn list_all(&self, order: ArticleOrder, limit: i64) -> ArticleResult<ArticleList> {
        let articles = self
            .store
            .fetch_page(&ArticleFilter::default(), order, limit, 0)
            .await?;
        let total = self.store.count_all().await?;
        Ok(ArticleList { articles, total })
    }

    /// 記事を部分更新する（管理画面）。存在しなければNone。
    pub async fn update(&self, id: i32, update: ArticleUpdate) -> ArticleResult<Option<Article>> {
        if let Err(e) = update.validate() {
            tracing::warn!(id, error = %e, "記事更新の入力が不正です");
            return Err(e);
        }
        let updated = self.store.update(id, &update).await?;
        match updated {
            Some(_) => tracing::info!(id, touch_only = update.is_empty(), "記事を更新しました"),
            None => tracing::info!(id, "更新対象の記事が見つかりません"),
        }
        Ok(updated)
    }

    /// 記事を削除する（管理画面）。存在しなければfalse。
    pub async fn delete(&self, id: i32) -> ArticleResult<bool> {
        let deleted = self.store.delete(id).await?;
        tracing::info!(id, deleted, "記事の削除を実行しました");
        Ok(deleted)
    }

    /// 閲覧数を1増やす。存在しなければfalse。
    pub async fn increment_view(&self, id: i32) -> ArticleResult<bool> {
        let incremented = self.store.increment_view(id).await?;
        tracing::debug!(id, incremented, "閲覧数を更新しました");
        Ok(incremented)
    }

    /// 記事ページ表示: 閲覧数を数えてから、更新後の記事を返す
    pub async fn read_article(&self, id: i32) -> ArticleResult<Option<Article>> {
        if !self.increment_view(id).await? {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// トップページ用に注目・最新・人気の3セクションをまとめて取得する
    pub async fn homepage(&self) -> ArticleResult<Homepage> {
        let (featured, latest, popular) = tokio::try_join!(
            self.list_featured(Some(HOMEPAGE_FEATURED)),
            self.list_latest(Some(HOMEPAGE_LATEST)),
            self.list_popular(Some(HOMEPAGE_POPULAR)),
        )?;
        Ok(Homepage {
            featured,
            latest,
            popular,
        })
    }

    /// 検索結果ページ: タイトル・本文・抜粋から部分一致検索する
    pub async fn search(&self, text: &str) -> ArticleResult<ArticleList> {
        self.list_filtered(
            ArticleFilter::search(text),
            Some(SEARCH_RESULTS_LIMIT),
            Some(0),
        )
        .await
    }
}
