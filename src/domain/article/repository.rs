use super::model::{Article, ArticleList, ArticleUpdate, NewArticle, Patch};
use super::query::{ArticleFilter, ArticleOrder};
use crate::types::{ArticleError, ArticleResult};
use async_trait::async_trait;
use sqlx::postgres::PgDatabaseError;
use sqlx::query_builder::Separated;
use sqlx::{Encode, PgPool, Postgres, QueryBuilder, Type};

/// 記事ストアの抽象化トレイト
///
/// PostgreSQL実装とメモリ実装の両方を統一的に扱えるようにするためのインターフェースです。
/// 記事が存在しない場合はエラーではなく`None`/`false`を返します。
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// 記事を追加する（id、タイムスタンプ、閲覧数0はストア側で設定）
    async fn insert(&self, article: &NewArticle) -> ArticleResult<Article>;

    /// idで記事を1件取得する
    async fn find_by_id(&self, id: i32) -> ArticleResult<Option<Article>>;

    /// 条件に一致する記事を1ページ分取得する
    async fn fetch_page(
        &self,
        filter: &ArticleFilter,
        order: ArticleOrder,
        limit: i64,
        offset: i64,
    ) -> ArticleResult<Vec<Article>>;

    /// 条件に一致する記事の件数
    async fn count(&self, filter: &ArticleFilter) -> ArticleResult<i64>;

    /// 全記事数
    async fn count_all(&self) -> ArticleResult<i64>;

    /// 条件に一致する記事のページと、ページ範囲を無視した総件数を取得する
    ///
    /// ページと件数は別々に取得するため、厳密な一貫性は保証しない。
    async fn list(
        &self,
        filter: &ArticleFilter,
        order: ArticleOrder,
        limit: i64,
        offset: i64,
    ) -> ArticleResult<ArticleList> {
        let articles = self.fetch_page(filter, order, limit, offset).await?;
        let total = self.count(filter).await?;
        Ok(ArticleList { articles, total })
    }

    /// 指定フィールドだけを更新する。updated_atは常に更新される。
    async fn update(&self, id: i32, update: &ArticleUpdate) -> ArticleResult<Option<Article>>;

    /// 閲覧数を1増やす。対象が存在すればtrue。
    async fn increment_view(&self, id: i32) -> ArticleResult<bool>;

    /// 記事を削除する。対象が存在すればtrue。
    async fn delete(&self, id: i32) -> ArticleResult<bool>;
}

// updated_atを単調増加させつつ現在時刻に寄せる
const TOUCH_UPDATED_AT: &str =
    "updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')";

/// PostgreSQLを使用した記事ストア
#[derive(Debug, Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn insert(&self, article: &NewArticle) -> ArticleResult<Article> {
        sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO news_articles (title, content, excerpt, category, image_url, author, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, content, excerpt, category, image_url, author,
                      is_featured, view_count, created_at, updated_at
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(article.category)
        .bind(&article.image_url)
        .bind(&article.author)
        .bind(article.is_featured)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("記事の作成", e))
    }

    async fn find_by_id(&self, id: i32) -> ArticleResult<Option<Article>> {
        sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, content, excerpt, category, image_url, author,
                   is_featured, view_count, created_at, updated_at
            FROM news_articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("記事の取得", e))
    }

    async fn fetch_page(
        &self,
        filter: &ArticleFilter,
        order: ArticleOrder,
        limit: i64,
        offset: i64,
    ) -> ArticleResult<Vec<Article>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, title, content, excerpt, category, image_url, author,
                   is_featured, view_count, created_at, updated_at
            FROM news_articles
            "#,
        );
        filter.push_where(&mut qb);
        qb.push(order.order_by_clause());
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        qb.build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("記事一覧の取得", e))
    }

    async fn count(&self, filter: &ArticleFilter) -> ArticleResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM news_articles");
        filter.push_where(&mut qb);
        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("記事件数の取得", e))
    }

    async fn count_all(&self) -> ArticleResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news_articles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("全記事数の取得", e))
    }

    async fn update(&self, id: i32, update: &ArticleUpdate) -> ArticleResult<Option<Article>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE news_articles SET ");
        {
            let mut set = qb.separated(", ");
            push_patch(&mut set, "title", &update.title);
            push_patch(&mut set, "content", &update.content);
            push_patch(&mut set, "excerpt", &update.excerpt);
            push_patch(&mut set, "category", &update.category);
            push_patch(&mut set, "image_url", &update.image_url);
            push_patch(&mut set, "author", &update.author);
            push_patch(&mut set, "is_featured", &update.is_featured);
            set.push(TOUCH_UPDATED_AT);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(
            r#"
            RETURNING id, title, content, excerpt, category, image_url, author,
                      is_featured, view_count, created_at, updated_at
            "#,
        );

        qb.build_query_as::<Article>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("記事の更新", e))
    }

    async fn increment_view(&self, id: i32) -> ArticleResult<bool> {
        // 読み出してから書き戻すのではなく、1文で加算する
        let sql = format!(
            "UPDATE news_articles SET view_count = view_count + 1, {} WHERE id = $1",
            TOUCH_UPDATED_AT
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("閲覧数の更新", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i32) -> ArticleResult<bool> {
        let result = sqlx::query("DELETE FROM news_articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("記事の削除", e))?;

        Ok(result.rows_affected() > 0)
    }
}

/// SET句に1フィールド分の代入を追加する
fn push_patch<'args, T>(
    set: &mut Separated<'_, 'args, Postgres, &'static str>,
    column: &'static str,
    patch: &Patch<T>,
) where
    T: Clone + Send + 'args + Encode<'args, Postgres> + Type<Postgres>,
{
    match patch {
        Patch::Absent => {}
        Patch::Null => {
            set.push(format!("{} = NULL", column));
        }
        Patch::Value(value) => {
            set.push(format!("{} = ", column))
                .push_bind_unseparated(value.clone());
        }
    }
}

/// 制約違反は検証エラー、それ以外はデータベースエラーに変換する
fn store_error(operation: &str, err: sqlx::Error) -> ArticleError {
    if let sqlx::Error::Database(ref db_err) = err {
        // 23502: not_null_violation, 23514: check_violation
        let code = db_err.code();
        if matches!(code.as_deref(), Some("23502") | Some("23514")) {
            let column = db_err
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(PgDatabaseError::column);
            let field = violated_field(column, db_err.constraint());
            return ArticleError::validation(field, db_err.message().to_string());
        }
    }
    ArticleError::database(operation, err)
}

// NOT NULL違反は列名、CHECK違反は`<table>_<column>_check`の制約名から列名を取り出す
fn violated_field(column: Option<&str>, constraint: Option<&str>) -> String {
    if let Some(column) = column {
        return column.to_string();
    }
    match constraint {
        Some(name) => name
            .strip_prefix("news_articles_")
            .and_then(|rest| rest.strip_suffix("_check"))
            .unwrap_or(name)
            .to_string(),
        None => "news_articles".to_string(),
    }
}
