use super::model::{Article, Category};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

// 記事一覧のフィルター条件を表す構造体
// 指定された条件だけをANDで結合する
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFilter {
    pub category: Option<Category>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

impl ArticleFilter {
    pub fn by_category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }

    pub fn featured_only() -> Self {
        Self {
            featured: Some(true),
            ..Default::default()
        }
    }

    pub fn search<S: Into<String>>(text: S) -> Self {
        Self {
            search: Some(text.into()),
            ..Default::default()
        }
    }

    /// 検索語を前後の空白を除いて正規化する。空白だけの検索語は未指定として扱う。
    pub fn normalized(&self) -> Self {
        Self {
            category: self.category,
            featured: self.featured,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    pub fn has_conditions(&self) -> bool {
        let normalized = self.normalized();
        normalized.category.is_some() || normalized.featured.is_some() || normalized.search.is_some()
    }

    /// 条件をWHERE句としてクエリに追加する（条件がなければ何もしない）
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let filter = self.normalized();
        if !filter.has_conditions() {
            return;
        }

        qb.push(" WHERE ");
        let mut separated = qb.separated(" AND ");

        if let Some(category) = filter.category {
            separated.push("category = ").push_bind_unseparated(category);
        }
        if let Some(featured) = filter.featured {
            separated.push("is_featured = ").push_bind_unseparated(featured);
        }
        if let Some(ref search) = filter.search {
            let pattern = like_pattern(search);
            separated
                .push("(title ILIKE ")
                .push_bind_unseparated(pattern.clone())
                .push_unseparated(" OR content ILIKE ")
                .push_bind_unseparated(pattern.clone())
                .push_unseparated(" OR excerpt ILIKE ")
                .push_bind_unseparated(pattern)
                .push_unseparated(")");
        }
    }

    /// メモリ上の記事が条件に一致するか（SQL側と同じ意味）
    pub fn matches(&self, article: &Article) -> bool {
        let filter = self.normalized();
        if let Some(category) = filter.category {
            if article.category != category {
                return false;
            }
        }
        if let Some(featured) = filter.featured {
            if article.is_featured != featured {
                return false;
            }
        }
        if let Some(ref search) = filter.search {
            let needle = search.to_lowercase();
            let found = [&article.title, &article.content, &article.excerpt]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }
        true
    }
}

/// 部分一致検索用のLIKEパターン。`%`、`_`、`\`はそのままの文字として扱う。
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// 一覧の並び順（新着順と人気順の2種類のみ）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleOrder {
    #[default]
    Latest,
    Popular,
}

impl ArticleOrder {
    pub fn order_by_clause(&self) -> &'static str {
        match self {
            ArticleOrder::Latest => " ORDER BY created_at DESC, id DESC",
            ArticleOrder::Popular => " ORDER BY view_count DESC, created_at DESC, id DESC",
        }
    }

    /// メモリ上の記事を同じ順序で並べ替える
    pub fn sort(&self, articles: &mut [Article]) {
        match self {
            ArticleOrder::Latest => articles.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
            }),
            ArticleOrder::Popular => articles.sort_by(|a, b| {
                b.view_count
                    .cmp(&a.view_count)
                    .then_with(|| b.created_at.cmp(&a.created_at))
                    .then_with(|| b.id.cmp(&a.id))
            }),
        }
    }
}
