use crate::types::{ArticleError, ArticleResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// 記事カテゴリ（固定の4種類）
///
/// DBとJSONでは`Olahraga`/`Politik`/`Teknologi`/`Hiburan`のリテラルで表現する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "news_category")]
pub enum Category {
    #[serde(rename = "Olahraga")]
    #[sqlx(rename = "Olahraga")]
    Sports,
    #[serde(rename = "Politik")]
    #[sqlx(rename = "Politik")]
    Politics,
    #[serde(rename = "Teknologi")]
    #[sqlx(rename = "Teknologi")]
    Technology,
    #[serde(rename = "Hiburan")]
    #[sqlx(rename = "Hiburan")]
    Entertainment,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Sports,
        Category::Politics,
        Category::Technology,
        Category::Entertainment,
    ];

    /// 永続化・シリアライズ時のリテラル
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sports => "Olahraga",
            Category::Politics => "Politik",
            Category::Technology => "Teknologi",
            Category::Entertainment => "Hiburan",
        }
    }

    fn english_name(&self) -> &'static str {
        match self {
            Category::Sports => "sports",
            Category::Politics => "politics",
            Category::Technology => "technology",
            Category::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ArticleError;

    /// リテラル（`Politik`）と英語名（`politics`）のどちらも大文字小文字を区別せずに受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(needle) || c.english_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| {
                ArticleError::validation(
                    "category",
                    format!("未知のカテゴリです: {} (Olahraga, Politik, Teknologi, Hiburan)", s),
                )
            })
    }
}

// 記事エンティティ（news_articlesテーブルの1行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: Category,
    pub image_url: Option<String>,
    pub author: String,
    pub is_featured: bool,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// 記事作成の入力（id、閲覧数、タイムスタンプはストア側で設定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: Category,
    #[serde(default)]
    pub image_url: Option<String>,
    pub author: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl NewArticle {
    /// 必須テキスト項目が空でないことを検証する
    pub fn validate(&self) -> ArticleResult<()> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)?;
        require_text("excerpt", &self.excerpt)?;
        require_text("author", &self.author)?;
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> ArticleResult<()> {
    if value.trim().is_empty() {
        return Err(ArticleError::validation(field, "空にはできません"));
    }
    Ok(())
}

/// 部分更新の1フィールド分の指定
///
/// - `Absent`: 変更しない（JSONにキーがない）
/// - `Null`: 値を消去する（JSONの`null`）
/// - `Value`: 値を設定する
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// 現在値にこの指定を適用した結果を返す（nullable列用）
    pub fn apply_nullable(&self, current: Option<T>) -> Option<T>
    where
        T: Clone,
    {
        match self {
            Patch::Absent => current,
            Patch::Null => None,
            Patch::Value(v) => Some(v.clone()),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Value(value)
    }
}

// キーなしは#[serde(default)]でAbsentになり、ここにはnullか値だけが来る
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Value(v) => v.serialize(serializer),
            Patch::Absent | Patch::Null => serializer.serialize_none(),
        }
    }
}

// 記事の部分更新の入力（id、閲覧数、タイムスタンプは対象外）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticleUpdate {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub content: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub excerpt: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub category: Patch<Category>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub image_url: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub author: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub is_featured: Patch<bool>,
}

impl ArticleUpdate {
    /// 変更対象のフィールドが1つもないか
    pub fn is_empty(&self) -> bool {
        self.title.is_absent()
            && self.content.is_absent()
            && self.excerpt.is_absent()
            && self.category.is_absent()
            && self.image_url.is_absent()
            && self.author.is_absent()
            && self.is_featured.is_absent()
    }

    /// 指定されたフィールドを検証する
    ///
    /// `null`で消去できるのは`image_url`だけ。
    pub fn validate(&self) -> ArticleResult<()> {
        required_text_patch("title", &self.title)?;
        required_text_patch("content", &self.content)?;
        required_text_patch("excerpt", &self.excerpt)?;
        required_text_patch("author", &self.author)?;
        if matches!(self.category, Patch::Null) {
            return Err(ArticleError::validation("category", "nullにはできません"));
        }
        if matches!(self.is_featured, Patch::Null) {
            return Err(ArticleError::validation("is_featured", "nullにはできません"));
        }
        Ok(())
    }
}

fn required_text_patch(field: &str, patch: &Patch<String>) -> ArticleResult<()> {
    match patch {
        Patch::Absent => Ok(()),
        Patch::Null => Err(ArticleError::validation(field, "nullにはできません")),
        Patch::Value(v) => require_text(field, v),
    }
}

/// 一覧取得の結果（ページ内の記事と、ページ範囲を無視した総件数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleList {
    pub articles: Vec<Article>,
    pub total: i64,
}

impl ArticleList {
    pub fn empty() -> Self {
        Self {
            articles: Vec::new(),
            total: 0,
        }
    }

    /// 総ページ数（ceil(total / limit)）
    pub fn page_count(&self, limit: i64) -> i64 {
        if limit <= 0 {
            return 0;
        }
        (self.total + limit - 1) / limit
    }

    /// このページの後ろにまだ記事があるか
    pub fn has_more(&self, offset: i64) -> bool {
        offset + (self.articles.len() as i64) < self.total
    }
}
