use super::model::{Article, ArticleUpdate, NewArticle, Patch};
use super::query::{ArticleFilter, ArticleOrder};
use super::repository::ArticleStore;
use crate::types::ArticleResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// テスト用のメモリ上の記事ストア
///
/// PostgreSQL実装と同じ意味論（AND結合のフィルター、並び順、updated_atの単調増加）を持ち、
/// ストアが呼ばれた回数を記録します。
#[derive(Debug, Default)]
pub struct MockArticleStore {
    state: Mutex<MemoryState>,
    calls: AtomicUsize,
}

#[derive(Debug, Default)]
struct MemoryState {
    articles: Vec<Article>,
    next_id: i32,
}

impl MockArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ストアのメソッドが呼ばれた回数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> MutexGuard<'_, MemoryState> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let floor = previous + Duration::microseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}

fn apply_required<T: Clone>(patch: &Patch<T>, current: &mut T) {
    if let Patch::Value(value) = patch {
        *current = value.clone();
    }
}

#[async_trait]
impl ArticleStore for MockArticleStore {
    async fn insert(&self, article: &NewArticle) -> ArticleResult<Article> {
        article.validate()?;
        let mut state = self.enter();
        state.next_id += 1;
        let now = Utc::now();
        let stored = Article {
            id: state.next_id,
            title: article.title.clone(),
            content: article.content.clone(),
            excerpt: article.excerpt.clone(),
            category: article.category,
            image_url: article.image_url.clone(),
            author: article.author.clone(),
            is_featured: article.is_featured,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.articles.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i32) -> ArticleResult<Option<Article>> {
        let state = self.enter();
        Ok(state.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn fetch_page(
        &self,
        filter: &ArticleFilter,
        order: ArticleOrder,
        limit: i64,
        offset: i64,
    ) -> ArticleResult<Vec<Article>> {
        let state = self.enter();
        let mut matched: Vec<Article> = state
            .articles
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        order.sort(&mut matched);

        Ok(matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: &ArticleFilter) -> ArticleResult<i64> {
        let state = self.enter();
        Ok(state.articles.iter().filter(|a| filter.matches(a)).count() as i64)
    }

    async fn count_all(&self) -> ArticleResult<i64> {
        let state = self.enter();
        Ok(state.articles.len() as i64)
    }

    async fn update(&self, id: i32, update: &ArticleUpdate) -> ArticleResult<Option<Article>> {
        update.validate()?;
        let mut state = self.enter();
        let Some(article) = state.articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        apply_required(&update.title, &mut article.title);
        apply_required(&update.content, &mut article.content);
        apply_required(&update.excerpt, &mut article.excerpt);
        apply_required(&update.category, &mut article.category);
        apply_required(&update.author, &mut article.author);
        apply_required(&update.is_featured, &mut article.is_featured);
        article.image_url = update.image_url.apply_nullable(article.image_url.take());
        article.updated_at = touch(article.updated_at);

        Ok(Some(article.clone()))
    }

    async fn increment_view(&self, id: i32) -> ArticleResult<bool> {
        let mut state = self.enter();
        match state.articles.iter_mut().find(|a| a.id == id) {
            Some(article) => {
                article.view_count += 1;
                article.updated_at = touch(article.updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i32) -> ArticleResult<bool> {
        let mut state = self.enter();
        let before = state.articles.len();
        state.articles.retain(|a| a.id != id);
        Ok(state.articles.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::model::Category;

    fn new_article(title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            content: "本文".to_string(),
            excerpt: "抜粋".to_string(),
            category: Category::Sports,
            image_url: Some("https://example.com/a.jpg".to_string()),
            author: "記者".to_string(),
            is_featured: false,
        }
    }

    #[tokio::test]
    async fn test_mock_store_lifecycle() -> Result<(), anyhow::Error> {
        let store = MockArticleStore::new();
        let first = store.insert(&new_article("1件目")).await?;
        let second = store.insert(&new_article("2件目")).await?;
        assert_ne!(first.id, second.id);

        assert!(store.increment_view(first.id).await?);
        let update = ArticleUpdate {
            image_url: Patch::Null,
            ..Default::default()
        };
        let updated = store.update(first.id, &update).await?.expect("記事が存在するべき");
        assert_eq!(updated.view_count, 1);
        assert_eq!(updated.image_url, None);
        assert!(updated.updated_at > first.updated_at);

        assert!(store.delete(second.id).await?);
        assert!(!store.delete(second.id).await?);
        assert!(store.find_by_id(second.id).await?.is_none());
        assert_eq!(store.call_count(), 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_store_counts() -> Result<(), anyhow::Error> {
        let store = MockArticleStore::new();
        let mut featured = new_article("注目");
        featured.is_featured = true;
        store.insert(&featured).await?;
        store.insert(&new_article("通常1")).await?;
        store.insert(&new_article("通常2")).await?;

        assert_eq!(store.count_all().await?, 3);
        assert_eq!(store.count(&ArticleFilter::featured_only()).await?, 1);

        // listはページと件数を別々に取得する
        let list = store
            .list(&ArticleFilter::default(), ArticleOrder::Latest, 2, 0)
            .await?;
        assert_eq!(list.articles.len(), 2);
        assert_eq!(list.total, 3);
        assert_eq!(store.call_count(), 3 + 2 + 2);
        Ok(())
    }
}
