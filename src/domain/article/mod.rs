#[cfg(test)]
pub mod mock;
pub mod model;
pub mod query;
pub mod repository;
pub mod service;

// 公開APIの再エクスポート

// model.rsから
pub use model::{Article, ArticleList, ArticleUpdate, Category, NewArticle, Patch};

// query.rsから
pub use query::{ArticleFilter, ArticleOrder};

// repository.rsから
pub use repository::{ArticleStore, PgArticleStore};

// テスト用のメモリ上のストア
#[cfg(test)]
pub use mock::MockArticleStore;

// service.rsから
pub use service::{
    ArticleService, Homepage, LimitBounds, CATEGORY_LIMIT, FEATURED_LIMIT, FILTERED_LIMIT,
    LATEST_LIMIT, POPULAR_LIMIT,
};
