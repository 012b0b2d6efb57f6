use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kabarkini::domain::article::{
    ArticleFilter, ArticleService, ArticleUpdate, Category, NewArticle, Patch, PgArticleStore,
};
use kabarkini::domain::seed::{load_seed_articles, seed_articles};
use kabarkini::infra::db::{create_pool, health_check, setup_database};
use kabarkini::types::AppConfig;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// ニュース記事の管理・閲覧用CLI
#[derive(Debug, Parser)]
#[command(name = "kabarkini", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// マイグレーションを実行する
    Migrate,
    /// YAMLファイルからシード記事を投入する
    Seed {
        #[arg(default_value = "seeds/articles.yaml")]
        file: String,
    },
    /// データベースの疎通を確認する
    Health,
    /// トップページ（注目・最新・人気）を表示する
    Homepage,
    /// 条件で絞り込んだ記事一覧
    List {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        featured: Option<bool>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// カテゴリ別の記事一覧
    Category {
        category: Category,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// 注目記事
    Featured {
        #[arg(long)]
        limit: Option<i64>,
    },
    /// 最新記事
    Latest {
        #[arg(long)]
        limit: Option<i64>,
    },
    /// 人気記事
    Popular {
        #[arg(long)]
        limit: Option<i64>,
    },
    /// 記事を検索する
    Search { text: String },
    /// 記事を表示する（閲覧数は変えない）
    Show { id: i32 },
    /// 記事を読む（閲覧数を1増やしてから表示）
    Read { id: i32 },
    /// 記事を作成する
    Create(CreateArgs),
    /// 記事を部分更新する
    Update(UpdateArgs),
    /// 記事を削除する
    Delete { id: i32 },
    /// 閲覧数を1増やす
    View { id: i32 },
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    #[arg(long)]
    excerpt: String,
    #[arg(long)]
    category: Category,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    author: String,
    #[arg(long)]
    featured: bool,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: i32,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    excerpt: Option<String>,
    #[arg(long)]
    category: Option<Category>,
    #[arg(long, conflicts_with = "clear_image")]
    image_url: Option<String>,
    /// 画像URLを消去する
    #[arg(long)]
    clear_image: bool,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    featured: Option<bool>,
}

impl Command {
    /// スキーマを変更するのはmigrateとseedだけ
    fn runs_migrations(&self) -> bool {
        matches!(self, Command::Migrate | Command::Seed { .. })
    }
}

impl UpdateArgs {
    fn to_update(&self) -> ArticleUpdate {
        let image_url = if self.clear_image {
            Patch::Null
        } else {
            patch(self.image_url.clone())
        };
        ArticleUpdate {
            title: patch(self.title.clone()),
            content: patch(self.content.clone()),
            excerpt: patch(self.excerpt.clone()),
            category: patch(self.category),
            image_url,
            author: patch(self.author.clone()),
            is_featured: patch(self.featured),
        }
    }
}

// 引数が省略されたフィールドは変更しない
fn patch<T>(value: Option<T>) -> Patch<T> {
    value.map(Patch::Value).unwrap_or_default()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("JSONへの変換に失敗")?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kabarkini=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("設定の読み込みに失敗")?;

    let pool = if cli.command.runs_migrations() {
        setup_database(&config)
            .await
            .context("データベースの初期化に失敗")?
    } else {
        create_pool(&config)
            .await
            .context("データベースへの接続に失敗")?
    };
    let service = ArticleService::new(PgArticleStore::new(pool));

    match cli.command {
        Command::Migrate => {
            println!("マイグレーションが完了しました");
        }
        Command::Health => print_json(&health_check(service.store().pool()).await?)?,
        Command::Seed { file } => {
            let articles = load_seed_articles(&file)?;
            let result = seed_articles(&service, articles).await?;
            println!("{}", result);
        }
        Command::Homepage => print_json(&service.homepage().await?)?,
        Command::List {
            category,
            featured,
            search,
            limit,
            offset,
        } => {
            let filter = ArticleFilter {
                category,
                featured,
                search,
            };
            print_json(&service.list_filtered(filter, limit, offset).await?)?;
        }
        Command::Category {
            category,
            limit,
            offset,
        } => print_json(&service.list_by_category(category, limit, offset).await?)?,
        Command::Featured { limit } => print_json(&service.list_featured(limit).await?)?,
        Command::Latest { limit } => print_json(&service.list_latest(limit).await?)?,
        Command::Popular { limit } => print_json(&service.list_popular(limit).await?)?,
        Command::Search { text } => print_json(&service.search(&text).await?)?,
        Command::Show { id } => print_json(&service.get_by_id(id).await?)?,
        Command::Read { id } => print_json(&service.read_article(id).await?)?,
        Command::Create(args) => {
            let input = NewArticle {
                title: args.title,
                content: args.content,
                excerpt: args.excerpt,
                category: args.category,
                image_url: args.image_url,
                author: args.author,
                is_featured: args.featured,
            };
            print_json(&service.create(input).await?)?;
        }
        Command::Update(args) => {
            let update = args.to_update();
            print_json(&service.update(args.id, update).await?)?;
        }
        Command::Delete { id } => print_json(&service.delete(id).await?)?,
        Command::View { id } => print_json(&service.increment_view(id).await?)?,
    }

    Ok(())
}
