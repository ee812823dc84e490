//! # Seed Data Generator
//!
//! Creates a small blog database and reads it back through the generic
//! repository.
//!
//! ## Usage
//! ```bash
//! # 3 authors into ./ezrepo_dev.db (default)
//! cargo run -p ezrepo-db --bin seed
//!
//! # Custom amount
//! cargo run -p ezrepo-db --bin seed -- --authors 10
//!
//! # Specify database path (otherwise EZREPO_DB_PATH or ./ezrepo_dev.db)
//! cargo run -p ezrepo-db --bin seed -- --db ./data/blog.db
//! ```
//!
//! ## Generated Data
//! Each author gets two posts; each post gets three images and one video.

use std::env;

use chrono::{DateTime, Utc};
use ezrepo_core::{auto_preloads, exported_fields_of, validate_model};
use ezrepo_db::{
    connect, describe_record, has_many, save_has_many, unknown_relation, wrap, Crud, DbConfig,
    DbResult, Entity, Scope, SqlValue,
};
use futures::future::BoxFuture;
use sqlx::{FromRow, SqlitePool};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        published_at TEXT NOT NULL,
        author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS images (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS videos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE
    )",
];

// =============================================================================
// Models
// =============================================================================

#[derive(Debug, Clone, Default, FromRow)]
struct Author {
    id: Option<i64>,
    username: String,
    #[sqlx(skip)]
    posts: Vec<Post>,
}

describe_record! {
    Author {
        id: Option<i64>,
        pub username: String,
        pub posts: Vec<Post>,
    }
}

impl Entity for Author {
    const TABLE: &'static str = "authors";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("username", self.username.clone().into())]
    }

    fn preload<'a>(
        items: Vec<&'a mut Self>,
        relation: &'a str,
        rest: &'a [&'a str],
        scope: &'a Scope,
        pool: &'a SqlitePool,
    ) -> BoxFuture<'a, DbResult<()>> {
        match relation {
            "posts" => has_many(items, "author_id", |a: &mut Author| &mut a.posts, rest, scope, pool),
            _ => unknown_relation::<Self>(relation),
        }
    }

    fn save_relations<'a>(&'a mut self, pool: &'a SqlitePool) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            let Some(id) = self.id else {
                return Ok(());
            };
            save_has_many(&mut self.posts, pool, move |post: &mut Post| post.author_id = id).await
        })
    }
}

impl Crud for Author {}

#[derive(Debug, Clone, FromRow)]
struct Post {
    id: Option<i64>,
    slug: String,
    title: String,
    published_at: DateTime<Utc>,
    author_id: i64,
    #[sqlx(skip)]
    images: Vec<Image>,
    #[sqlx(skip)]
    videos: Vec<Video>,
    // Derived from the title, never stored.
    #[sqlx(skip)]
    keywords: Vec<String>,
}

describe_record! {
    Post {
        id: Option<i64>,
        pub slug: String,
        pub title: String,
        pub published_at: DateTime<Utc>,
        pub author_id: i64,
        pub images: Vec<Image>,
        pub videos: Vec<Video>,
        #[tag = r#"ezg:"no-preload""#]
        pub keywords: Vec<String>,
    }
}

impl Post {
    fn new(title: String) -> Self {
        let keywords = title.split_whitespace().map(str::to_lowercase).collect();
        Post {
            id: None,
            slug: Uuid::new_v4().to_string(),
            title,
            published_at: Utc::now(),
            author_id: 0,
            images: Vec::new(),
            videos: Vec::new(),
            keywords,
        }
    }
}

impl Entity for Post {
    const TABLE: &'static str = "posts";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("slug", self.slug.clone().into()),
            ("title", self.title.clone().into()),
            ("published_at", self.published_at.into()),
            ("author_id", self.author_id.into()),
        ]
    }

    fn preload<'a>(
        items: Vec<&'a mut Self>,
        relation: &'a str,
        rest: &'a [&'a str],
        scope: &'a Scope,
        pool: &'a SqlitePool,
    ) -> BoxFuture<'a, DbResult<()>> {
        match relation {
            "images" => has_many(items, "post_id", |p: &mut Post| &mut p.images, rest, scope, pool),
            "videos" => has_many(items, "post_id", |p: &mut Post| &mut p.videos, rest, scope, pool),
            _ => unknown_relation::<Self>(relation),
        }
    }

    fn save_relations<'a>(&'a mut self, pool: &'a SqlitePool) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            let Some(id) = self.id else {
                return Ok(());
            };
            save_has_many(&mut self.images, pool, move |i: &mut Image| i.post_id = id).await?;
            save_has_many(&mut self.videos, pool, move |v: &mut Video| v.post_id = id).await
        })
    }
}

impl Crud for Post {}

#[derive(Debug, Clone, Default, FromRow)]
struct Image {
    id: Option<i64>,
    title: String,
    post_id: i64,
}

describe_record! { Image { id: Option<i64>, pub title: String, pub post_id: i64 } }

impl Entity for Image {
    const TABLE: &'static str = "images";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("title", self.title.clone().into()), ("post_id", self.post_id.into())]
    }
}

impl Crud for Image {}

#[derive(Debug, Clone, Default, FromRow)]
struct Video {
    id: Option<i64>,
    title: String,
    post_id: i64,
}

describe_record! { Video { id: Option<i64>, pub title: String, pub post_id: i64 } }

impl Entity for Video {
    const TABLE: &'static str = "videos";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("title", self.title.clone().into()), ("post_id", self.post_id.into())]
    }
}

impl Crud for Video {}

// =============================================================================
// Main
// =============================================================================

/// Initializes logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show generated SQL and preload steps
/// - `RUST_LOG=ezrepo_core=trace` - Show every discovered preload path
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ezrepo_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut authors: usize = 3;
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--authors" | "-a" => {
                if i + 1 < args.len() {
                    authors = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ezrepo Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -a, --authors <N>  Number of authors to generate (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: $EZREPO_DB_PATH or ./ezrepo_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = match db_path {
        Some(path) => DbConfig::new(path),
        None if env::var("EZREPO_DB_PATH").is_ok() => DbConfig::from_env()?,
        None => DbConfig::new("./ezrepo_dev.db"),
    };

    println!("🌱 ezrepo Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.database_path.display());
    println!("Authors:  {}", authors);
    println!();

    // Descriptors
    validate_model::<Author>()?;
    println!("✓ Model descriptors valid");
    println!("  Author preloads: {:?}", auto_preloads::<Author>());
    println!("  Post preloads:   {:?}", auto_preloads::<Post>());
    println!("  Post fields:     {}", serde_json::to_string(&exported_fields_of::<Post>())?);
    println!();

    // Connect and create tables
    let pool = connect(&config).await?;
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(&pool).await?;
    }
    println!("✓ Connected to database");

    let existing = wrap(&mut Author::default()).count(&pool).await?;
    if existing > 0 {
        println!("⚠ Database already has {} authors", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
    } else {
        let start = std::time::Instant::now();
        for n in 1..=authors {
            let mut author = generate_author(n);
            wrap(&mut author).insert(&pool).await?;
        }
        info!(authors = authors, elapsed = ?start.elapsed(), "Seed data inserted");
        println!("✓ Generated {} authors in {:?}", authors, start.elapsed());
    }

    // Read back
    println!();
    let found = wrap(&mut Author::default()).find_paginated(&pool, None, Some(1), false).await?;
    if let Some(author) = found.first() {
        println!("First author: {}", author.username);
        for post in &author.posts {
            println!(
                "  {} ({} images, {} videos)",
                post.title,
                post.images.len(),
                post.videos.len()
            );
        }
    }

    let images = wrap(&mut Image::default()).count(&pool).await?;
    let covers = wrap(&mut Image::default())
        .count_sql(&pool, "title LIKE ?", &["%cover%".into()])
        .await?;
    println!("Images: {} total, {} covers", images, covers);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one author with two posts, three images and a video per post.
fn generate_author(n: usize) -> Author {
    let posts = (1..=2)
        .map(|p| {
            let mut post = Post::new(format!("Post {} by author {}", p, n));
            post.images = ["cover", "inline", "footer"]
                .iter()
                .map(|kind| Image {
                    title: format!("{} image {}-{}", kind, n, p),
                    ..Default::default()
                })
                .collect();
            post.videos = vec![Video {
                title: format!("video {}-{}", n, p),
                ..Default::default()
            }];
            post
        })
        .collect();

    Author {
        username: format!("author{}", n),
        posts,
        ..Default::default()
    }
}
