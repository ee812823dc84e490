//! Repository tests against an in-memory SQLite database.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{FromRow, SqlitePool};

use super::preload::{belongs_to, has_many, save_has_many, unknown_relation};
use super::{wrap, Crud};
use crate::entity::{Entity, PreloadFn, Scope};
use crate::error::{DbError, DbResult};
use crate::pool::{connect, DbConfig};
use crate::value::SqlValue;
use ezrepo_core::{describe_record, PreloadSpec};

// =============================================================================
// Fixtures
// =============================================================================

const SCHEMA: &[&str] = &[
    "CREATE TABLE authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE DEFAULT ''
    )",
    "CREATE TABLE posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL DEFAULT '',
        author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE
    )",
    "CREATE TABLE imgs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL DEFAULT '',
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE
    )",
    "CREATE TABLE vids (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL DEFAULT '',
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE
    )",
    "CREATE TABLE foos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE bars (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        foo_id INTEGER NOT NULL REFERENCES foos(id)
    )",
    "CREATE TABLE tokens (id INTEGER PRIMARY KEY AUTOINCREMENT)",
];

async fn setup() -> SqlitePool {
    let pool = connect(&DbConfig::in_memory()).await.unwrap();
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }
    pool
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
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

impl Author {
    fn named(username: &str) -> Self {
        Author {
            username: username.to_string(),
            ..Default::default()
        }
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

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
struct Post {
    id: Option<i64>,
    title: String,
    content: String,
    author_id: i64,
    #[sqlx(skip)]
    images: Vec<Img>,
    #[sqlx(skip)]
    videos: Vec<Vid>,
}

describe_record! {
    Post {
        id: Option<i64>,
        pub title: String,
        pub content: String,
        pub author_id: i64,
        pub images: Vec<Img>,
        pub videos: Vec<Vid>,
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
            ("title", self.title.clone().into()),
            ("content", self.content.clone().into()),
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
            save_has_many(&mut self.images, pool, move |img: &mut Img| img.post_id = id).await?;
            save_has_many(&mut self.videos, pool, move |vid: &mut Vid| vid.post_id = id).await
        })
    }
}

impl Crud for Post {}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
struct Img {
    id: Option<i64>,
    title: String,
    post_id: i64,
}

describe_record! { Img { id: Option<i64>, pub title: String, pub post_id: i64 } }

impl Entity for Img {
    const TABLE: &'static str = "imgs";

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

impl Crud for Img {}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
struct Vid {
    id: Option<i64>,
    title: String,
    post_id: i64,
}

describe_record! { Vid { id: Option<i64>, pub title: String, pub post_id: i64 } }

impl Entity for Vid {
    const TABLE: &'static str = "vids";

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

impl Crud for Vid {}

fn img(title: &str) -> Img {
    Img {
        title: title.to_string(),
        ..Default::default()
    }
}

/// Inserts one author with one post holding three images and one video.
async fn seed(pool: &SqlitePool) -> Author {
    let mut author = Author {
        username: "SomeUser".to_string(),
        posts: vec![Post {
            title: "Lorem ipsum".to_string(),
            content: "Lorem ipsum dolor sit amet".to_string(),
            images: vec![
                img("Lorem ipsum image"),
                img("Lorem ipsum 2 image"),
                img("Lorem ipsum 3 image"),
            ],
            videos: vec![Vid {
                title: "Lorem ipsum video".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    wrap(&mut author).insert(pool).await.unwrap();
    author
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_insert_sets_keys_through_relations() {
    let pool = setup().await;
    let author = seed(&pool).await;

    assert_eq!(author.id, Some(1));
    let post = &author.posts[0];
    assert_eq!(post.id, Some(1));
    assert_eq!(post.author_id, 1);
    assert!(post.images.iter().all(|i| i.id.is_some() && i.post_id == 1));
    assert_eq!(post.videos[0].post_id, 1);
}

#[tokio::test]
async fn test_update_changes_columns_and_adds_children() {
    let pool = setup().await;
    let author = seed(&pool).await;

    let mut post = author.posts[0].clone();
    post.title = "Changed".to_string();
    post.images.push(img("Fresh image"));
    wrap(&mut post).update(&pool).await.unwrap();

    let mut example = Post {
        id: post.id,
        ..Default::default()
    };
    let stored = wrap(&mut example).find_one(&pool).await.unwrap().unwrap();
    assert_eq!(stored.title, "Changed");
    assert_eq!(stored.images.len(), 4);
    assert_eq!(wrap(&mut Img::default()).count(&pool).await.unwrap(), 4);
}

#[tokio::test]
async fn test_update_without_key_inserts() {
    let pool = setup().await;
    let mut author = Author::named("Fresh");
    wrap(&mut author).update(&pool).await.unwrap();

    assert!(author.id.is_some());
    assert_eq!(wrap(&mut Author::default()).count(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_with_unknown_key_inserts_that_key() {
    let pool = setup().await;
    seed(&pool).await;

    let mut vid = Vid {
        id: Some(42),
        title: "Late video".to_string(),
        post_id: 1,
    };
    wrap(&mut vid).update(&pool).await.unwrap();

    let mut example = Vid {
        id: Some(42),
        ..Default::default()
    };
    let stored = wrap(&mut example).find_one(&pool).await.unwrap().unwrap();
    assert_eq!(stored.title, "Late video");
}

#[tokio::test]
async fn test_delete_removes_row() {
    let pool = setup().await;
    let author = seed(&pool).await;

    let mut post = author.posts[0].clone();
    wrap(&mut post).delete(&pool).await.unwrap();

    let found = wrap(&mut Author::named("SomeUser")).find_one(&pool).await.unwrap().unwrap();
    assert!(found.posts.is_empty());
    assert_eq!(wrap(&mut Img::default()).count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_without_key_fails() {
    let pool = setup().await;

    let err = wrap(&mut Post::default()).delete(&pool).await.unwrap_err();
    assert!(matches!(err, DbError::MissingPrimaryKey { .. }));
    assert!(err.to_string().contains("Post has no primary key"));
}

#[tokio::test]
async fn test_constraint_errors_are_mapped() {
    let pool = setup().await;
    seed(&pool).await;

    let err = wrap(&mut Author::named("SomeUser")).insert(&pool).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::UniqueViolation { ref field, .. } if field == "authors.username"
    ));

    let mut orphan = Post {
        title: "Orphan".to_string(),
        author_id: 999,
        ..Default::default()
    };
    let err = wrap(&mut orphan).insert(&pool).await.unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    assert!(orphan.id.is_none());
}

/// Row with nothing but its key.
#[derive(Debug, Clone, Default, FromRow)]
struct Token {
    id: Option<i64>,
}

describe_record! { Token { id: Option<i64> } }

impl Entity for Token {
    const TABLE: &'static str = "tokens";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        Vec::new()
    }
}

impl Crud for Token {}

#[tokio::test]
async fn test_update_key_only_row() {
    let pool = setup().await;

    let mut token = Token { id: Some(7) };
    wrap(&mut token).update(&pool).await.unwrap();
    assert_eq!(wrap(&mut Token::default()).count(&pool).await.unwrap(), 1);

    // Saving an existing key-only row leaves it alone.
    wrap(&mut token).update(&pool).await.unwrap();
    let ids: Vec<_> = wrap(&mut Token::default())
        .find(&pool)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![Some(7)]);

    let mut fresh = Token::default();
    wrap(&mut fresh).update(&pool).await.unwrap();
    assert_eq!(fresh.id, Some(8));
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_find_one_preloads_nested_relations() {
    let pool = setup().await;
    seed(&pool).await;

    let found = wrap(&mut Author::named("SomeUser")).find_one(&pool).await.unwrap().unwrap();
    assert_eq!(found.posts.len(), 1);
    assert_eq!(found.posts[0].images.len(), 3);
    assert_eq!(found.posts[0].videos.len(), 1);
    assert_eq!(found.posts[0].images[0].title, "Lorem ipsum image");
}

#[tokio::test]
async fn test_has_many_splits_children_between_parents() {
    let pool = setup().await;

    let post = |title: &str| Post {
        title: title.to_string(),
        ..Default::default()
    };
    let mut first = Author {
        username: "first".to_string(),
        posts: vec![post("a1"), post("a2")],
        ..Default::default()
    };
    wrap(&mut first).insert(&pool).await.unwrap();
    let mut second = Author {
        username: "second".to_string(),
        posts: vec![post("b1")],
        ..Default::default()
    };
    wrap(&mut second).insert(&pool).await.unwrap();

    // A later post for the first author lands after the second author's key.
    first.posts.push(post("a3"));
    wrap(&mut first).update(&pool).await.unwrap();

    let authors = wrap(&mut Author::default()).find(&pool).await.unwrap();
    let titles: Vec<Vec<&str>> = authors
        .iter()
        .map(|a| a.posts.iter().map(|p| p.title.as_str()).collect())
        .collect();
    assert_eq!(titles, vec![vec!["a1", "a2", "a3"], vec!["b1"]]);

    let first_ids: Vec<_> = authors[0].posts.iter().map(|p| p.id).collect();
    assert_eq!(first_ids, vec![Some(1), Some(2), Some(4)]);
    assert!(authors
        .iter()
        .all(|a| a.posts.iter().all(|p| Some(p.author_id) == a.id)));
}

#[tokio::test]
async fn test_shallow_reads_skip_preloads() {
    let pool = setup().await;
    seed(&pool).await;

    let mut example = Author::named("SomeUser");
    let repo = wrap(&mut example);

    let found = repo.shallow_find_one(&pool).await.unwrap().unwrap();
    assert!(found.posts.is_empty());

    let all = repo.shallow_find(&pool).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].posts.is_empty());

    let by_sql = repo
        .shallow_find_sql(&pool, "username = ?", &["SomeUser".into()])
        .await
        .unwrap();
    assert!(by_sql[0].posts.is_empty());

    let one_by_sql = repo
        .shallow_find_one_sql(&pool, "username = ?", &["SomeUser".into()])
        .await
        .unwrap()
        .unwrap();
    assert!(one_by_sql.posts.is_empty());
}

#[tokio::test]
async fn test_no_match_is_not_an_error() {
    let pool = setup().await;
    seed(&pool).await;

    let mut example = Author::named("Nobody");
    let repo = wrap(&mut example);
    assert!(repo.find_one(&pool).await.unwrap().is_none());
    assert!(repo.find(&pool).await.unwrap().is_empty());
    assert_eq!(repo.count(&pool).await.unwrap(), 0);
    assert!(repo
        .find_one_sql(&pool, "username = ?", &["Nobody".into()])
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_find_sql_preloads() {
    let pool = setup().await;
    seed(&pool).await;

    let found = wrap(&mut Author::default())
        .find_sql(&pool, "username = ?", &["SomeUser".into()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].posts[0].images.len(), 3);

    let one = wrap(&mut Img::default())
        .find_one_sql(&pool, "title LIKE ?", &["Lorem ipsum%".into()])
        .await
        .unwrap()
        .unwrap();
    assert!(one.title.starts_with("Lorem ipsum"));
}

#[tokio::test]
async fn test_find_orders_by_key() {
    let pool = setup().await;
    seed(&pool).await;

    let mut example = Img::default();
    let repo = wrap(&mut example);

    let ids: Vec<_> = repo.find(&pool).await.unwrap().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);

    let ids: Vec<_> = repo.find_reverse(&pool).await.unwrap().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![Some(3), Some(2), Some(1)]);
}

#[tokio::test]
async fn test_pagination() {
    let pool = setup().await;
    seed(&pool).await;

    let mut example = Img::default();
    let repo = wrap(&mut example);

    let page = repo.find_paginated(&pool, Some(1), Some(1), false).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, Some(2));

    let page = repo.shallow_find_paginated(&pool, Some(0), Some(1), true).await.unwrap();
    assert_eq!(page[0].id, Some(3));

    let page = repo.find_paginated(&pool, Some(1), None, false).await.unwrap();
    assert_eq!(page.len(), 2);

    let page = repo.find_paginated(&pool, None, None, false).await.unwrap();
    assert_eq!(page.len(), 3);

    let page = repo
        .find_paginated_sql(&pool, None, Some(5), true, "title LIKE ?", &["%image".into()])
        .await
        .unwrap();
    let ids: Vec<_> = page.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![Some(3), Some(2), Some(1)]);

    let page = repo
        .shallow_find_paginated_sql(&pool, Some(2), Some(5), false, "title LIKE ?", &["%image".into()])
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_counts() {
    let pool = setup().await;
    seed(&pool).await;

    let mut example = Img::default();
    let repo = wrap(&mut example);
    assert_eq!(repo.count(&pool).await.unwrap(), 3);
    assert_eq!(
        repo.count_sql(&pool, "title LIKE ?", &["Lorem ipsum % image".into()])
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        repo.count_sql(&pool, "title = ?", &["Lorem ipsum image".into()])
            .await
            .unwrap(),
        1
    );

    let mut by_example = img("Lorem ipsum 2 image");
    assert_eq!(wrap(&mut by_example).count(&pool).await.unwrap(), 1);
}

// =============================================================================
// Join
// =============================================================================

#[derive(Debug, Clone, Default, FromRow)]
struct Foo {
    id: Option<i64>,
    name: String,
}

describe_record! { Foo { id: Option<i64>, pub name: String } }

impl Entity for Foo {
    const TABLE: &'static str = "foos";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("name", self.name.clone().into())]
    }
}

impl Crud for Foo {}

#[derive(Debug, Clone, Default, FromRow)]
struct Bar {
    id: Option<i64>,
    foo_id: i64,
}

describe_record! { Bar { id: Option<i64>, pub foo_id: i64 } }

impl Entity for Bar {
    const TABLE: &'static str = "bars";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("foo_id", self.foo_id.into())]
    }
}

impl Crud for Bar {}

#[tokio::test]
async fn test_join_finds_partnered_row() {
    let pool = setup().await;

    let mut lonely = Foo {
        name: "lonely".to_string(),
        ..Default::default()
    };
    wrap(&mut lonely).insert(&pool).await.unwrap();

    let condition = "foos.id = bars.foo_id";
    assert!(wrap(&mut Foo::default())
        .join(&pool, "bars", condition)
        .await
        .unwrap()
        .is_none());

    let mut paired = Foo {
        name: "paired".to_string(),
        ..Default::default()
    };
    wrap(&mut paired).insert(&pool).await.unwrap();
    let mut bar = Bar {
        foo_id: paired.id.unwrap(),
        ..Default::default()
    };
    wrap(&mut bar).insert(&pool).await.unwrap();

    let found = wrap(&mut Foo::default())
        .join(&pool, "bars", condition)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "paired");
}

// =============================================================================
// Declared Preloads
// =============================================================================

/// Posts with only their two newest images.
#[derive(Debug, Clone, Default, FromRow)]
struct Gallery {
    id: Option<i64>,
    title: String,
    #[sqlx(skip)]
    images: Vec<Img>,
}

describe_record! { Gallery { id: Option<i64>, pub title: String, pub images: Vec<Img> } }

fn newest_two(scope: &mut Scope) {
    scope.order_by("id DESC").limit(2);
}

impl Entity for Gallery {
    const TABLE: &'static str = "posts";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("title", self.title.clone().into())]
    }

    fn requires_preload() -> PreloadSpec<PreloadFn> {
        PreloadSpec::Multi(vec!["images".to_string()], vec![Some(newest_two as PreloadFn)])
    }

    fn preload<'a>(
        items: Vec<&'a mut Self>,
        relation: &'a str,
        rest: &'a [&'a str],
        scope: &'a Scope,
        pool: &'a SqlitePool,
    ) -> BoxFuture<'a, DbResult<()>> {
        match relation {
            "images" => has_many(items, "post_id", |g: &mut Gallery| &mut g.images, rest, scope, pool),
            _ => unknown_relation::<Self>(relation),
        }
    }
}

impl Crud for Gallery {}

#[tokio::test]
async fn test_preload_modifier_shapes_relation_query() {
    let pool = setup().await;
    seed(&pool).await;

    let gallery = wrap(&mut Gallery::default()).find_one(&pool).await.unwrap().unwrap();
    let ids: Vec<_> = gallery.images.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![Some(3), Some(2)]);
}

/// Post with its author, and the author's posts.
#[derive(Debug, Clone, Default, FromRow)]
struct Byline {
    id: Option<i64>,
    author_id: i64,
    #[sqlx(skip)]
    author: Option<Author>,
}

describe_record! { Byline { id: Option<i64>, pub author_id: i64, pub author: Option<Author> } }

impl Entity for Byline {
    const TABLE: &'static str = "posts";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("author_id", self.author_id.into())]
    }

    fn requires_preload() -> PreloadSpec<PreloadFn> {
        PreloadSpec::Multi(vec!["author".to_string(), "author.posts".to_string()], Vec::new())
    }

    fn preload<'a>(
        items: Vec<&'a mut Self>,
        relation: &'a str,
        rest: &'a [&'a str],
        scope: &'a Scope,
        pool: &'a SqlitePool,
    ) -> BoxFuture<'a, DbResult<()>> {
        match relation {
            "author" => belongs_to(items, "author_id", |b: &mut Byline| &mut b.author, rest, scope, pool),
            _ => unknown_relation::<Self>(relation),
        }
    }
}

impl Crud for Byline {}

#[tokio::test]
async fn test_belongs_to_and_nested_path() {
    let pool = setup().await;
    seed(&pool).await;

    let byline = wrap(&mut Byline::default()).find_one(&pool).await.unwrap().unwrap();
    let author = byline.author.unwrap();
    assert_eq!(author.username, "SomeUser");
    assert_eq!(author.posts.len(), 1);
    // Only the declared paths load, so images stay empty.
    assert!(author.posts[0].images.is_empty());
}

#[tokio::test]
async fn test_nested_path_reaches_every_shared_parent() {
    let pool = setup().await;
    seed(&pool).await;

    let mut second = Post {
        title: "Second".to_string(),
        author_id: 1,
        ..Default::default()
    };
    wrap(&mut second).insert(&pool).await.unwrap();

    // Both bylines point at the same author.
    let bylines = wrap(&mut Byline::default()).find(&pool).await.unwrap();
    let per_author: Vec<usize> = bylines
        .iter()
        .map(|b| b.author.as_ref().map_or(0, |a| a.posts.len()))
        .collect();
    assert_eq!(per_author, vec![2, 2]);
}

/// Declares a relation it cannot load.
#[derive(Debug, Clone, Default, FromRow)]
struct Headline {
    id: Option<i64>,
    title: String,
}

describe_record! { Headline { id: Option<i64>, pub title: String } }

impl Entity for Headline {
    const TABLE: &'static str = "posts";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("title", self.title.clone().into())]
    }

    fn requires_preload() -> PreloadSpec<PreloadFn> {
        PreloadSpec::Single("comments".to_string(), None)
    }
}

impl Crud for Headline {}

#[tokio::test]
async fn test_unknown_relation_is_reported() {
    let pool = setup().await;
    seed(&pool).await;

    let mut example = Headline::default();
    let repo = wrap(&mut example);

    let err = repo.find(&pool).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::UnknownRelation { ref entity, ref relation } if entity == "Headline" && relation == "comments"
    ));

    // Shallow reads never touch relations.
    assert_eq!(repo.shallow_find(&pool).await.unwrap().len(), 1);
}

/// Declares two relations but one modifier.
#[derive(Debug, Clone, Default, FromRow)]
struct Lopsided {
    id: Option<i64>,
}

describe_record! { Lopsided { id: Option<i64> } }

impl Entity for Lopsided {
    const TABLE: &'static str = "posts";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        Vec::new()
    }

    fn requires_preload() -> PreloadSpec<PreloadFn> {
        PreloadSpec::Multi(
            vec!["images".to_string(), "videos".to_string()],
            vec![Some(newest_two as PreloadFn)],
        )
    }
}

impl Crud for Lopsided {}

#[tokio::test]
#[should_panic(expected = "LOGIC ERROR")]
async fn test_mismatched_modifiers_panic() {
    let pool = setup().await;
    seed(&pool).await;

    let _ = wrap(&mut Lopsided::default()).find(&pool).await;
}

// =============================================================================
// Overrides
// =============================================================================

/// Image view whose count is answered without touching the database.
#[derive(Debug, Clone, Default, FromRow)]
struct Tally {
    id: Option<i64>,
    title: String,
}

describe_record! { Tally { id: Option<i64>, pub title: String } }

impl Entity for Tally {
    const TABLE: &'static str = "imgs";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![("title", self.title.clone().into())]
    }
}

#[async_trait]
impl Crud for Tally {
    async fn count(&self, _pool: &SqlitePool) -> DbResult<u64> {
        Ok(42)
    }
}

#[tokio::test]
async fn test_override_replaces_only_its_method() {
    let pool = setup().await;
    seed(&pool).await;

    let mut example = Tally::default();
    let repo = wrap(&mut example);
    assert_eq!(repo.count(&pool).await.unwrap(), 42);
    assert_eq!(repo.count_sql(&pool, "1 = 1", &[]).await.unwrap(), 3);
    assert_eq!(repo.m().title, "");
}
