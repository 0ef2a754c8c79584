/*
 * Responsibility
 * - todos の読み書き (TodoStore trait + PostgreSQL 実装)
 * - TodoQuery (query.rs) を SQL に変換する
 * - owner 付き取得 / 一覧は trait の上の関数として 1 箇所にまとめる
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::repos::error::RepoError;
use crate::repos::query::{
    JoinKind, Page, PageRequest, SortKey, TodoFilter, TodoPredicate, TodoQuery,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub id: i64,
    pub title: String,
    pub contents: String,
    pub weather: String,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRow {
    pub id: i64,
    pub email: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoWithOwner {
    pub todo: TodoRow,
    pub owner: Option<OwnerRow>,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub contents: String,
    pub weather: String,
    pub user_id: i64,
}

/// LEFT JOIN の結果 1 行。owner 側の列は join できなかった場合 NULL になる。
#[derive(Debug, FromRow)]
struct TodoJoinedRow {
    #[sqlx(rename = "todoId")]
    id: i64,
    title: String,
    contents: String,
    weather: String,
    #[sqlx(rename = "userId")]
    user_id: Option<i64>,
    #[sqlx(rename = "createdAt")]
    created_at: DateTime<Utc>,
    #[sqlx(rename = "modifiedAt")]
    modified_at: DateTime<Utc>,

    #[sqlx(rename = "ownerId")]
    owner_id: Option<i64>,
    #[sqlx(rename = "ownerEmail")]
    owner_email: Option<String>,
    #[sqlx(rename = "ownerNickname")]
    owner_nickname: Option<String>,
}

impl From<TodoJoinedRow> for TodoWithOwner {
    fn from(row: TodoJoinedRow) -> Self {
        let owner = match (row.owner_id, row.owner_email, row.owner_nickname) {
            (Some(id), Some(email), Some(nickname)) => Some(OwnerRow {
                id,
                email,
                nickname,
            }),
            _ => None,
        };

        Self {
            todo: TodoRow {
                id: row.id,
                title: row.title,
                contents: row.contents,
                weather: row.weather,
                user_id: row.user_id,
                created_at: row.created_at,
                modified_at: row.modified_at,
            },
            owner,
        }
    }
}

/// todos の storage adapter
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create(&self, new_todo: NewTodo) -> Result<TodoRow, RepoError>;

    /// `query` をそのまま評価する。件数の検証は呼び出し側で行う。
    async fn fetch(&self, query: &TodoQuery) -> Result<Vec<TodoWithOwner>, RepoError>;

    async fn count(&self, query: &TodoQuery) -> Result<i64, RepoError>;
}

/// todo と owner を 1 回の読み取りで取得する。
///
/// - 存在しない id は `Ok(None)` (エラーではない)
/// - owner が無い todo は `owner: None` で返す
/// - 2 行以上は一意性の破れとして `RepoError::MultipleRows`
pub async fn find_with_owner(
    store: &dyn TodoStore,
    todo_id: i64,
) -> Result<Option<TodoWithOwner>, RepoError> {
    let mut rows = store
        .fetch(&TodoQuery::by_id_with_owner(todo_id))
        .await?;

    if rows.len() > 1 {
        return Err(RepoError::MultipleRows {
            entity: "todo",
            count: rows.len(),
        });
    }

    Ok(rows.pop())
}

pub async fn list(
    store: &dyn TodoStore,
    filter: &TodoFilter,
    page: PageRequest,
) -> Result<Page<TodoWithOwner>, RepoError> {
    let query = TodoQuery::listing(filter, page);

    let total = store.count(&query.count_only()).await?;
    let content = store.fetch(&query).await?;

    Ok(Page::new(content, page, total))
}

const TODO_COLUMNS: &str = r#"t."todoId", t.title, t.contents, t.weather, t."userId", t."createdAt", t."modifiedAt""#;

fn push_from<'a>(qb: &mut QueryBuilder<'a, Postgres>, join: JoinKind) {
    qb.push(" FROM todos t");
    if join == JoinKind::LeftOwner {
        qb.push(r#" LEFT JOIN users u ON u."userId" = t."userId""#);
    }
}

fn push_where<'a>(qb: &mut QueryBuilder<'a, Postgres>, predicates: &[TodoPredicate]) {
    for (i, predicate) in predicates.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            TodoPredicate::IdEq(id) => {
                qb.push(r#"t."todoId" = "#).push_bind(*id);
            }
            TodoPredicate::WeatherEq(weather) => {
                qb.push("t.weather = ").push_bind(weather.clone());
            }
            TodoPredicate::ModifiedAtFrom(at) => {
                qb.push(r#"t."modifiedAt" >= "#).push_bind(*at);
            }
            TodoPredicate::ModifiedAtUntil(at) => {
                qb.push(r#"t."modifiedAt" <= "#).push_bind(*at);
            }
        }
    }
}

fn push_order_by<'a>(qb: &mut QueryBuilder<'a, Postgres>, sort: &[SortKey]) {
    for (i, key) in sort.iter().enumerate() {
        qb.push(if i == 0 { " ORDER BY " } else { ", " });
        qb.push(match key {
            SortKey::ModifiedAtDesc => r#"t."modifiedAt" DESC"#,
            SortKey::IdDesc => r#"t."todoId" DESC"#,
        });
    }
}

pub(crate) fn select_sql(query: &TodoQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(TODO_COLUMNS);
    qb.push(match query.join {
        JoinKind::LeftOwner => {
            r#", u."userId" AS "ownerId", u.email AS "ownerEmail", u.nickname AS "ownerNickname""#
        }
        // 行の形を揃える (TodoJoinedRow で読めるように)
        JoinKind::None => {
            r#", NULL::bigint AS "ownerId", NULL::text AS "ownerEmail", NULL::text AS "ownerNickname""#
        }
    });

    push_from(&mut qb, query.join);
    push_where(&mut qb, &query.predicates);
    push_order_by(&mut qb, &query.sort);

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
    if query.offset > 0 {
        qb.push(" OFFSET ").push_bind(query.offset);
    }

    qb
}

pub(crate) fn count_sql(query: &TodoQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*)");
    push_from(&mut qb, query.join);
    push_where(&mut qb, &query.predicates);
    qb
}

#[derive(Clone)]
pub struct PgTodoRepo {
    pool: PgPool,
}

impl PgTodoRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoStore for PgTodoRepo {
    async fn create(&self, new_todo: NewTodo) -> Result<TodoRow, RepoError> {
        let row = sqlx::query_as::<_, TodoJoinedRow>(
            r#"
            INSERT INTO todos (title, contents, weather, "userId")
            VALUES ($1, $2, $3, $4)
            RETURNING
                "todoId", title, contents, weather, "userId", "createdAt", "modifiedAt",
                NULL::bigint AS "ownerId", NULL::text AS "ownerEmail", NULL::text AS "ownerNickname"
            "#,
        )
        .bind(&new_todo.title)
        .bind(&new_todo.contents)
        .bind(&new_todo.weather)
        .bind(new_todo.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(TodoWithOwner::from(row).todo)
    }

    async fn fetch(&self, query: &TodoQuery) -> Result<Vec<TodoWithOwner>, RepoError> {
        let mut qb = select_sql(query);
        let rows = qb
            .build_query_as::<TodoJoinedRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(TodoWithOwner::from).collect())
    }

    async fn count(&self, query: &TodoQuery) -> Result<i64, RepoError> {
        let mut qb = count_sql(query);
        let total = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(total)
    }
}


/// PostgreSQL adapter の往復テスト。
///
/// `#[sqlx::test]` がテストごとに DB を作って migrations を流す。
/// DATABASE_URL が必要なので既定では走らせない: `cargo test -- --ignored`
#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::models::UserRole;
    use crate::repos::user_repo::{NewUser, PgUserRepo, UserStore};

    async fn owner(pool: &PgPool, email: &str) -> i64 {
        PgUserRepo::new(pool.clone())
            .create(NewUser {
                email: email.to_string(),
                password_hash: "x".to_string(),
                nickname: "owner".to_string(),
                role: UserRole::User,
            })
            .await
            .unwrap()
            .id
    }

    fn new_todo(title: &str, weather: &str, user_id: i64) -> NewTodo {
        NewTodo {
            title: title.to_string(),
            contents: format!("{title} contents"),
            weather: weather.to_string(),
            user_id,
        }
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL (PostgreSQL)"]
    async fn joined_row_maps_owner_columns(pool: PgPool) {
        let repo = PgTodoRepo::new(pool.clone());
        let user_id = owner(&pool, "owner@example.com").await;
        let todo = TodoStore::create(&repo, new_todo("t1", "Sunny", user_id))
            .await
            .unwrap();

        let found = find_with_owner(&repo, todo.id).await.unwrap().unwrap();
        assert_eq!(found.todo, todo);
        assert_eq!(
            found.owner,
            Some(OwnerRow {
                id: user_id,
                email: "owner@example.com".to_string(),
                nickname: "owner".to_string(),
            })
        );
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL (PostgreSQL)"]
    async fn deleted_owner_leaves_todo_with_null_owner(pool: PgPool) {
        let repo = PgTodoRepo::new(pool.clone());
        let user_id = owner(&pool, "gone@example.com").await;
        let todo = TodoStore::create(&repo, new_todo("t1", "Rainy", user_id))
            .await
            .unwrap();

        sqlx::query(r#"DELETE FROM users WHERE "userId" = $1"#)
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();

        let found = find_with_owner(&repo, todo.id).await.unwrap().unwrap();
        assert_eq!(found.todo.user_id, None);
        assert_eq!(found.owner, None);
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL (PostgreSQL)"]
    async fn create_for_missing_user_is_missing_reference(pool: PgPool) {
        let repo = PgTodoRepo::new(pool);
        let err = TodoStore::create(&repo, new_todo("t1", "Sunny", 4242))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::MissingReference));
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL (PostgreSQL)"]
    async fn listing_filters_and_counts_in_sql(pool: PgPool) {
        let repo = PgTodoRepo::new(pool.clone());
        let user_id = owner(&pool, "lister@example.com").await;
        for (title, weather) in [("a", "Sunny"), ("b", "Rainy"), ("c", "Sunny")] {
            TodoStore::create(&repo, new_todo(title, weather, user_id))
                .await
                .unwrap();
        }

        let filter = TodoFilter {
            weather: Some("Sunny".to_string()),
            ..TodoFilter::default()
        };
        let page = list(&repo, &filter, PageRequest::new(0, 1)).await.unwrap();

        assert_eq!(page.total_elements, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.content.len(), 1);
        assert!(page.content[0].owner.is_some());
    }
}
