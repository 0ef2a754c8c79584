//! In-memory storage adapter for tests.
//!
//! Evaluates the same `TodoQuery` values the PostgreSQL adapter renders to SQL,
//! so reader/listing logic can be exercised without a database.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::UserRole;
use crate::repos::error::RepoError;
use crate::repos::query::{JoinKind, SortKey, TodoPredicate, TodoQuery};
use crate::repos::todo_repo::{NewTodo, OwnerRow, TodoRow, TodoStore, TodoWithOwner};
use crate::repos::user_repo::{NewUser, UserRow, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRow>>,
    todos: Mutex<Vec<TodoRow>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// true の間、全操作がストレージ障害 (pool timeout) を返す
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn seed_user(&self, email: &str, role: UserRole) -> UserRow {
        let id = self.next_id();
        let row = UserRow {
            id,
            email: email.to_string(),
            password: String::new(),
            nickname: format!("user{id}"),
            role,
        };
        self.users.lock().unwrap().push(row.clone());
        row
    }

    pub fn seed_todo(
        &self,
        title: &str,
        weather: &str,
        user_id: Option<i64>,
        modified_at: DateTime<Utc>,
    ) -> TodoRow {
        let row = TodoRow {
            id: self.next_id(),
            title: title.to_string(),
            contents: format!("{title} contents"),
            weather: weather.to_string(),
            user_id,
            created_at: modified_at,
            modified_at,
        };
        self.todos.lock().unwrap().push(row.clone());
        row
    }

    /// 一意性を無視してそのまま積む (重複行の検出テスト用)
    pub fn push_raw_todo(&self, row: TodoRow) {
        self.todos.lock().unwrap().push(row);
    }

    pub fn user(&self, user_id: i64) -> Option<UserRow> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
    }

    fn owner_of(&self, todo: &TodoRow) -> Option<OwnerRow> {
        let user_id = todo.user_id?;
        self.user(user_id).map(|u| OwnerRow {
            id: u.id,
            email: u.email,
            nickname: u.nickname,
        })
    }
}

fn matches(predicate: &TodoPredicate, todo: &TodoRow) -> bool {
    match predicate {
        TodoPredicate::IdEq(id) => todo.id == *id,
        TodoPredicate::WeatherEq(weather) => &todo.weather == weather,
        TodoPredicate::ModifiedAtFrom(at) => todo.modified_at >= *at,
        TodoPredicate::ModifiedAtUntil(at) => todo.modified_at <= *at,
    }
}

fn filtered(todos: &[TodoRow], query: &TodoQuery) -> Vec<TodoRow> {
    todos
        .iter()
        .filter(|t| query.predicates.iter().all(|p| matches(p, t)))
        .cloned()
        .collect()
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn create(&self, new_todo: NewTodo) -> Result<TodoRow, RepoError> {
        self.check_available()?;
        // todos."userId" の外部キー相当
        if self.user(new_todo.user_id).is_none() {
            return Err(RepoError::MissingReference);
        }
        let now = Utc::now();
        let row = TodoRow {
            id: self.next_id(),
            title: new_todo.title,
            contents: new_todo.contents,
            weather: new_todo.weather,
            user_id: Some(new_todo.user_id),
            created_at: now,
            modified_at: now,
        };
        self.todos.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn fetch(&self, query: &TodoQuery) -> Result<Vec<TodoWithOwner>, RepoError> {
        self.check_available()?;
        let mut rows = filtered(&self.todos.lock().unwrap(), query);

        rows.sort_by(|a, b| {
            query.sort.iter().fold(std::cmp::Ordering::Equal, |acc, key| {
                acc.then_with(|| match key {
                    SortKey::ModifiedAtDesc => b.modified_at.cmp(&a.modified_at),
                    SortKey::IdDesc => b.id.cmp(&a.id),
                })
            })
        });

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = query
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|todo| {
                let owner = match query.join {
                    JoinKind::LeftOwner => self.owner_of(&todo),
                    JoinKind::None => None,
                };
                TodoWithOwner { todo, owner }
            })
            .collect())
    }

    async fn count(&self, query: &TodoQuery) -> Result<i64, RepoError> {
        self.check_available()?;
        let n = filtered(&self.todos.lock().unwrap(), query).len();
        Ok(n as i64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<UserRow, RepoError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(RepoError::Conflict);
        }
        let row = UserRow {
            id: self.next_id(),
            email: new_user.email,
            password: new_user.password_hash,
            nickname: new_user.nickname,
            role: new_user.role,
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, RepoError> {
        self.check_available()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_role(&self, user_id: i64, role: UserRole) -> Result<bool, RepoError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
