/*
 * Responsibility
 * - Todos の request/response DTO
 * - 一覧のクエリパラメータ → TodoFilter / PageRequest への変換
 */
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::repos::query::{Page, PageRequest, TodoFilter};
use crate::repos::todo_repo::{OwnerRow, TodoRow, TodoWithOwner};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub contents: String,
    pub weather: String,
}

impl CreateTodoRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.contents.trim().is_empty() {
            return Err("contents is required");
        }
        if self.weather.trim().is_empty() {
            return Err("weather is required");
        }
        Ok(())
    }
}

/// `2024-05-01T09:00:00Z` / `2024-05-01T09:00:00+09:00` / `2024-05-01T09:00:00`
///
/// offset の無い日時は UTC として読む。空文字は未指定。
fn parse_instant(raw: &str) -> Result<Option<DateTime<Utc>>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|at| Some(at.and_utc()))
        .map_err(|_| format!("invalid date-time {raw:?}, expected ISO-8601 (e.g. 2024-05-01T09:00:00)"))
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_instant(&raw).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// GET /todos のクエリ。page は 1 始まり。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTodosParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub weather: Option<String>,
    #[serde(default, deserialize_with = "deserialize_instant")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_instant")]
    pub end_at: Option<DateTime<Utc>>,
}

impl ListTodosParams {
    pub fn into_query(self) -> Result<(TodoFilter, PageRequest), &'static str> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err("page starts at 1");
        }

        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err("size must be between 1 and 100");
        }

        if let (Some(start), Some(end)) = (self.start_at, self.end_at)
            && start > end
        {
            return Err("startAt must not be after endAt");
        }

        // `weather=` (空文字) は未指定と同じ
        let weather = self
            .weather
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty());

        Ok((
            TodoFilter {
                weather,
                start_at: self.start_at,
                end_at: self.end_at,
            },
            PageRequest::new(page - 1, size),
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct OwnerResponse {
    pub id: i64,
    pub email: String,
    pub nickname: String,
}

impl From<OwnerRow> for OwnerResponse {
    fn from(row: OwnerRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            nickname: row.nickname,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub contents: String,
    pub weather: String,
    /// owner が解決できない todo は null
    pub user: Option<OwnerResponse>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl TodoResponse {
    pub fn new(todo: TodoRow, owner: Option<OwnerRow>) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            contents: todo.contents,
            weather: todo.weather,
            user: owner.map(OwnerResponse::from),
            created_at: todo.created_at,
            modified_at: todo.modified_at,
        }
    }
}

impl From<TodoWithOwner> for TodoResponse {
    fn from(row: TodoWithOwner) -> Self {
        Self::new(row.todo, row.owner)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    /// 1 始まり
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: Page<U>) -> Self
    where
        T: From<U>,
    {
        let page = page.map(T::from);
        Self {
            content: page.content,
            page: page.page + 1,
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
        }
    }
}
