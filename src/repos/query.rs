/*
 * Responsibility
 * - todos 向けの動的クエリを「値」として表現する (join / 条件 / 並び順 / ページ)
 * - SQL への変換は storage adapter 側 (todo_repo) の責務
 * - ここは DB に依存しない
 */
use chrono::{DateTime, Utc};

/// owner (users) を同じ読み取りで取得するかどうか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    None,
    /// LEFT OUTER JOIN: owner が無くても todo 行は落とさない
    LeftOwner,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TodoPredicate {
    IdEq(i64),
    WeatherEq(String),
    ModifiedAtFrom(DateTime<Utc>),
    ModifiedAtUntil(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ModifiedAtDesc,
    IdDesc,
}

/// 0-based のページ指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let size = i64::from(request.size);
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: (total_elements + size - 1) / size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// 一覧の任意フィルタ。None の項目は結果を絞り込まない。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoFilter {
    pub weather: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

impl TodoFilter {
    pub fn predicates(&self) -> Vec<TodoPredicate> {
        let mut predicates = Vec::new();
        if let Some(weather) = &self.weather {
            predicates.push(TodoPredicate::WeatherEq(weather.clone()));
        }
        if let Some(start_at) = self.start_at {
            predicates.push(TodoPredicate::ModifiedAtFrom(start_at));
        }
        if let Some(end_at) = self.end_at {
            predicates.push(TodoPredicate::ModifiedAtUntil(end_at));
        }
        predicates
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodoQuery {
    pub join: JoinKind,
    pub predicates: Vec<TodoPredicate>,
    pub sort: Vec<SortKey>,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl TodoQuery {
    /// 一意キー検索。limit を 2 にして「複数行」を検出できるようにする。
    pub fn by_id_with_owner(todo_id: i64) -> Self {
        Self {
            join: JoinKind::LeftOwner,
            predicates: vec![TodoPredicate::IdEq(todo_id)],
            sort: Vec::new(),
            limit: Some(2),
            offset: 0,
        }
    }

    /// modifiedAt 降順、同時刻は id 降順 (ページングを安定させる)
    pub fn listing(filter: &TodoFilter, page: PageRequest) -> Self {
        Self {
            join: JoinKind::LeftOwner,
            predicates: filter.predicates(),
            sort: vec![SortKey::ModifiedAtDesc, SortKey::IdDesc],
            limit: Some(page.limit()),
            offset: page.offset(),
        }
    }

    /// 同じ条件での件数用。join / sort / window は件数に影響しないので外す。
    pub fn count_only(&self) -> Self {
        Self {
            join: JoinKind::None,
            predicates: self.predicates.clone(),
            sort: Vec::new(),
            limit: None,
            offset: 0,
        }
    }
}
