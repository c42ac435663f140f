//! In-process stand-in for the IGDB v2 REST API.
//!
//! Serves a seeded catalog under `/{resource}/` with the query dialect the
//! client speaks: `fields`, `search`, path ids, `order`, `offset`, `limit`
//! and scroll cursors announced through `X-Next-Page` / `X-Count`.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Key accepted by [`app`].
pub const DEFAULT_API_KEY: &str = "test-key";

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;
/// Open scroll cursors kept before the oldest one is dropped.
pub const MAX_CURSORS: usize = 256;

const NEXT_PAGE: &str = "x-next-page";
const COUNT: &str = "x-count";

/// Query options understood by the list routes.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub fields: Option<String>,
    pub search: Option<String>,
    pub order: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub scroll: Option<String>,
}

/// Remaining results of a scroll cursor.
#[derive(Debug)]
struct Cursor {
    resource: String,
    items: Vec<Value>,
    page_size: usize,
}

/// Open cursors by token, evicting the oldest once `capacity` is reached.
/// A cursor read to the end is removed straight away.
#[derive(Debug)]
struct Cursors {
    capacity: usize,
    by_token: HashMap<String, Cursor>,
    opened: VecDeque<String>,
}

impl Cursors {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            by_token: HashMap::new(),
            opened: VecDeque::new(),
        }
    }

    fn open(&mut self, token: String, cursor: Cursor) {
        while self.len() >= self.capacity {
            let Some(oldest) = self.opened.pop_front() else {
                break;
            };
            if self.by_token.remove(&oldest).is_some() {
                debug!(token = %oldest, "evicting scroll cursor");
            }
        }
        self.opened.push_back(token.clone());
        self.by_token.insert(token, cursor);
    }

    fn get_mut(&mut self, token: &str) -> Option<&mut Cursor> {
        self.by_token.get_mut(token)
    }

    fn close(&mut self, token: &str) {
        self.by_token.remove(token);
        self.opened.retain(|open| open != token);
    }

    fn len(&self) -> usize {
        self.by_token.len()
    }
}

pub struct MockIgdb {
    api_key: String,
    catalog: HashMap<String, Vec<Value>>,
    cursors: RwLock<Cursors>,
}

pub type Shared = Arc<MockIgdb>;

impl MockIgdb {
    pub fn new(api_key: impl Into<String>, catalog: HashMap<String, Vec<Value>>) -> Self {
        Self {
            api_key: api_key.into(),
            catalog,
            cursors: RwLock::new(Cursors::new(MAX_CURSORS)),
        }
    }

    /// Keep at most `limit` scroll cursors open instead of [`MAX_CURSORS`].
    pub fn with_cursor_limit(mut self, limit: usize) -> Self {
        self.cursors = RwLock::new(Cursors::new(limit));
        self
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get("user-key")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|key| key == self.api_key)
    }
}

/// Router with [`DEFAULT_API_KEY`] and the [`seed_catalog`].
pub fn app() -> Router {
    app_with(MockIgdb::new(DEFAULT_API_KEY, seed_catalog()))
}

pub fn app_with(mock: MockIgdb) -> Router {
    Router::new()
        .route("/{resource}/", get(list))
        .route("/{resource}/{ids}", get(list_by_ids))
        .route("/{resource}/scroll/{token}/", get(scroll_page))
        .with_state(Arc::new(mock))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, mock: MockIgdb) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(mock)).await
}

/// A handful of games and genres, enough to page through.
pub fn seed_catalog() -> HashMap<String, Vec<Value>> {
    let games = vec![
        json!({
            "id": 74,
            "name": "Mass Effect 2",
            "slug": "mass-effect-2",
            "summary": "Shepard assembles a team.",
            "first_release_date": 1264464000000.0_f64,
            "cover": {"cloudinary_id": "co1x7b"}
        }),
        json!({
            "id": 75,
            "name": "Mass Effect",
            "slug": "mass-effect",
            "summary": "Humanity's first Spectre.",
            "first_release_date": 1195516800000.0_f64,
            "cover": {"cloudinary_id": "co1x7a"}
        }),
        json!({
            "id": 76,
            "name": "Mass Effect 3",
            "slug": "mass-effect-3",
            "first_release_date": 1331078400000.0_f64
        }),
        json!({
            "id": 1942,
            "name": "The Witcher 3: Wild Hunt",
            "slug": "the-witcher-3-wild-hunt",
            "cover": {"url": "//images.igdb.com/igdb/image/upload/t_thumb/co1wyy.jpg"}
        }),
        json!({"id": 11156, "name": "Mass Effect: Andromeda", "slug": "mass-effect-andromeda"}),
        json!({"id": 1020, "name": "Grand Theft Auto V", "slug": "grand-theft-auto-v"}),
        json!({"id": 472, "name": "The Elder Scrolls V: Skyrim", "slug": "the-elder-scrolls-v-skyrim"}),
    ];
    let genres = vec![
        json!({"id": 5, "name": "Shooter", "slug": "shooter"}),
        json!({"id": 12, "name": "Role-playing (RPG)", "slug": "role-playing-rpg"}),
    ];

    HashMap::from([("games".to_string(), games), ("genres".to_string(), genres)])
}

async fn list(
    State(mock): State<Shared>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    respond(&mock, &resource, None, &headers, query).await
}

async fn list_by_ids(
    State(mock): State<Shared>,
    Path((resource, ids)): Path<(String, String)>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    respond(&mock, &resource, Some(&ids), &headers, query).await
}

async fn respond(
    mock: &MockIgdb,
    resource: &str,
    ids: Option<&str>,
    headers: &HeaderMap,
    query: ListQuery,
) -> Response {
    if !mock.authorized(headers) {
        return forbidden();
    }
    let Some(items) = mock.catalog.get(resource) else {
        return not_found(format!("unknown resource `{resource}`"));
    };

    let mut matches = select(items, ids, query.search.as_deref());
    if let Some(order) = query.order.as_deref() {
        sort(&mut matches, order);
    }
    let total = matches.len();
    let fields = query.fields.as_deref().unwrap_or("*");
    let mut matches: Vec<Value> = matches
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .map(|item| project(item, fields))
        .collect();

    let page_size = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let rest = matches.split_off(page_size.min(matches.len()));

    let mut response = Json(matches).into_response();
    if query.scroll.as_deref() == Some("1") {
        response
            .headers_mut()
            .insert(COUNT, HeaderValue::from(total));
        if !rest.is_empty() {
            let token = Uuid::new_v4().simple().to_string();
            let cursor = Cursor {
                resource: resource.to_string(),
                items: rest,
                page_size,
            };
            mock.cursors.write().await.open(token.clone(), cursor);
            insert_next_page(&mut response, resource, &token);
        }
    }
    response
}

async fn scroll_page(
    State(mock): State<Shared>,
    Path((resource, token)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !mock.authorized(&headers) {
        return forbidden();
    }

    let mut cursors = mock.cursors.write().await;
    let Some(cursor) = cursors.get_mut(&token).filter(|c| c.resource == resource) else {
        return not_found(format!("scroll cursor `{token}` expired"));
    };

    let rest = cursor.items.split_off(cursor.page_size.min(cursor.items.len()));
    let page = std::mem::replace(&mut cursor.items, rest);
    let exhausted = cursor.items.is_empty();
    if exhausted {
        cursors.close(&token);
    }
    drop(cursors);

    let mut response = Json(page).into_response();
    if !exhausted {
        insert_next_page(&mut response, &resource, &token);
    }
    response
}

fn insert_next_page(response: &mut Response, resource: &str, token: &str) {
    if let Ok(value) = HeaderValue::from_str(&format!("/{resource}/scroll/{token}/")) {
        response.headers_mut().insert(NEXT_PAGE, value);
    }
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Authentication failed").into_response()
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!([{ "status": 404, "message": message }]))).into_response()
}

/// Items whose id is listed in `ids` (all when `None`) and whose name
/// contains `search`, case-insensitively.
fn select<'a>(items: &'a [Value], ids: Option<&str>, search: Option<&str>) -> Vec<&'a Value> {
    let wanted: Option<Vec<u64>> =
        ids.map(|ids| ids.split(',').filter_map(|id| id.trim().parse().ok()).collect());
    let needle = search.map(str::to_lowercase);

    items
        .iter()
        .filter(|item| match &wanted {
            Some(wanted) => item["id"].as_u64().is_some_and(|id| wanted.contains(&id)),
            None => true,
        })
        .filter(|item| match &needle {
            Some(needle) => item["name"]
                .as_str()
                .is_some_and(|name| name.to_lowercase().contains(needle)),
            None => true,
        })
        .collect()
}

/// Sort by `field:asc` or `field:desc`. Numbers sort numerically, everything
/// else by its string form.
fn sort(items: &mut [&Value], order: &str) {
    let (field, direction) = order.split_once(':').unwrap_or((order, "asc"));
    items.sort_by(|a, b| {
        let ordering = match (a[field].as_f64(), b[field].as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => a[field].to_string().cmp(&b[field].to_string()),
        };
        if direction.eq_ignore_ascii_case("desc") {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Keep only the requested comma-separated `fields` plus `id`; `*` keeps all.
fn project(item: &Value, fields: &str) -> Value {
    if fields.split(',').any(|field| field.trim() == "*") {
        return item.clone();
    }
    let Some(object) = item.as_object() else {
        return item.clone();
    };

    let projected: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| {
            key.as_str() == "id" || fields.split(',').any(|field| field.trim() == key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(projected)
}
