//! In-memory stand-in for the library API

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use library_client::{
    api::{ApiRequest, RawResponse, Transport},
    config::{AppConfig, CacheConfig},
    ApiClient, ApiError, AppState, QueryStore,
};
use serde_json::{json, Value};

#[derive(Default)]
struct Library {
    books: Vec<Value>,
    /// (book id, quantity) per borrow call
    borrows: Vec<(String, u64)>,
    next_id: u64,
}

/// Fake transport: serves `/books` and `/borrow` from memory, counts calls
/// per route and can be told to fail a route.
#[derive(Default)]
pub struct FakeLibrary {
    library: Mutex<Library>,
    calls: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashMap<String, u16>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl FakeLibrary {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert a book directly, bypassing the API; returns its id
    pub fn seed_book(&self, title: &str, copies: u64, available: bool) -> String {
        let mut library = self.library.lock().unwrap();
        library.next_id += 1;
        let next_id = library.next_id;
        let id = format!("book-{}", next_id);
        library.books.push(json!({
            "_id": id,
            "title": title,
            "author": "Seeded Author",
            "genre": "FICTION",
            "isbn": format!("978-{:010}", next_id),
            "copies": copies,
            "available": available,
        }));
        id
    }

    /// Number of calls received for a route, e.g. `"GET /books"`
    pub fn calls(&self, route: &str) -> usize {
        self.calls.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    /// Make every call to `route` answer with `status` until cleared.
    /// Status 0 fails the call at the transport level instead.
    pub fn fail(&self, route: &str, status: u16) {
        self.failures.lock().unwrap().insert(route.to_string(), status);
    }

    pub fn recover(&self, route: &str) {
        self.failures.lock().unwrap().remove(route);
    }

    /// Answer calls to `route` only after `delay`. The answer is computed
    /// when the call arrives, like a server reading its state before a slow
    /// reply.
    pub fn delay(&self, route: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(route.to_string(), delay);
    }

    fn route(&self, request: &ApiRequest) -> RawResponse {
        let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();
        let mut library = self.library.lock().unwrap();

        match (request.method.as_str(), segments.as_slice()) {
            ("GET", ["books"]) => ok(json!(library.books)),
            ("GET", ["books", id]) => match find(&library.books, id) {
                Some(book) => ok(book.clone()),
                None => not_found(),
            },
            ("POST", ["books"]) => {
                let mut book = request.body.clone().unwrap_or_else(|| json!({}));
                library.next_id += 1;
                book["_id"] = json!(format!("book-{}", library.next_id));
                if book.get("available").is_none() {
                    book["available"] = json!(true);
                }
                library.books.push(book.clone());
                RawResponse::json(201, &json!({ "success": true, "data": book }))
            }
            ("PUT", ["books", id]) => {
                let Some(index) = library.books.iter().position(|b| b["_id"] == *id) else {
                    return not_found();
                };
                if let Some(Value::Object(changes)) = &request.body {
                    for (field, value) in changes {
                        library.books[index][field] = value.clone();
                    }
                }
                ok(library.books[index].clone())
            }
            ("DELETE", ["books", id]) => {
                let before = library.books.len();
                library.books.retain(|b| b["_id"] != *id);
                if library.books.len() == before {
                    return not_found();
                }
                RawResponse::json(
                    200,
                    &json!({ "success": true, "message": "Book deleted", "data": null }),
                )
            }
            ("POST", ["borrow"]) => {
                let body = request.body.clone().unwrap_or_else(|| json!({}));
                let book_id = body["book"].as_str().unwrap_or_default().to_string();
                let quantity = body["quantity"].as_u64().unwrap_or(0);
                let Some(index) = library.books.iter().position(|b| b["_id"] == book_id) else {
                    return not_found();
                };
                let copies = library.books[index]["copies"].as_u64().unwrap_or(0);
                if quantity > copies {
                    return RawResponse::json(
                        400,
                        &json!({ "success": false, "message": "Not enough copies available" }),
                    );
                }
                library.books[index]["copies"] = json!(copies - quantity);
                if copies == quantity {
                    library.books[index]["available"] = json!(false);
                }
                library.borrows.push((book_id.clone(), quantity));
                library.next_id += 1;
                ok(json!({
                    "_id": format!("borrow-{}", library.next_id),
                    "book": book_id,
                    "quantity": quantity,
                    "dueDate": format!("{}T00:00:00.000Z", body["dueDate"].as_str().unwrap_or_default()),
                }))
            }
            ("GET", ["borrow"]) => {
                let mut totals: Vec<(String, u64)> = Vec::new();
                for (book_id, quantity) in &library.borrows {
                    match totals.iter_mut().find(|(id, _)| id == book_id) {
                        Some((_, total)) => *total += quantity,
                        None => totals.push((book_id.clone(), *quantity)),
                    }
                }
                let rows: Vec<Value> = totals
                    .into_iter()
                    .filter_map(|(id, total)| {
                        let book = find(&library.books, &id)?;
                        Some(json!({
                            "book": { "title": book["title"], "isbn": book["isbn"] },
                            "totalQuantity": total,
                        }))
                    })
                    .collect();
                ok(json!(rows))
            }
            _ => not_found(),
        }
    }
}

fn find<'a>(books: &'a [Value], id: &str) -> Option<&'a Value> {
    books.iter().find(|b| b["_id"] == id)
}

fn ok(data: Value) -> RawResponse {
    RawResponse::json(200, &json!({ "success": true, "data": data }))
}

fn not_found() -> RawResponse {
    RawResponse::json(404, &json!({ "success": false, "message": "Book not found" }))
}

/// Route label used for call counting: method plus path with ids collapsed
fn route_label(request: &ApiRequest) -> String {
    let path = request.path.trim_matches('/');
    let label = match path.split_once('/') {
        Some((collection, _)) => format!("/{}/:id", collection),
        None => format!("/{}", path),
    };
    format!("{} {}", request.method, label)
}

#[async_trait]
impl Transport for FakeLibrary {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let label = route_label(&request);
        *self.calls.lock().unwrap().entry(label.clone()).or_default() += 1;

        let failure = self.failures.lock().unwrap().get(&label).copied();
        let response = match failure {
            Some(0) => Err(ApiError::Network("connection refused".to_string())),
            Some(status) => Ok(RawResponse::json(
                status,
                &json!({ "success": false, "message": "Something went wrong" }),
            )),
            None => Ok(self.route(&request)),
        };

        let delay = self.delays.lock().unwrap().get(&label).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

pub fn store_over(library: &Arc<FakeLibrary>, keep_unused_for_secs: u64) -> QueryStore {
    let client = ApiClient::new(library.clone());
    QueryStore::new(client, &CacheConfig { keep_unused_for_secs })
}

pub fn state_over(library: &Arc<FakeLibrary>) -> AppState {
    AppState::with_client(AppConfig::default(), ApiClient::new(library.clone()))
}
