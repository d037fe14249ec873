//! End-to-end tests over the in-process router: document-backed routes,
//! envelope shape, and the legacy status conventions. Relational routes
//! need a live PostgreSQL server and live in the ignored test at the
//! bottom.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wastegate::{common_routes, default_config, gateway_routes, AppState, GatewayConfig};

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(default_config())
    }

    fn with_config(config: GatewayConfig) -> Self {
        // The pool is lazy: document-backed routes never touch it.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool");
        let state = AppState::from_config(pool, &config).expect("valid config");
        let router = Router::new()
            .merge(common_routes())
            .merge(gateway_routes(state));
        TestApp { router }
    }
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("json request")
}

async fn request_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request must be served");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let body = serde_json::from_slice::<Value>(&bytes).expect("valid json response");
    (status, body)
}

fn residue(name: &str, quantity: i64) -> Value {
    json!({ "company_id": 1, "name": name, "residue_type": 2, "quantity": quantity })
}

#[tokio::test]
async fn create_single_document_answers_one_element_array() {
    let app = TestApp::new();
    let (status, body) = request_json(
        &app.router,
        json_request(
            Method::POST,
            "/residues/create",
            json!({ "news": residue("Plastic", 5) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["error"], Value::Null);
    let data = body["data"].as_array().expect("data must be an array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], json!("Plastic"));
    assert!(data[0]["_id"].is_string());
}

#[tokio::test]
async fn unknown_entity_action_is_endpoint_not_found() {
    let app = TestApp::new();
    let (status, body) = request_json(
        &app.router,
        json_request(Method::POST, "/martians/by", json!({ "filter": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("endpoint not found"));
}

#[tokio::test]
async fn missing_body_fields_answer_400() {
    let app = TestApp::new();
    let (status, body) = request_json(
        &app.router,
        json_request(Method::POST, "/residues/create", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("no data provided to insert"));

    let (status, body) = request_json(
        &app.router,
        json_request(Method::PUT, "/residues/update", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("no data provided to update"));
}

#[tokio::test]
async fn list_with_pagination_wraps_data_and_metadata() {
    let app = TestApp::new();
    for i in 0..25 {
        let (status, _) = request_json(
            &app.router,
            json_request(
                Method::POST,
                "/residues/create",
                json!({ "news": residue(&format!("r{i}"), i) }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = request_json(
        &app.router,
        json_request(
            Method::POST,
            "/residues/by",
            json!({ "filter": {}, "options": { "page": 2, "limit": 10 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 10);
    assert_eq!(
        body["data"]["pagination"],
        json!({ "page": 2, "limit": 10, "total": 25, "pages": 3 })
    );
}

#[tokio::test]
async fn unpaginated_list_returns_the_plain_array() {
    let app = TestApp::new();
    for name in ["a", "b"] {
        request_json(
            &app.router,
            json_request(
                Method::POST,
                "/residues/create",
                json!({ "news": residue(name, 1) }),
            ),
        )
        .await;
    }
    let (status, body) = request_json(
        &app.router,
        json_request(Method::POST, "/residues/by", json!({ "filter": { "name": "a" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn partial_bulk_create_keeps_survivors_and_reports_validation() {
    let app = TestApp::new();
    let (status, body) = request_json(
        &app.router,
        json_request(
            Method::POST,
            "/residues/create",
            json!({ "news": [
                residue("a", 1),
                { "company_id": 1, "residue_type": 2 },
                residue("c", 3),
            ]}),
        ),
    )
    .await;
    // Legacy surface: the failure rides a 200, not a transport error.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    let validation = body["validation"].as_array().expect("validation messages");
    assert!(validation.contains(&json!("inserted 2 of 3 documents")));
    assert!(validation.contains(&json!("name is required")));

    let (_, listed) = request_json(
        &app.router,
        json_request(Method::POST, "/residues/by", json!({ "filter": {} })),
    )
    .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn bulk_update_patches_and_returns_fresh_documents() {
    let app = TestApp::new();
    let (_, a) = request_json(
        &app.router,
        json_request(Method::POST, "/residues/create", json!({ "news": residue("a", 1) })),
    )
    .await;
    let (_, b) = request_json(
        &app.router,
        json_request(Method::POST, "/residues/create", json!({ "news": residue("b", 2) })),
    )
    .await;
    let a_id = a["data"][0]["_id"].clone();
    let b_id = b["data"][0]["_id"].clone();

    let (status, body) = request_json(
        &app.router,
        json_request(
            Method::PUT,
            "/residues/update",
            json!({ "updateds": [
                { "_id": a_id, "name": "a2" },
                { "id": b_id, "name": "b2" },
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["message"], json!("operation completed successfully"));
    let docs = body["data"]["data"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    let names: Vec<&str> = docs.iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"a2") && names.contains(&"b2"));
}

#[tokio::test]
async fn bulk_update_missing_identifier_rejects_before_writing() {
    let app = TestApp::new();
    let (_, a) = request_json(
        &app.router,
        json_request(Method::POST, "/residues/create", json!({ "news": residue("a", 1) })),
    )
    .await;
    let a_id = a["data"][0]["_id"].clone();

    let (status, body) = request_json(
        &app.router,
        json_request(
            Method::PUT,
            "/residues/update",
            json!({ "updateds": [
                { "_id": a_id, "name": "patched" },
                { "name": "orphan" },
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("_id"));

    // The well-formed sibling must not have been patched either.
    let (_, listed) = request_json(
        &app.router,
        json_request(Method::POST, "/residues/by", json!({ "filter": { "name": "a" } })),
    )
    .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_unique_field_is_a_conflict_error() {
    let app = TestApp::new();
    let op = json!({
        "code": "OP-1", "company_id": 1, "user_id": 9,
        "user_type": 10, "entity": "residues"
    });
    let (status, _) = request_json(
        &app.router,
        json_request(Method::POST, "/authorized_operations/create", json!({ "news": op })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request_json(
        &app.router,
        json_request(Method::POST, "/authorized_operations/create", json!({ "news": op })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("duplicate value in unique field"));
}

// Pins the shipped defect: POST /:entity/delete runs the create
// handler, so "deleting" inserts the news payload. If this test starts
// failing because delete became a real delete, that is a deliberate
// contract change, not a fix to sneak in.
#[tokio::test]
async fn delete_route_is_aliased_to_create() {
    let app = TestApp::new();
    let (status, body) = request_json(
        &app.router,
        json_request(
            Method::POST,
            "/residues/delete",
            json!({ "news": residue("still-here", 1) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));

    let (_, listed) = request_json(
        &app.router,
        json_request(
            Method::POST,
            "/residues/by",
            json!({ "filter": { "name": "still-here" } }),
        ),
    )
    .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn strict_mode_maps_the_taxonomy_to_status_codes() {
    let mut config = default_config();
    config.strict_errors = true;
    let app = TestApp::with_config(config);

    let (status, body) = request_json(
        &app.router,
        json_request(
            Method::POST,
            "/residues/create",
            json!({ "news": { "company_id": 1 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
    assert!(body["validation"].is_array());
}

#[tokio::test]
async fn health_route_answers() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = request_json(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
}

/// Relational end-to-end. Needs a PostgreSQL server; run with
/// `DATABASE_URL=postgres://... cargo test -- --ignored`.
#[tokio::test]
#[ignore = "requires a PostgreSQL server via DATABASE_URL"]
async fn relational_by_invokes_the_bound_function() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("connect");
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION public."fx_sel_companies"(filter jsonb)
        RETURNS TABLE(id int, name text) AS $$
            SELECT 1, filter->0->>'name'
        $$ LANGUAGE sql
        "#,
    )
    .execute(&pool)
    .await
    .expect("create stored function");
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION public."fx_sel_people"(filter jsonb)
        RETURNS TABLE(id int, code text) AS $$
            SELECT 7, filter->0->>'code'
        $$ LANGUAGE sql
        "#,
    )
    .execute(&pool)
    .await
    .expect("create login function");

    let state = AppState::from_config(pool, &default_config()).expect("state");
    let router = gateway_routes(state);

    let (status, body) = request_json(
        &router,
        json_request(
            Method::POST,
            "/companies/by",
            json!({ "filter": [{ "name": "Acme" }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Acme"));
    assert_eq!(rows[0]["id"], json!(1));

    let (status, body) = request_json(
        &router,
        json_request(
            Method::POST,
            "/login",
            json!({ "filter": [{ "code": "op-7", "password": "secret" }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["id"], json!(7));
    assert!(body["data"]["token"].is_string());
}
