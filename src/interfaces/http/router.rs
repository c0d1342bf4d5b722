//! API router with Swagger UI
//!
//! Route table (paths preserved from the original API):
//!
//! | Method | Path                | Auth  |
//! |--------|---------------------|-------|
//! | POST   | /users/login        | none  |
//! | POST   | /users/register     | none  |
//! | GET    | /users/all          | Admin |
//! | GET    | /users/{id}         | Admin |
//! | POST   | /users/create       | Admin |
//! | PUT    | /users/update/{id}  | Admin |
//! | DELETE | /users/delete/{id}  | Admin |
//! | POST   | /users/search       | Admin |
//! | POST   | /users/export       | Admin |
//! | GET    | /health             | none  |

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::jwt::JwtConfig;
use crate::auth::middleware::{admin_middleware, auth_middleware, AuthState};
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::middleware::{handle_panic, not_found};
use crate::interfaces::http::modules::{auth, health, users};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::register,
        // Users
        users::get_all_users,
        users::get_user_by_id,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::search_users,
        users::export_users,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and registration"),
        (name = "Users", description = "Admin-only user management"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

/// Build the application router.
pub fn create_router(db: DatabaseConnection, jwt_config: JwtConfig) -> Router {
    let repo = Arc::new(UserRepository::new(db.clone()));

    let auth_state = auth::AuthHandlerState {
        repo: Arc::clone(&repo),
        jwt_config: jwt_config.clone(),
    };
    let user_state = users::UserHandlerState { repo };
    let middleware_state = AuthState { jwt_config };

    // Anonymous routes
    let public_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .with_state(auth_state);

    // Admin-only routes. Layer order: auth runs first (outermost), then the
    // role check.
    let admin_routes = Router::new()
        .route("/all", get(users::get_all_users))
        .route("/create", post(users::create_user))
        .route("/search", post(users::search_users))
        .route("/export", post(users::export_users))
        .route("/update/{id}", put(users::update_user))
        .route("/delete/{id}", delete(users::delete_user))
        .route("/{id}", get(users::get_user_by_id))
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ))
        .with_state(user_state);

    let health_state = health::HealthState {
        db,
        started_at: Arc::new(Instant::now()),
    };
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health_state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/users", public_routes.merge(admin_routes))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::jwt::{create_token, verify_token};
    use crate::auth::password::verify_password;
    use crate::infrastructure::database::migrator::Migrator;

    async fn test_app() -> Router {
        // Single connection so the whole test shares one in-memory database
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1);
        let db = Database::connect(opts).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        create_router(db, JwtConfig::default())
    }

    fn admin_token() -> String {
        create_token("admin-id", "admin", true, &JwtConfig::default()).unwrap()
    }

    fn user_token() -> String {
        create_token("user-id", "joe", false, &JwtConfig::default()).unwrap()
    }

    fn request(
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> axum::http::Response<Body> {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn body_json(resp: axum::http::Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(resp: axum::http::Response<Body>) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn user_body(username: &str, password: &str, is_admin: bool, age: i32) -> Value {
        json!({
            "username": username,
            "password": password,
            "isAdmin": is_admin,
            "age": age,
            "hobbies": []
        })
    }

    async fn register(app: &Router, body: Value) -> axum::http::Response<Body> {
        send(app, request(Method::POST, "/users/register", None, Some(body))).await
    }

    #[tokio::test]
    async fn register_returns_created_with_location() {
        let app = test_app().await;
        let resp = register(&app, user_body("alice", "s3cret", false, 30)).await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        let location = resp
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = body_json(resp).await;
        assert_eq!(location, format!("/users/{}", body["id"].as_str().unwrap()));

        // Hashed, never the plaintext
        assert_ne!(body["password"], "s3cret");
        assert!(body["password"].as_str().unwrap().starts_with("$2"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let app = test_app().await;
        let resp = register(&app, user_body("bob", "pw", false, 25)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = register(&app, user_body("bob", "other", false, 40)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["message"], "Username is already taken");

        // Only one record persisted
        let resp = send(
            &app,
            request(Method::GET, "/users/all", Some(&admin_token()), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_register_body_is_400() {
        let app = test_app().await;

        // Missing required fields
        let resp = register(&app, json!({"username": "carl"})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "Invalid request body");

        // Empty username fails validation the same way
        let resp = register(&app, user_body("", "pw", false, 20)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_issues_token_with_matching_role_claim() {
        let app = test_app().await;
        register(&app, user_body("root", "hunter2", true, 42)).await;
        register(&app, user_body("plain", "hunter2", false, 24)).await;

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/login",
                None,
                Some(json!({"username": "root", "password": "hunter2"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let token = body_json(resp).await["token"].as_str().unwrap().to_string();

        let claims = verify_token(&token, &JwtConfig::default()).unwrap();
        assert_eq!(claims.username, "root");
        assert_eq!(claims.role, "Admin");

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/login",
                None,
                Some(json!({"username": "plain", "password": "hunter2"})),
            ),
        )
        .await;
        let token = body_json(resp).await["token"].as_str().unwrap().to_string();
        let claims = verify_token(&token, &JwtConfig::default()).unwrap();
        assert_eq!(claims.role, "User");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let app = test_app().await;
        register(&app, user_body("dana", "correct", false, 30)).await;

        let wrong_password = send(
            &app,
            request(
                Method::POST,
                "/users/login",
                None,
                Some(json!({"username": "dana", "password": "wrong"})),
            ),
        )
        .await;
        let unknown_user = send(
            &app,
            request(
                Method::POST,
                "/users/login",
                None,
                Some(json!({"username": "nobody", "password": "wrong"})),
            ),
        )
        .await;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

        let a = body_json(wrong_password).await;
        let b = body_json(unknown_user).await;
        assert_eq!(a["message"], "Invalid username or password");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn admin_routes_enforce_role_claim() {
        let app = test_app().await;

        let resp = send(&app, request(Method::GET, "/users/all", None, None)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["statusCode"], 401);

        let resp = send(
            &app,
            request(Method::GET, "/users/all", Some(&user_token()), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await["statusCode"], 403);

        let resp = send(
            &app,
            request(Method::GET, "/users/all", Some("garbage.token.here"), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_by_id_returns_user_or_404() {
        let app = test_app().await;
        let token = admin_token();

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/create",
                Some(&token),
                Some(user_body("erin", "pw", false, 28)),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();

        let resp = send(
            &app,
            request(Method::GET, &format!("/users/{}", id), Some(&token), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["username"], "erin");
        assert_ne!(body["password"], "pw");

        let resp = send(
            &app,
            request(Method::GET, "/users/no-such-id", Some(&token), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["message"], "User not found");
    }

    #[tokio::test]
    async fn update_always_rehashes_the_password() {
        let app = test_app().await;
        let token = admin_token();

        let resp = register(&app, user_body("frank", "same-pw", false, 33)).await;
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();

        let first = send(
            &app,
            request(
                Method::PUT,
                &format!("/users/update/{}", id),
                Some(&token),
                Some(user_body("frank", "same-pw", false, 33)),
            ),
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);
        let first_hash = body_json(first).await["password"]
            .as_str()
            .unwrap()
            .to_string();

        let second = send(
            &app,
            request(
                Method::PUT,
                &format!("/users/update/{}", id),
                Some(&token),
                Some(user_body("frank", "same-pw", false, 33)),
            ),
        )
        .await;
        let second_hash = body_json(second).await["password"]
            .as_str()
            .unwrap()
            .to_string();

        // Two distinct hashes, both verifiable against the plaintext
        assert_ne!(first_hash, second_hash);
        assert!(verify_password("same-pw", &first_hash).unwrap());
        assert!(verify_password("same-pw", &second_hash).unwrap());
    }

    #[tokio::test]
    async fn update_missing_user_is_404() {
        let app = test_app().await;
        let resp = send(
            &app,
            request(
                Method::PUT,
                "/users/update/no-such-id",
                Some(&admin_token()),
                Some(user_body("ghost", "pw", false, 1)),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_is_204_then_404() {
        let app = test_app().await;
        let token = admin_token();

        let resp = register(&app, user_body("gone", "pw", false, 50)).await;
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();

        let resp = send(
            &app,
            request(
                Method::DELETE,
                &format!("/users/delete/{}", id),
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(
            &app,
            request(
                Method::DELETE,
                &format!("/users/delete/{}", id),
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(
            &app,
            request(Method::DELETE, "/users/delete/never-existed", Some(&token), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_filters_and_rejects_unknown_fields() {
        let app = test_app().await;
        let token = admin_token();
        for (name, age) in [("alfred", 30), ("alice", 25), ("bob", 40)] {
            register(&app, user_body(name, "pw", false, age)).await;
        }

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/search",
                Some(&token),
                Some(json!({"fieldName": "username", "fieldValue": "al"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"alfred") && names.contains(&"alice"));

        // Hobbies matching is list membership; a JSON syntax character is
        // not a member of anyone's list
        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/search",
                Some(&token),
                Some(json!({"fieldName": "hobbies", "fieldValue": "["})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_json(resp).await.as_array().unwrap().is_empty());

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/search",
                Some(&token),
                Some(json!({"fieldName": "age", "fieldValue": "30"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Invalid field name");

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/search",
                Some(&token),
                Some(json!({"sortBy": "hobbies"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Invalid sort by field");
    }

    #[tokio::test]
    async fn search_paginates_sorted_results() {
        let app = test_app().await;
        let token = admin_token();
        // Register in reverse order so insertion order differs from sorted order
        for i in (0..15).rev() {
            register(&app, user_body(&format!("user{:02}", i), "pw", false, 20 + i)).await;
        }

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/search",
                Some(&token),
                Some(json!({"sortBy": "username", "pageNumber": 1})),
            ),
        )
        .await;
        let page1 = body_json(resp).await;
        assert_eq!(page1.as_array().unwrap().len(), 10);
        assert_eq!(page1[0]["username"], "user00");
        assert_eq!(page1[9]["username"], "user09");

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/search",
                Some(&token),
                Some(json!({"sortBy": "username", "pageNumber": 2})),
            ),
        )
        .await;
        let page2 = body_json(resp).await;
        assert_eq!(page2.as_array().unwrap().len(), 5);
        assert_eq!(page2[0]["username"], "user10");
    }

    #[tokio::test]
    async fn export_returns_csv_or_400() {
        let app = test_app().await;
        let token = admin_token();
        register(&app, user_body("harriet", "pw", false, 31)).await;
        register(&app, user_body("ivan", "pw", false, 29)).await;

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/export",
                Some(&token),
                Some(json!({"fieldValue": "harriet"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv"
        );
        let text = body_text(resp).await;
        assert!(text.contains("Username,Age"));
        assert!(text.contains("harriet,31"));
        assert!(!text.contains("ivan"));

        let resp = send(
            &app,
            request(
                Method::POST,
                "/users/export",
                Some(&token),
                Some(json!({"fieldValue": "zzz-no-match"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "No users found for export");

        let resp = send(
            &app,
            request(Method::POST, "/users/export", Some(&token), Some(json!({}))),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Invalid request body");
    }

    #[tokio::test]
    async fn unknown_route_returns_envelope() {
        let app = test_app().await;
        let resp = send(&app, request(Method::GET, "/nope", None, None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "Resource not found");
    }
}
