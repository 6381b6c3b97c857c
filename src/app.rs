use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{auth, posts, profiles};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "API running" }))
        .nest("/api",
              Router::new()
                  .merge(auth::router())
                  .merge(profiles::router())
                  .merge(posts::router())
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "5000".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, name: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/user",
            None,
            Some(json!({ "name": name, "email": format!("{name}@example.com"), "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let app = build_app(AppState::fake());

        let (status, body) = call(&app, Method::GET, "/api/posts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "No token, authorization denied");

        let (status, body) = call(&app, Method::GET, "/api/auth", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "Token is not valid");
    }

    #[tokio::test]
    async fn register_login_and_profile_round_trip() {
        let app = build_app(AppState::fake());
        let token = register(&app, "jane").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth",
            None,
            Some(json!({ "email": "jane@example.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/profile",
            Some(&token),
            Some(json!({ "status": "Developer", "skills": "rust, sql", "bio": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"], json!(["rust", "sql"]));

        let (status, body) = call(&app, Method::GET, "/api/profile/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bio"], "hi");
        assert_eq!(body["owner"]["name"], "jane");

        let (status, body) = call(&app, Method::GET, "/api/profile/user/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "Profile not found!");
    }

    #[tokio::test]
    async fn missing_entry_removal_is_soft() {
        let app = build_app(AppState::fake());
        let token = register(&app, "jane").await;
        call(
            &app,
            Method::POST,
            "/api/profile",
            Some(&token),
            Some(json!({ "status": "Dev", "skills": "rust" })),
        )
        .await;

        let uri = format!("/api/profile/experience/{}", uuid::Uuid::new_v4());
        let (status, body) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["msg"], "This experience not found!");
        assert!(body.get("profile").is_none());
    }

    #[tokio::test]
    async fn validation_errors_list_every_field() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::POST, "/api/user", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn post_comment_ownership_over_http() {
        let app = build_app(AppState::fake());
        let owner = register(&app, "owner").await;
        let commenter = register(&app, "commenter").await;

        let (_, post) = call(
            &app,
            Method::POST,
            "/api/posts",
            Some(&owner),
            Some(json!({ "text": "hello" })),
        )
        .await;
        let post_id = post["id"].as_str().unwrap().to_string();

        let (status, likes) = call(
            &app,
            Method::PUT,
            &format!("/api/posts/like/{post_id}"),
            Some(&commenter),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(likes.as_array().unwrap().len(), 1);

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/api/posts/like/{post_id}"),
            Some(&commenter),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, post) = call(
            &app,
            Method::POST,
            &format!("/api/posts/comment/{post_id}"),
            Some(&commenter),
            Some(json!({ "text": "nice" })),
        )
        .await;
        let comment_id = post["comments"][0]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/posts/comment/{post_id}/{comment_id}");
        let (status, _) = call(&app, Method::DELETE, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, post) = call(&app, Method::DELETE, &uri, Some(&commenter), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(post["comments"].as_array().unwrap().is_empty());

        let (status, _) = call(
            &app,
            Method::DELETE,
            &format!("/api/posts/{post_id}"),
            Some(&commenter),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unusable_bodies_are_validation_errors() {
        let app = build_app(AppState::fake());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/user",
            None,
            Some(json!({ "name": "jane", "email": "jane@example.com", "password": 123456 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["param"], "body");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/user")
            .body(Body::from(r#"{"name":"jane"}"#))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errors"][0]["msg"], "Content-Type must be application/json!");
    }

    #[tokio::test]
    async fn duplicate_user_and_bad_login_use_errors_list() {
        let app = build_app(AppState::fake());
        register(&app, "jane").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/user",
            None,
            Some(json!({ "name": "jane", "email": "jane@example.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"][0]["msg"], "User already exists!");

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth",
            None,
            Some(json!({ "email": "jane@example.com", "password": "wrong-one" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["msg"], "Invalid Credentials!");
    }
}
