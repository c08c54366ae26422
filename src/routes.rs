// routes.rs
use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        assignments::assignment_handler, biddings::bidding_handler, cashouts::cashout_handler,
        jobs::job_handler, revenue::admin_handler, workers::worker_handler,
    },
    AppState,
};

async fn health_check(Extension(app_state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running",
        "store": app_state.store.backend(),
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/jobs", job_handler())
        .nest("/biddings", bidding_handler())
        .nest("/job-assignments", assignment_handler())
        .nest("/workers", worker_handler())
        .nest("/cashout-requests", cashout_handler())
        .nest("/admin", admin_handler());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db::memorydb::MemoryStore};
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        let config = Config::init_for_tests();
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        create_router(Arc::new(state))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn job_payload(client_id: Uuid, job_type: &str, payment_type: &str) -> Value {
        json!({
            "client_id": client_id,
            "category_id": Uuid::new_v4(),
            "title": "Tile the bathroom",
            "description": "About 12 square metres",
            "location": "Lagos",
            "duration_type": "days",
            "budget": "10000",
            "job_type": job_type,
            "payment_type": payment_type
        })
    }

    async fn open_worker(app: &Router, balance: &str) -> String {
        let (status, body) = call(app, Method::POST, "/api/workers", Some(json!({ "user_id": Uuid::new_v4() }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        if balance != "0" {
            let (status, _) = call(
                app,
                Method::PUT,
                &format!("/api/workers/{}/balance", id),
                Some(json!({ "amount": balance })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
        id
    }

    fn balance_of(body: &Value) -> f64 {
        body["data"]["balance"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn health_reports_store_backend() {
        let (status, body) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn direct_hire_flow_settles_online_payment() {
        let app = app();
        let worker_id = open_worker(&app, "500").await;

        let (status, body) = call(&app, Method::POST, "/api/jobs", Some(job_payload(Uuid::new_v4(), "direct_hire", "online"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["status"], "posted");
        let job_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/job-assignments",
            Some(json!({ "job_id": job_id, "worker_id": worker_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["assigned_by"]["kind"], "client");

        let (status, _) = call(&app, Method::PUT, &format!("/api/jobs/{}/start", job_id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::PUT, &format!("/api/jobs/{}/complete", job_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["job"]["status"], "completed");

        let (_, body) = call(&app, Method::GET, &format!("/api/workers/{}", worker_id), None).await;
        assert_eq!(balance_of(&body), 9000.0);

        let (status, body) = call(&app, Method::GET, "/api/admin/revenue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["job_title"], "Tile the bathroom");

        let (status, body) = call(&app, Method::PUT, &format!("/api/jobs/{}/complete", job_id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn bidding_flow_and_cashout_reject() {
        let app = app();
        let worker_id = open_worker(&app, "0").await;

        let (_, body) = call(&app, Method::POST, "/api/jobs", Some(job_payload(Uuid::new_v4(), "bidding", "online"))).await;
        let job_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/biddings",
            Some(json!({ "job_id": job_id, "worker_id": worker_id, "bid_amount": 9500, "message": "Available now" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let bid_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::PUT, &format!("/api/biddings/{}/accept", bid_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["bid"]["status"], "accepted");
        assert_eq!(body["data"]["job"]["status"], "assigned");

        let (status, _) = call(&app, Method::PUT, &format!("/api/biddings/{}/accept", bid_id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        call(&app, Method::PUT, &format!("/api/jobs/{}/complete", job_id), None).await;
        let (_, body) = call(&app, Method::GET, &format!("/api/workers/{}", worker_id), None).await;
        assert_eq!(balance_of(&body), 8500.0);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/cashout-requests",
            Some(json!({ "worker_id": worker_id, "amount": 1000, "bank_name": "First Bank", "bank_account": "0123456789" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let cashout_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/api/cashout-requests/{}/reject", cashout_id),
            Some(json!({ "admin_notes": "Wrong account" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "rejected");

        let (_, body) = call(&app, Method::GET, &format!("/api/workers/{}", worker_id), None).await;
        assert_eq!(balance_of(&body), 8500.0);

        let (status, _) = call(&app, Method::PUT, &format!("/api/cashout-requests/{}/approve", cashout_id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_requests_use_the_fail_envelope() {
        let app = app();

        let (status, body) = call(&app, Method::POST, "/api/jobs", Some(json!({ "title": "Only a title" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert!(body["message"].as_str().unwrap().starts_with("Missing required fields"));

        let (status, body) = call(&app, Method::POST, "/api/jobs", Some(json!({ "budget": [1, 2] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");

        let (status, body) = call(&app, Method::PUT, &format!("/api/jobs/{}/complete", Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "fail");

        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/job-assignments",
            Some(json!({ "worker_id": Uuid::new_v4() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::GET, "/api/jobs?status=unknown", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_ids_use_the_fail_envelope() {
        let app = app();

        for (method, uri) in [
            (Method::GET, "/api/jobs/not-a-uuid"),
            (Method::PUT, "/api/jobs/42/complete"),
            (Method::PUT, "/api/biddings/abc/accept"),
            (Method::GET, "/api/cashout-requests/abc"),
            (Method::GET, "/api/workers/abc/ledger"),
        ] {
            let (status, body) = call(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["status"], "fail", "{uri}");
            assert!(body["message"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn malformed_cashout_decision_is_refused() {
        let app = app();
        let worker_id = open_worker(&app, "500").await;

        let (_, body) = call(
            &app,
            Method::POST,
            "/api/cashout-requests",
            Some(json!({ "worker_id": worker_id, "amount": 200, "bank_name": "First Bank", "bank_account": "0123456789" })),
        )
        .await;
        let cashout_id = body["data"]["id"].as_str().unwrap().to_string();

        let request = Request::builder()
            .method(Method::PUT)
            .uri(format!("/api/cashout-requests/{}/approve", cashout_id))
            .header("content-type", "application/json")
            .body(Body::from("{\"admin_notes\": "))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (_, body) = call(&app, Method::GET, &format!("/api/cashout-requests/{}", cashout_id), None).await;
        assert_eq!(body["data"]["status"], "pending");
        let (_, body) = call(&app, Method::GET, &format!("/api/workers/{}", worker_id), None).await;
        assert_eq!(balance_of(&body), 500.0);

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/api/cashout-requests/{}/approve", cashout_id),
            Some(json!({ "admin_notes": "Paid out" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["request"]["admin_notes"], "Paid out");
    }
}
