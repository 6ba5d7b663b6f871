use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use warehouse_api::app::{build_app, AppServices};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let app = build_app(Arc::new(AppServices::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.patch(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn root_and_health_respond() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(format!("{}/", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));

    let res = srv.client.get(format!("{}/health", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn category_lifecycle() {
    let srv = TestServer::spawn().await;

    let (status, shoes) = srv
        .post("/categories", json!({"name": "Shoes", "description": "Footwear"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = shoes["id"].as_i64().unwrap();

    let (status, body) = srv.post("/categories", json!({"name": "Shoes"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = srv.post("/categories", json!({"name": ""})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, updated) = srv
        .patch(&format!("/categories/{id}"), json!({"description": null}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Shoes");
    assert_eq!(updated["description"], Value::Null);

    let (status, list) = srv.get("/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, body) = srv.delete(&format!("/categories/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true}));

    let (status, body) = srv.get(&format!("/categories/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn product_hierarchy_walkthrough() {
    let srv = TestServer::spawn().await;

    let (_, shoes) = srv.post("/categories", json!({"name": "Shoes"})).await;
    let category_id = shoes["id"].as_i64().unwrap();

    let (status, parent) = srv
        .post(
            "/products/parents",
            json!({"name": "Sneaker X", "category_id": category_id, "price": "10.00"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(parent["parent_id"], Value::Null);
    assert_eq!(parent["category_id"], category_id);
    assert_eq!(parent["is_active"], true);
    assert!(parent.get("price").is_none());
    let parent_id = parent["id"].as_i64().unwrap();

    let (status, variant) = srv
        .post(
            &format!("/products/parents/{parent_id}/variants"),
            json!({
                "name": "Red - 42",
                "price": 59.99,
                "stock": 5,
                "sku": "SNX-RED-42",
                "attrs": {"color": "red", "size": 42}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(variant["parent_id"], parent_id);
    assert_eq!(variant["price"], "59.99");
    assert_eq!(variant["attrs"]["size"], 42);
    let variant_id = variant["id"].as_i64().unwrap();

    let (status, loaded) = srv.get(&format!("/products/parents/{parent_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["name"], "Sneaker X");
    assert_eq!(loaded["variants"].as_array().unwrap().len(), 1);
    assert_eq!(loaded["variants"][0]["sku"], "SNX-RED-42");

    let (status, body) = srv
        .post(
            &format!("/products/parents/{parent_id}/variants"),
            json!({"name": "Dup", "price": "1.00", "stock": 1, "sku": "SNX-RED-42"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = srv.delete(&format!("/products/parents/{parent_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true, "variants_deleted": 1}));

    let (status, _) = srv.get(&format!("/products/variants/{variant_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn updates_drop_out_of_role_fields() {
    let srv = TestServer::spawn().await;

    let (_, parent) = srv.post("/products/parents", json!({"name": "Sneaker X"})).await;
    let parent_id = parent["id"].as_i64().unwrap();
    let (_, other) = srv.post("/products/parents", json!({"name": "Boot Y"})).await;
    let other_id = other["id"].as_i64().unwrap();

    let (status, updated) = srv
        .patch(
            &format!("/products/parents/{parent_id}"),
            json!({"name": "Sneaker X2", "stock": 3, "is_active": false}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Sneaker X2");
    assert_eq!(updated["is_active"], false);
    assert!(updated.get("stock").is_none());

    let (_, variant) = srv
        .post(
            &format!("/products/parents/{parent_id}/variants"),
            json!({"name": "A", "price": "5.00", "stock": 1}),
        )
        .await;
    let variant_id = variant["id"].as_i64().unwrap();

    let (status, updated) = srv
        .patch(
            &format!("/products/variants/{variant_id}"),
            json!({"parent_id": other_id, "stock": 8, "sku": "A-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["parent_id"], parent_id);
    assert_eq!(updated["stock"], 8);
    assert_eq!(updated["sku"], "A-1");
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let srv = TestServer::spawn().await;
    let (_, parent) = srv.post("/products/parents", json!({"name": "Sneaker X"})).await;
    let parent_id = parent["id"].as_i64().unwrap();

    let (status, body) = srv.get("/products/variants/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, body) = srv
        .post(
            &format!("/products/parents/{parent_id}/variants"),
            json!({"name": "A", "price": "1.999", "stock": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv
        .post(
            &format!("/products/parents/{parent_id}/variants"),
            json!({"name": "A", "price": "1.00", "stock": -1}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = srv
        .post(&format!("/products/parents/{parent_id}/variants"), json!({"name": "A"}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_body");

    let (status, _) = srv
        .post(
            "/products/parents/999/variants",
            json!({"name": "A", "price": "1.00", "stock": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv
        .post("/products/parents", json!({"name": "P", "category_id": 404}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = srv
        .post(
            &format!("/products/parents/{parent_id}/variants"),
            json!({"name": "A", "price": "1.00", "stock": 1, "attrs": {"k": "a\u{0}b"}}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn lists_are_role_scoped_and_newest_first() {
    let srv = TestServer::spawn().await;
    let (_, p1) = srv.post("/products/parents", json!({"name": "P1"})).await;
    let (_, p2) = srv.post("/products/parents", json!({"name": "P2"})).await;
    let p1_id = p1["id"].as_i64().unwrap();
    srv.post(
        &format!("/products/parents/{p1_id}/variants"),
        json!({"name": "V1", "price": "1.00", "stock": 1}),
    )
    .await;

    let (_, parents) = srv.get("/products/parents").await;
    let ids: Vec<i64> = parents
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![p2["id"].as_i64().unwrap(), p1_id]);

    let (_, variants) = srv.get("/products/variants").await;
    assert_eq!(variants.as_array().unwrap().len(), 1);

    let (status, body) = srv.delete(&format!("/products/variants/{p1_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
