use bazaar_api::config::{AppConfig, BootstrapAdmin};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

const SECRET: &str = "black-box-secret";
const ADMIN_EMAIL: &str = "adm@deliveryapp.com";
const ADMIN_PASSWORD: &str = "--adm2@21!!--";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let mut config = AppConfig::for_tests(SECRET);
        config.bootstrap_admin = Some(BootstrapAdmin {
            name: "Delivery App Admin".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        });

        let app = bazaar_api::app::build_app(&config)
            .await
            .expect("failed to build app");
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
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.header("Authorization", token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", token)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    async fn patch(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", token)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post("/users/login", None, json!({ "email": email, "password": password }))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn register(&self, name: &str, email: &str) -> Value {
        let (status, body) = self
            .post(
                "/users/create",
                None,
                json!({ "name": name, "email": email, "password": "$#zebirita#$" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body
    }

    async fn create_seller(&self, admin: &str) -> Value {
        let (status, body) = self
            .post(
                "/admin/create/user",
                Some(admin),
                json!({
                    "name": "Fulana Pereira da Silva",
                    "email": "fulana@deliveryapp.com",
                    "password": "fulana@123",
                    "role": "seller",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seller creation failed: {body}");
        body
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let text = res.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap()
    };
    (status, body)
}

fn mint_jwt(secret: &str, id: i64, role: &str, expires_in: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = json!({
        "identity": {
            "id": id,
            "name": "Forged Identity",
            "email": "forged@email.com",
            "role": role,
        },
        "iat": now.timestamp(),
        "exp": (now + expires_in).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn sale_body(seller_id: &Value) -> Value {
    json!({
        "sellerId": seller_id,
        "totalPrice": 4.40,
        "deliveryAddress": "Rua Irmãos Monteiro",
        "deliveryNumber": "851",
        "products": [{ "productId": 1, "quantity": 2 }],
    })
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let server = TestServer::spawn().await;

    for path in ["/products", "/sales", "/users/sellers"] {
        let res = server.client.get(server.url(path)).send().await.unwrap();
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "unauthorized", "message": "Token not found" }));
    }
}

#[tokio::test]
async fn invalid_and_expired_tokens_are_rejected() {
    let server = TestServer::spawn().await;

    let wrong_secret = mint_jwt("some-other-secret", 1, "administrator", ChronoDuration::minutes(10));
    let expired = mint_jwt(SECRET, 1, "administrator", ChronoDuration::minutes(-10));

    for token in ["not-a-jwt", wrong_secret.as_str(), expired.as_str()] {
        let (status, body) = server.get("/products", token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Expired or invalid token");
    }

    // Bearer scheme is accepted as well as the raw token.
    let admin = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = server
        .client
        .get(server.url("/products"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_login_and_validation() {
    let server = TestServer::spawn().await;

    let user = server.register("Cliente Zé Birita", "zebirita@email.com").await;
    assert_eq!(user["role"], "customer");
    assert_eq!(user["email"], "zebirita@email.com");
    assert!(user["token"].is_string());
    assert!(user.get("passwordDigest").is_none());
    assert!(user.get("password_digest").is_none());

    let (status, body) = server
        .post(
            "/users/create",
            None,
            json!({ "name": "Cliente Zé Birita", "email": "zebirita@email.com", "password": "$#zebirita#$" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already registered");

    let (status, body) = server
        .post(
            "/users/create",
            None,
            json!({ "name": "Zé Birita", "email": "other@email.com", "password": "$#zebirita#$" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "\"name\" length must be at least 12 characters long");

    let (status, body) = server
        .post(
            "/users/login",
            None,
            json!({ "email": "zebirita@email.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Incorrect email or password");

    let token = server.login("zebirita@email.com", "$#zebirita#$").await;
    let (status, products) = server.get("/products", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 11);
    assert_eq!(products[0]["name"], "Skol Lata 250ml");
}

#[tokio::test]
async fn only_administrators_manage_users() {
    let server = TestServer::spawn().await;
    let customer = server.register("Cliente Zé Birita", "zebirita@email.com").await;
    let customer_token = customer["token"].as_str().unwrap();

    let (status, body) = server
        .post(
            "/admin/create/user",
            Some(customer_token),
            json!({
                "name": "Fulana Pereira da Silva",
                "email": "fulana@deliveryapp.com",
                "password": "fulana@123",
                "role": "seller",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let admin = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let seller = server.create_seller(&admin).await;
    assert_eq!(seller["role"], "seller");

    let (status, sellers) = server.get("/users/sellers", customer_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sellers, json!([{ "id": seller["id"], "name": seller["name"] }]));

    let (status, _) = server.get("/users", customer_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, users) = server.get("/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 3);

    let (status, body) = server.get("/users/abc", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let delete = |token: &str| {
        server
            .client
            .delete(server.url(&format!("/admin/delete/user/{}", customer["id"])))
            .header("Authorization", token)
            .send()
    };
    assert_eq!(delete(customer_token).await.unwrap().status(), StatusCode::UNAUTHORIZED);
    assert_eq!(delete(&admin).await.unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(delete(&admin).await.unwrap().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sale_moves_through_its_lifecycle_by_the_right_parties() {
    let server = TestServer::spawn().await;
    let admin = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let seller = server.create_seller(&admin).await;
    let seller_token = server.login("fulana@deliveryapp.com", "fulana@123").await;
    let buyer = server.register("Cliente Zé Birita", "zebirita@email.com").await;
    let buyer_token = buyer["token"].as_str().unwrap();
    let outsider = server.register("Cliente Outra Pessoa", "outra@email.com").await;
    let outsider_token = outsider["token"].as_str().unwrap();

    let (status, sale) = server
        .post("/sales/create", Some(buyer_token), sale_body(&seller["id"]))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    assert_eq!(sale["status"], "Pendente");
    assert_eq!(sale["userId"], buyer["id"]);
    assert_eq!(sale["sellerId"], seller["id"]);
    let id = sale["id"].clone();
    let update = format!("/sales/update/{id}");

    let (status, details) = server.get(&format!("/sales/{id}"), buyer_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["products"].as_array().unwrap().len(), 1);

    // Buyer cannot start preparation; outsiders and admins are not parties.
    for token in [buyer_token, outsider_token, admin.as_str()] {
        let (status, body) = server.patch(&update, token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized");
    }

    let (status, body) = server.patch(&update, &seller_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": id, "status": "Preparando" }));

    let (_, body) = server.patch(&update, &seller_token).await;
    assert_eq!(body["status"], "Em Trânsito");

    // Only the buyer confirms delivery.
    let (status, _) = server.patch(&update, &seller_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server.patch(&update, buyer_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Entregue");

    // Terminal.
    for token in [buyer_token, seller_token.as_str()] {
        let (status, _) = server.patch(&update, token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (_, mine) = server.get("/sales/user", buyer_token).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, theirs) = server.get("/sales/user", outsider_token).await;
    assert!(theirs.as_array().unwrap().is_empty());
    let (_, assigned) = server.get("/sales/seller", &seller_token).await;
    assert_eq!(assigned[0]["status"], "Entregue");
}

#[tokio::test]
async fn sale_creation_checks_its_references() {
    let server = TestServer::spawn().await;
    let admin = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let seller = server.create_seller(&admin).await;
    let buyer = server.register("Cliente Zé Birita", "zebirita@email.com").await;
    let buyer_token = buyer["token"].as_str().unwrap();

    let (status, body) = server
        .post("/sales/create", Some(buyer_token), sale_body(&buyer["id"]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Seller not found");

    let mut body = sale_body(&seller["id"]);
    body["products"] = json!([{ "productId": 999, "quantity": 1 }]);
    let (status, body) = server.post("/sales/create", Some(buyer_token), body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let mut body = sale_body(&seller["id"]);
    body["products"] = json!([]);
    let (status, body) = server.post("/sales/create", Some(buyer_token), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = server.patch("/sales/update/404", buyer_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Sale not found");
}
