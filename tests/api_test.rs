//! HTTP-level tests: authentication, role gates, catalog ownership and order access.

mod common;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use common::{bearer, catalog_input, insert_component, insert_parfum, insert_user, stock_of, test_state};
use perfumery::{
    db, routes,
    structs::{LoginResponse, OrderDetails, Parfum, Role, UserInfo},
};

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(routes::configure)
                .default_service(web::to(routes::default_handler)),
        )
        .await
    };
}

#[actix_web::test]
async fn register_login_and_user_info() {
    let state = test_state().await;
    let app = init_app!(state);

    let register = json!({
        "email": "Grace@Example.com",
        "password": "correct-horse-42!",
        "full_name": "Grace Hopper"
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register?userType=Supplier")
        .set_json(&register)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "grace@example.com", "password": "wrong-horse-42!" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "grace@example.com", "password": "correct-horse-42!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: LoginResponse = test::read_body_json(resp).await;
    assert_eq!(login.user.email, "grace@example.com");
    assert_eq!(login.user.full_name, "Grace Hopper");
    assert_eq!(login.user.roles, vec![Role::Supplier]);

    let req = test::TestRequest::get()
        .uri("/api/auth/user-info")
        .insert_header(("Authorization", format!("Bearer {}", login.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let info: UserInfo = test::read_body_json(resp).await;
    assert_eq!(info.id, login.user.id);

    let req = test::TestRequest::get()
        .uri("/api/supplier/data")
        .insert_header(("Authorization", format!("Bearer {}", login.token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn registration_validation() {
    let state = test_state().await;
    let app = init_app!(state);

    let cases = [
        (
            "/api/auth/register?userType=Admin",
            json!({ "email": "eve@example.com", "password": "correct-horse-42!" }),
        ),
        (
            "/api/auth/register",
            json!({ "email": "not-an-email", "password": "correct-horse-42!" }),
        ),
        (
            "/api/auth/register",
            json!({ "email": "eve@example.com", "password": "short" }),
        ),
    ];
    for (uri, body) in cases {
        let req = test::TestRequest::post().uri(uri).set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].is_string());
    }
}

#[actix_web::test]
async fn role_gates() {
    let state = test_state().await;
    let admin = insert_user(&state, "admin@example.com", Role::Admin).await;
    let client = insert_user(&state, "client@example.com", Role::Client).await;
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/admin/data").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/admin/data")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/admin/data")
        .insert_header(bearer(&state, &client, Role::Client))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri("/api/admin/data")
        .insert_header(bearer(&state, &admin, Role::Admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/client/data")
        .insert_header(bearer(&state, &client, Role::Client))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/nowhere").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn catalog_ownership_is_enforced() {
    let state = test_state().await;
    let owner = insert_user(&state, "owner@example.com", Role::Supplier).await;
    let rival = insert_user(&state, "rival@example.com", Role::Supplier).await;
    let client = insert_user(&state, "client@example.com", Role::Client).await;
    let admin = insert_user(&state, "admin@example.com", Role::Admin).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/parfum")
        .insert_header(bearer(&state, &client, Role::Client))
        .set_json(catalog_input("Santal", 2000, 3))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::post()
        .uri("/api/parfum")
        .insert_header(bearer(&state, &owner, Role::Supplier))
        .set_json(catalog_input("Santal", 2000, 3))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let parfum: Parfum = test::read_body_json(resp).await;
    assert_eq!(parfum.supplier_id, owner.id);

    let req = test::TestRequest::put()
        .uri(&format!("/api/parfum/{}", parfum.id))
        .insert_header(bearer(&state, &rival, Role::Supplier))
        .set_json(catalog_input("Stolen", 1, 99))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::put()
        .uri(&format!("/api/perfume/{}", parfum.id))
        .insert_header(bearer(&state, &owner, Role::Supplier))
        .set_json(catalog_input("Santal No. 2", 2100, 0))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::put()
        .uri("/api/parfum/9999")
        .insert_header(bearer(&state, &owner, Role::Supplier))
        .set_json(catalog_input("Ghost", 1, 1))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    // Out of stock rows are hidden from the public listing.
    let req = test::TestRequest::get().uri("/api/parfum").to_request();
    let listed: Vec<Parfum> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/api/parfum/{}", parfum.id))
        .to_request();
    let fetched: Parfum = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.name, "Santal No. 2");
    assert_eq!(fetched.available_quantity, 0);

    let req = test::TestRequest::get()
        .uri("/api/parfum/supplier")
        .insert_header(bearer(&state, &owner, Role::Supplier))
        .to_request();
    let own: Vec<Parfum> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(own.len(), 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/parfum/{}", parfum.id))
        .insert_header(bearer(&state, &rival, Role::Supplier))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/parfum/{}", parfum.id))
        .insert_header(bearer(&state, &admin, Role::Admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::post()
        .uri("/api/component")
        .insert_header(bearer(&state, &owner, Role::Supplier))
        .set_json(catalog_input("Bergamot", -5, 3))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn referenced_parfum_cannot_be_deleted() {
    let state = test_state().await;
    let supplier = insert_user(&state, "supplier@example.com", Role::Supplier).await;
    let client = insert_user(&state, "client@example.com", Role::Client).await;
    let parfum = insert_parfum(&state, supplier.id, "Cuir", 3000, 2).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/order/create-standard-order")
        .insert_header(bearer(&state, &client, Role::Client))
        .set_json(json!({ "items": [{ "parfum_id": parfum.id, "quantity": 1 }] }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/parfum/{}", parfum.id))
        .insert_header(bearer(&state, &supplier, Role::Supplier))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn standard_order_access_rules() {
    let state = test_state().await;
    let supplier = insert_user(&state, "supplier@example.com", Role::Supplier).await;
    let stranger = insert_user(&state, "stranger@example.com", Role::Supplier).await;
    let alice = insert_user(&state, "alice@example.com", Role::Client).await;
    let bob = insert_user(&state, "bob@example.com", Role::Client).await;
    let admin = insert_user(&state, "admin@example.com", Role::Admin).await;
    let parfum = insert_parfum(&state, supplier.id, "Chypre", 1000, 5).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/order/create-standard-order")
        .insert_header(bearer(&state, &supplier, Role::Supplier))
        .set_json(json!({ "items": [{ "parfum_id": parfum.id, "quantity": 1 }] }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::post()
        .uri("/api/order/create-standard-order")
        .insert_header(bearer(&state, &alice, Role::Client))
        .set_json(json!({ "items": [{ "parfum_id": parfum.id, "quantity": 5 }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: OrderDetails = test::read_body_json(resp).await;
    assert_eq!(order.order.total_price, 5000);
    assert_eq!(stock_of::<Parfum>(&state, parfum.id).await, 0);
    let order_uri = format!("/api/order/{}", order.order.id);

    let req = test::TestRequest::post()
        .uri("/api/order/create-standard-order")
        .insert_header(bearer(&state, &bob, Role::Client))
        .set_json(json!({ "items": [{ "parfum_id": parfum.id, "quantity": 1 }] }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    for (user, role, expected) in [
        (&alice, Role::Client, StatusCode::OK),
        (&bob, Role::Client, StatusCode::FORBIDDEN),
        (&supplier, Role::Supplier, StatusCode::OK),
        (&stranger, Role::Supplier, StatusCode::FORBIDDEN),
        (&admin, Role::Admin, StatusCode::OK),
    ] {
        let req = test::TestRequest::get()
            .uri(&order_uri)
            .insert_header(bearer(&state, user, role))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            expected,
            "{}",
            user.email
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/order/my-orders")
        .insert_header(bearer(&state, &bob, Role::Client))
        .to_request();
    let bobs: Vec<OrderDetails> = test::call_and_read_body_json(&app, req).await;
    assert!(bobs.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/order/supplier-orders")
        .insert_header(bearer(&state, &supplier, Role::Supplier))
        .to_request();
    let supplied: Vec<OrderDetails> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(supplied.len(), 1);

    let status_uri = format!("{order_uri}/status");
    for (user, role, expected) in [
        (&stranger, Role::Supplier, StatusCode::FORBIDDEN),
        (&alice, Role::Client, StatusCode::FORBIDDEN),
        (&supplier, Role::Supplier, StatusCode::NO_CONTENT),
        (&admin, Role::Admin, StatusCode::NO_CONTENT),
    ] {
        let req = test::TestRequest::put()
            .uri(&status_uri)
            .insert_header(bearer(&state, user, role))
            .set_json(json!({ "status": "Production" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            expected,
            "{}",
            user.email
        );
    }

    let req = test::TestRequest::delete()
        .uri(&order_uri)
        .insert_header(bearer(&state, &supplier, Role::Supplier))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&order_uri)
        .insert_header(bearer(&state, &admin, Role::Admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&order_uri)
        .insert_header(bearer(&state, &admin, Role::Admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn custom_order_pricing_by_supplier() {
    let state = test_state().await;
    let supplier = insert_user(&state, "supplier@example.com", Role::Supplier).await;
    let stranger = insert_user(&state, "stranger@example.com", Role::Supplier).await;
    let client = insert_user(&state, "client@example.com", Role::Client).await;
    let component = insert_component(&state, supplier.id, "Labdanum", 250, 10).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/order/create-custom-order")
        .insert_header(bearer(&state, &client, Role::Client))
        .set_json(json!({
            "name": "Night",
            "components": [{ "component_id": component.id, "quantity": 4 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let order: OrderDetails = test::read_body_json(resp).await;
    assert_eq!(location, Some(format!("/api/order/{}", order.order.id)));
    assert_eq!(order.order.total_price, 0);

    let price_uri = format!("/api/order/custom/{}/price", order.order.id);
    let req = test::TestRequest::put()
        .uri(&price_uri)
        .insert_header(bearer(&state, &stranger, Role::Supplier))
        .set_json(json!({ "price": 9900 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::put()
        .uri(&price_uri)
        .insert_header(bearer(&state, &supplier, Role::Supplier))
        .set_json(json!({ "price": 9900 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/order/{}", order.order.id))
        .insert_header(bearer(&state, &client, Role::Client))
        .to_request();
    let priced: OrderDetails = test::call_and_read_body_json(&app, req).await;
    assert_eq!(priced.order.total_price, 9900);
    assert_eq!(priced.custom_parfum.unwrap().custom_parfum.price, 9900);

    let req = test::TestRequest::put()
        .uri("/api/order/custom/9999/price")
        .insert_header(bearer(&state, &supplier, Role::Supplier))
        .set_json(json!({ "price": 1 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn admin_seeding_is_idempotent() {
    let state = test_state().await;

    assert!(db::seed_admin(&state, "Root@Example.com", "Admin@123").await.unwrap());
    assert!(!db::seed_admin(&state, "root@example.com", "Admin@123").await.unwrap());

    let admin = db::find_user_by_email(&state, "root@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        db::get_user_roles(&state, admin.id).await.unwrap(),
        vec![Role::Admin]
    );
}
