//! Authentication and permission checks over real HTTP

mod helpers;

use helpers::{listing_json, spawn_app, TestApp, TestUser};
use reqwest::{Method, StatusCode};
use rentals_core::{NewListing, Role};
use serde_json::json;

#[derive(Debug, Clone, Copy)]
enum Op {
    Create,
    Read,
    Update,
    Delete,
}

const OPS: [Op; 4] = [Op::Create, Op::Read, Op::Update, Op::Delete];

/// Create a fresh target record through the service layer so that every
/// request below has something to act on.
async fn fresh_listing(app: &TestApp, realtor: &TestUser) -> String {
    let body = listing_json(realtor.id(), 2, 1000.0);
    let new: NewListing = serde_json::from_value(body).unwrap();
    app.state.listings.create(new).await.unwrap().id
}

async fn perform(app: &TestApp, token: &str, resource: &str, op: Op, realtor: &TestUser) -> StatusCode {
    let response = match (resource, op) {
        ("accounts", Op::Create) => {
            let user = TestUser::generate(Role::Client);
            app.request(Method::POST, "/accounts", Some(token))
                .json(&json!({ "username": user.username, "password": user.password, "role": "client" }))
                .send()
                .await
        }
        ("accounts", op) => {
            let target = app.seed_account(Role::Client).await;
            let path = format!("/accounts/{}", target.id());
            match op {
                Op::Read => app.request(Method::GET, &path, Some(token)).send().await,
                Op::Update => {
                    app.request(Method::PATCH, &path, Some(token))
                        .json(&json!({ "role": "realtor" }))
                        .send()
                        .await
                }
                _ => app.request(Method::DELETE, &path, Some(token)).send().await,
            }
        }
        ("listings", Op::Create) => {
            app.request(Method::POST, "/listings", Some(token))
                .json(&listing_json(realtor.id(), 1, 700.0))
                .send()
                .await
        }
        ("listings", op) => {
            let path = format!("/listings/{}", fresh_listing(app, realtor).await);
            match op {
                Op::Read => app.request(Method::GET, &path, Some(token)).send().await,
                Op::Update => {
                    app.request(Method::PATCH, &path, Some(token))
                        .json(&json!({ "available": false }))
                        .send()
                        .await
                }
                _ => app.request(Method::DELETE, &path, Some(token)).send().await,
            }
        }
        _ => unreachable!("unknown resource {}", resource),
    };
    response.expect("Failed to execute request.").status()
}

#[tokio::test]
async fn role_resource_operation_table() {
    let app = spawn_app().await;
    let realtor = app.seed_account(Role::Realtor).await;

    // (role, resource, granted operations)
    let table: [(Role, &str, &[usize]); 6] = [
        (Role::Admin, "accounts", &[0, 1, 2, 3]),
        (Role::Admin, "listings", &[0, 1, 2, 3]),
        (Role::Realtor, "accounts", &[]),
        (Role::Realtor, "listings", &[0, 1, 2, 3]),
        (Role::Client, "accounts", &[]),
        (Role::Client, "listings", &[1]),
    ];

    for (role, resource, granted) in table {
        let user = app.seed_account(role).await;
        let token = app.login(&user.username, &user.password).await;

        for (index, op) in OPS.iter().enumerate() {
            let status = perform(&app, &token, resource, *op, &realtor).await;
            if granted.contains(&index) {
                assert!(
                    status.is_success(),
                    "{} {:?} {} should succeed, got {}",
                    role,
                    op,
                    resource,
                    status
                );
            } else {
                assert_eq!(
                    status,
                    StatusCode::FORBIDDEN,
                    "{} {:?} {} should be forbidden",
                    role,
                    op,
                    resource
                );
            }
        }
    }
}

#[tokio::test]
async fn protected_path_rejection_ladder() {
    let app = spawn_app().await;
    let client = app.seed_account(Role::Client).await;
    let realtor = app.seed_account(Role::Realtor).await;
    let client_token = app.login(&client.username, &client.password).await;
    let realtor_token = app.login(&realtor.username, &realtor.password).await;
    let body = listing_json(realtor.id(), 3, 1500.0);

    // No Authorization header
    let response = app.request(Method::POST, "/listings", None).json(&body).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.text().await.unwrap(), "Not allowed");

    // Well-formed but never issued
    let unissued = "0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF";
    let response = app
        .request(Method::POST, "/listings", Some(unissued))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.text().await.unwrap(), "Not allowed");

    // Valid token, role lacks Create on listings
    let response = app
        .request(Method::POST, "/listings", Some(&client_token))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.text().await.unwrap(), "Not allowed");

    // Valid token with permission reaches the handler
    let response = app
        .request(Method::POST, "/listings", Some(&realtor_token))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn bad_token_is_401_even_where_role_would_be_denied() {
    let app = spawn_app().await;
    let response = app
        .request(Method::DELETE, "/accounts/anything", Some("NOT-A-TOKEN"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_prefix_is_part_of_the_token() {
    let app = spawn_app().await;
    let token = app.login_admin().await;

    let response = app
        .request(Method::GET, "/profile", Some(&format!("Bearer {}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.request(Method::GET, "/profile", Some(&token)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_is_idempotent_and_uniform_on_failure() {
    let app = spawn_app().await;
    let user = app.seed_account(Role::Realtor).await;

    let first = app.login(&user.username, &user.password).await;
    let second = app.login(&user.username, &user.password).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 48);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));

    let wrong_password = app.post_login(&user.username, "nope").await;
    let unknown_user = app.post_login("nobody-here", &user.password).await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.text().await.unwrap(),
        unknown_user.text().await.unwrap()
    );
}

#[tokio::test]
async fn concurrent_logins_return_one_token() {
    let app = spawn_app().await;
    let user = app.seed_account(Role::Client).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = app.api_client.clone();
        let url = format!("{}/login", app.address);
        let body = user.to_login_json();
        handles.push(tokio::spawn(async move {
            let response = client.post(url).json(&body).send().await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: serde_json::Value = response.json().await.unwrap();
            body["token"].as_str().unwrap().to_string()
        }));
    }

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert!(tokens.iter().all(|token| *token == tokens[0]));
    assert_eq!(
        app.state.authenticator.verify(&tokens[0]).await.unwrap().unwrap().username,
        user.username
    );
}
