mod common;

use axum::http::{Method, StatusCode};
use common::{test_app, test_app_with};
use restaurant_catalog::{ReorderPolicy, models::Role, repository::Repository};
use serde_json::json;

#[tokio::test]
async fn test_create_category_assigns_increasing_orders() {
    let app = test_app();
    let cookie = app.owner_cookie().await;

    let res = app
        .request(
            Method::POST,
            "/api/categories",
            Some(&cookie),
            Some(json!({ "name": "Korean" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert!(res.body["message"].is_string());

    app.create_category(&cookie, "Chinese").await;
    app.create_category(&cookie, "Japanese").await;

    let list = app.get("/api/categories").await;
    assert_eq!(list.status, StatusCode::OK);
    let data = list.body["data"].as_array().unwrap();
    let names: Vec<&str> = data.iter().map(|c| c["name"].as_str().unwrap()).collect();
    let orders: Vec<i64> = data.iter().map(|c| c["order"].as_i64().unwrap()).collect();

    assert_eq!(names, vec!["Japanese", "Chinese", "Korean"]);
    assert_eq!(orders, vec![3, 2, 1]);
    assert!(data[0]["categoryId"].is_i64());
}

#[tokio::test]
async fn test_list_categories_is_public_and_empty_initially() {
    let app = test_app();
    let res = app.get("/api/categories").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "data": [] }));
}

#[tokio::test]
async fn test_create_category_validation() {
    let app = test_app();
    let cookie = app.owner_cookie().await;

    for body in [json!({}), json!({ "name": "" }), json!({ "name": "x".repeat(101) })] {
        let res = app
            .request(Method::POST, "/api/categories", Some(&cookie), Some(body))
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert!(res.error_message().contains("name"), "{}", res.error_message());
    }

    let res = app
        .request(
            Method::POST,
            "/api/categories",
            Some(&cookie),
            Some(json!({ "name": 42 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(!res.error_message().is_empty());
}

#[tokio::test]
async fn test_create_category_requires_credentials() {
    let app = test_app();
    let res = app
        .request(
            Method::POST,
            "/api/categories",
            None,
            Some(json!({ "name": "Korean" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(app.repo.list_categories().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_customer_cannot_mutate_categories() {
    let app = test_app();
    let owner_cookie = app.owner_cookie().await;
    let id = app.create_category(&owner_cookie, "Korean").await;

    let customer = app.seed_user("diner1", Role::Customer).await;
    let cookie = app.cookie_for(&customer);

    let res = app
        .request(
            Method::PATCH,
            &format!("/api/categories/{id}"),
            Some(&cookie),
            Some(json!({ "name": "Hacked", "order": 1 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .request(Method::DELETE, &format!("/api/categories/{id}"), Some(&cookie), None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let stored = app.repo.get_category(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Korean");
}

#[tokio::test]
async fn test_update_category_swaps_orders_with_holder() {
    let app = test_app();
    let cookie = app.owner_cookie().await;
    let b = app.create_category(&cookie, "B").await; // order 1
    let a = app.create_category(&cookie, "A").await; // order 2

    let res = app
        .request(
            Method::PATCH,
            &format!("/api/categories/{a}"),
            Some(&cookie),
            Some(json!({ "name": "A", "order": 1 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let a_row = app.repo.get_category(a).await.unwrap().unwrap();
    let b_row = app.repo.get_category(b).await.unwrap().unwrap();
    assert_eq!(a_row.order, 1);
    assert_eq!(b_row.order, 2);

    let list = app.get("/api/categories").await;
    assert_eq!(list.body["data"][0]["name"], "B");
}

#[tokio::test]
async fn test_swap_leaves_other_categories_in_place() {
    let app = test_app();
    let cookie = app.owner_cookie().await;
    let first = app.create_category(&cookie, "First").await; // order 1
    let middle = app.create_category(&cookie, "Middle").await; // order 2
    let last = app.create_category(&cookie, "Last").await; // order 3

    let res = app
        .request(
            Method::PATCH,
            &format!("/api/categories/{first}"),
            Some(&cookie),
            Some(json!({ "name": "First", "order": 3 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let mut orders = Vec::new();
    for id in [first, middle, last] {
        orders.push(app.repo.get_category(id).await.unwrap().unwrap().order);
    }
    assert_eq!(orders, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_deleting_unknown_category_leaves_catalog_unchanged() {
    let app = test_app();
    let cookie = app.owner_cookie().await;
    let korean = app.create_category(&cookie, "Korean").await;
    app.create_category(&cookie, "Chinese").await;
    app.create_menu(&cookie, korean, "Bibimbap", 9000).await;
    let before = app.get("/api/categories").await.body;

    let res = app
        .request(Method::DELETE, "/api/categories/999", Some(&cookie), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    assert_eq!(app.get("/api/categories").await.body, before);
    assert_eq!(app.repo.list_menus(korean).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_swap_leaves_name_untouched_by_default() {
    let app = test_app();
    let cookie = app.owner_cookie().await;
    app.create_category(&cookie, "B").await;
    let a = app.create_category(&cookie, "A").await;

    app.request(
        Method::PATCH,
        &format!("/api/categories/{a}"),
        Some(&cookie),
        Some(json!({ "name": "Renamed", "order": 1 })),
    )
    .await;

    let a_row = app.repo.get_category(a).await.unwrap().unwrap();
    assert_eq!(a_row.order, 1);
    assert_eq!(a_row.name, "A");
}

#[tokio::test]
async fn test_rename_with_same_order_applies_name() {
    let app = test_app();
    let cookie = app.owner_cookie().await;
    let a = app.create_category(&cookie, "A").await;

    let res = app
        .request(
            Method::PATCH,
            &format!("/api/categories/{a}"),
            Some(&cookie),
            Some(json!({ "name": "Renamed", "order": 1 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let row = app.repo.get_category(a).await.unwrap().unwrap();
    assert_eq!(row.name, "Renamed");
    assert_eq!(row.order, 1);
}

#[tokio::test]
async fn test_reorder_to_unused_value_is_ignored_by_default() {
    let app = test_app();
    let cookie = app.owner_cookie().await;
    let a = app.create_category(&cookie, "A").await;

    let res = app
        .request(
            Method::PATCH,
            &format!("/api/categories/{a}"),
            Some(&cookie),
            Some(json!({ "name": "Renamed", "order": 9 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let row = app.repo.get_category(a).await.unwrap().unwrap();
    assert_eq!(row.order, 1);
    assert_eq!(row.name, "A");
}

#[tokio::test]
async fn test_apply_all_policy_moves_and_renames() {
    let app = test_app_with(ReorderPolicy::ApplyAll);
    let cookie = app.owner_cookie().await;
    let b = app.create_category(&cookie, "B").await;
    let a = app.create_category(&cookie, "A").await;

    app.request(
        Method::PATCH,
        &format!("/api/categories/{a}"),
        Some(&cookie),
        Some(json!({ "name": "A2", "order": 1 })),
    )
    .await;
    let a_row = app.repo.get_category(a).await.unwrap().unwrap();
    let b_row = app.repo.get_category(b).await.unwrap().unwrap();
    assert_eq!((a_row.name.as_str(), a_row.order), ("A2", 1));
    assert_eq!((b_row.name.as_str(), b_row.order), ("B", 2));

    app.request(
        Method::PATCH,
        &format!("/api/categories/{b}"),
        Some(&cookie),
        Some(json!({ "name": "B2", "order": 7 })),
    )
    .await;
    let b_row = app.repo.get_category(b).await.unwrap().unwrap();
    assert_eq!((b_row.name.as_str(), b_row.order), ("B2", 7));
}

#[tokio::test]
async fn test_update_category_requires_name_and_order() {
    let app = test_app();
    let cookie = app.owner_cookie().await;
    let a = app.create_category(&cookie, "A").await;

    for body in [json!({ "order": 1 }), json!({ "name": "A" })] {
        let res = app
            .request(
                Method::PATCH,
                &format!("/api/categories/{a}"),
                Some(&cookie),
                Some(body),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_update_and_delete_missing_category_is_404() {
    let app = test_app();
    let cookie = app.owner_cookie().await;

    let res = app
        .request(
            Method::PATCH,
            "/api/categories/999",
            Some(&cookie),
            Some(json!({ "name": "A", "order": 1 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .request(Method::DELETE, "/api/categories/999", Some(&cookie), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(!res.error_message().is_empty());
}

#[tokio::test]
async fn test_invalid_category_id_is_400() {
    let app = test_app();
    let cookie = app.owner_cookie().await;

    for uri in ["/api/categories/0", "/api/categories/abc"] {
        let res = app.request(Method::DELETE, uri, Some(&cookie), None).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_delete_category_cascades_to_menus() {
    let app = test_app();
    let cookie = app.owner_cookie().await;
    let id = app.create_category(&cookie, "Korean").await;
    let menu = app.create_menu(&cookie, id, "Bibimbap", 9000).await;

    let res = app
        .request(Method::DELETE, &format!("/api/categories/{id}"), Some(&cookie), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    assert!(app.repo.get_category(id).await.unwrap().is_none());
    assert!(app.repo.get_menu(id, menu).await.unwrap().is_none());
    let res = app.get(&format!("/api/categories/{id}/menus")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
