//! Order read endpoints: per-user scoping, dual-key lookup, admin listing.

mod common;
use common::*;

use axum::http::StatusCode;

#[tokio::test]
async fn test_list_my_orders_is_scoped_to_the_caller() {
    let state = test_state();
    {
        let conn = state.db.get().unwrap();
        insert_test_order(&conn, "user-1", 10_000);
        insert_test_order(&conn, "user-1", 15_000);
        insert_test_order(&conn, "user-2", 99_000);
    }
    let app = app(state);

    let response = get_as(&app, "/api/orders", Some("user-1"), false).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    let orders = json.as_array().expect("array of orders");
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["user_id"] == "user-1"));
}

#[tokio::test]
async fn test_get_order_by_internal_id() {
    let state = test_state();
    let order = {
        let conn = state.db.get().unwrap();
        insert_test_order(&conn, "user-1", 20_000)
    };
    let app = app(state);

    let uri = format!("/api/orders/{}", order.id);

    let response = get_as(&app, &uri, Some("user-1"), false).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["id"], order.id.as_str());
    assert_eq!(json["status"], "pending");

    // Another user cannot read it; an admin can
    let response = get_as(&app, &uri, Some("user-2"), false).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_as(&app, &uri, Some("ops-1"), true).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_order_by_transaction_id() {
    let state = test_state();
    let order = {
        let conn = state.db.get().unwrap();
        insert_test_order(&conn, "user-1", 20_000)
    };
    let app = app(state);

    let uri = format!("/api/orders/by-transaction/{}", order.midtrans_order_id);
    let response = get_as(&app, &uri, Some("user-1"), false).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["id"], order.id.as_str());
    assert_eq!(json["midtrans_order_id"], order.midtrans_order_id.as_str());
}

#[tokio::test]
async fn test_get_missing_order_returns_not_found() {
    let state = test_state();
    let app = app(state);

    let response = get_as(&app, "/api/orders/missing", Some("user-1"), false).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_listing_requires_the_admin_role() {
    let state = test_state();
    {
        let conn = state.db.get().unwrap();
        insert_test_order(&conn, "user-1", 10_000);
        insert_test_order(&conn, "user-2", 99_000);
    }
    let app = app(state);

    let response = get_as(&app, "/admin/orders", Some("user-1"), false).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_as(&app, "/admin/orders", None, false).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_as(&app, "/admin/orders", Some("ops-1"), true).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}
