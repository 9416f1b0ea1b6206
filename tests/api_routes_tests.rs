//! HTTP-level tests for the `/api/v1` routes, driven through the router with
//! a scripted remote server.

use axum::http::{Method, StatusCode};
use invoice_gateway::remote::RemoteError;
use serde_json::json;
use std::sync::Arc;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{FakeRemote, insert_profile, invoice_row, profile_body, send, setup_test_app};

#[tokio::test]
async fn root_and_health_respond() {
    let (app, _db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "invoice-gateway");

    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn stored_profile_test_reports_success() {
    let (app, db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;
    let id = insert_profile(&db, "Servidor Norte", true).await;

    let (status, body) = send(&app, Method::POST, &format!("/api/v1/connections/{id}/test"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Conexión exitosa");
    assert_eq!(body["data"]["success"], true);
    assert!(body["data"]["server_info"]["version"].is_string());
    assert!(body["data"]["response_time"].is_u64());
}

#[tokio::test]
async fn unreachable_profile_test_is_service_unavailable() {
    let (app, db) = setup_test_app(Arc::new(FakeRemote::unreachable())).await;
    let id = insert_profile(&db, "Servidor Norte", true).await;

    let (status, body) = send(&app, Method::POST, &format!("/api/v1/connections/{id}/test"), None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Error de conectividad");
    assert_eq!(body["data"]["error"], "connection refused");
}

#[tokio::test]
async fn reachable_server_with_failing_diagnostic_still_succeeds() {
    let remote = Arc::new(FakeRemote {
        info_fails: true,
        ..FakeRemote::default()
    });
    let (app, _db) = setup_test_app(remote).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/connections/test",
        Some(profile_body("Ad hoc", true)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], true);
    assert_eq!(
        body["message"],
        "Conexión establecida pero error obteniendo información del servidor"
    );
    assert!(body["data"].get("server_info").is_none_or(|v| v.is_null()));
}

#[tokio::test]
async fn ad_hoc_test_accepts_a_body_without_profile_fields() {
    let (app, _db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/connections/test",
        Some(json!({
            "host": "db1",
            "port": 1433,
            "database_name": "Inv",
            "username": "sa",
            "password": "x"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Conexión exitosa");
    assert_eq!(body["data"]["success"], true);
}

#[tokio::test]
async fn ipv6_host_is_a_validation_error() {
    let remote = Arc::new(FakeRemote::healthy());
    let (app, _db) = setup_test_app(remote.clone()).await;

    let mut body = profile_body("Servidor V6", true);
    body["host"] = json!("::1");
    for uri in ["/api/v1/connections", "/api/v1/connections/test"] {
        let (status, response) = send(&app, Method::POST, uri, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(response["success"], false);
    }
    assert_eq!(remote.opens(), 0);
}

#[tokio::test]
async fn test_of_unknown_profile_is_not_found() {
    let (app, _db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;

    let (status, body) = send(&app, Method::POST, "/api/v1/connections/999/test", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn create_returns_profile_without_password() {
    let (app, _db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/connections",
        Some(profile_body("Servidor Norte", true)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Conexión creada exitosamente");
    assert_eq!(body["data"]["server_name"], "Servidor Norte");
    assert_eq!(body["data"]["has_password"], true);
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn create_validation_and_conflicts() {
    let (app, db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;
    insert_profile(&db, "Servidor Norte", false).await;

    let mut invalid = profile_body("x", true);
    invalid["port"] = json!(0);
    let (status, body) = send(&app, Method::POST, "/api/v1/connections", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_array().is_some_and(|e| e.len() >= 2));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/connections",
        Some(profile_body("Servidor Norte", false)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(&app, Method::POST, "/api/v1/connections", Some(json!({"host": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_of_unreachable_active_profile_is_rejected() {
    let (app, _db) = setup_test_app(Arc::new(FakeRemote::unreachable())).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/connections",
        Some(profile_body("Servidor Norte", true)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("connection refused")));

    let (_, listing) = send(&app, Method::GET, "/api/v1/connections", None).await;
    assert_eq!(listing["data"], json!([]));
}

#[tokio::test]
async fn invalid_ids_are_bad_requests() {
    let (app, _db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;

    for uri in ["/api/v1/connections/abc", "/api/v1/connections/0"] {
        let (status, _) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn update_requires_matching_body_id() {
    let (app, db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;
    let id = insert_profile(&db, "Servidor Norte", false).await;

    let mut body = profile_body("Servidor Renombrado", false);
    body["id"] = json!(id + 1);
    let (status, _) = send(&app, Method::PUT, &format!("/api/v1/connections/{id}"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    body["id"] = json!(id);
    let (status, updated) = send(&app, Method::PUT, &format!("/api/v1/connections/{id}"), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["server_name"], "Servidor Renombrado");
}

#[tokio::test]
async fn soft_and_hard_delete_routes() {
    let (app, db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;
    let soft = insert_profile(&db, "Servidor Blando", true).await;
    let hard = insert_profile(&db, "Servidor Duro", true).await;

    let (status, _) = send(&app, Method::PATCH, &format!("/api/v1/connections/{soft}/soft-delete"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/connections/{hard}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = send(&app, Method::GET, "/api/v1/connections", None).await;
    assert_eq!(listing["data"], json!([]));

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/connections/{soft}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["deleted_at"].is_string());

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/connections/{hard}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/connections/{hard}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_pagination_and_stats() {
    let (app, db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;
    for n in 0..12 {
        insert_profile(&db, &format!("Servidor {n:02}"), n % 3 == 0).await;
    }

    let (_, active) = send(&app, Method::GET, "/api/v1/connections?active_only=true", None).await;
    assert_eq!(active["data"].as_array().map(Vec::len), Some(4));

    let (status, active) = send(&app, Method::GET, "/api/v1/connections?active_only=si", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["data"].as_array().map(Vec::len), Some(4));

    let (status, body) = send(&app, Method::GET, "/api/v1/connections?active_only=quizas", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0].as_str().is_some_and(|e| e.contains("active_only")));

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/v1/connections/paginated?page=2&page_size=5",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["total"], 12);
    assert_eq!(page["data"]["total_pages"], 3);
    assert_eq!(page["data"]["data"][0]["server_name"], "Servidor 05");

    let (_, fallback) = send(
        &app,
        Method::GET,
        "/api/v1/connections/paginated?page=abc&page_size=-1",
        None,
    )
    .await;
    assert_eq!(fallback["data"]["page"], 1);
    assert_eq!(fallback["data"]["page_size"], 10);

    let (status, farthest) = send(
        &app,
        Method::GET,
        "/api/v1/connections/paginated?page=9223372036854775807&page_size=100",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(farthest["data"]["total"], 12);
    assert_eq!(farthest["data"]["data"], json!([]));

    let (_, stats) = send(&app, Method::GET, "/api/v1/connections/stats", None).await;
    assert_eq!(stats["data"], json!({"total": 12, "active": 4, "inactive": 8}));
}

#[tokio::test]
async fn invoice_query_returns_rows() {
    let remote = Arc::new(FakeRemote::with_rows(vec![invoice_row("101"), invoice_row("102")]));
    let (app, db) = setup_test_app(remote.clone()).await;
    let id = insert_profile(&db, "Servidor Norte", true).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/consultar",
        Some(json!({
            "idServer": id,
            "fechaDesde": "2024-01-01",
            "fechaHasta": "2024-01-31",
            "codigoProducto": "99100"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"][0]["numero_factura"], "101");
    assert_eq!(body["data"][0]["nombre"], "Casa Matriz");

    let (sql, params) = remote.last_query().expect("query issued");
    assert!(sql.contains("dff.codigo_producto_sfe = @P3"));
    assert_eq!(params.len(), 3);
    assert_eq!(remote.closes(), remote.opens());
}

#[tokio::test]
async fn invoice_query_outcomes() {
    let (app, db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;
    let id = insert_profile(&db, "Servidor Norte", true).await;

    let (status, body) = send(&app, Method::POST, "/api/v1/consultar", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Datos inválidos");
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(3));

    let filters = json!({"idServer": id, "fechaDesde": "2024-01-01", "fechaHasta": "2024-01-02"});
    let (status, body) = send(&app, Method::POST, "/api/v1/consultar", Some(filters)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no se encontraron facturas");

    let unknown = json!({"idServer": 999, "fechaDesde": "2024-01-01", "fechaHasta": "2024-01-02"});
    let (status, _) = send(&app, Method::POST, "/api/v1/consultar", Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remote_query_failure_echoes_driver_error() {
    let remote = Arc::new(FakeRemote {
        query_error: Some(RemoteError::Query("Invalid object name 'dbo.sfe_sucursal'".to_string())),
        ..FakeRemote::default()
    });
    let (app, db) = setup_test_app(remote).await;
    let id = insert_profile(&db, "Servidor Norte", true).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/consultar/sucursales?idServer={id}"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("Invalid object name")));
}

#[tokio::test]
async fn branch_listing_may_be_empty() {
    let (app, db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;
    let id = insert_profile(&db, "Servidor Norte", true).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/consultar/sucursales?idServer={id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = send(&app, Method::GET, "/api/v1/consultar/sucursales", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_product_code_is_not_found() {
    let (app, _db) = setup_test_app(Arc::new(FakeRemote::healthy())).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/codigoproducto", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = send(&app, Method::GET, "/api/v1/codigoproducto/99100", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/v1/codigoproducto/%20%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["El código de producto es requerido"]));
}
