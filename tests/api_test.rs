mod common;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::test_app;

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    // Extractor rejections from axum come back as plain text.
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, json))
}

async fn seed(app: &Router) -> Result<(i64, i64, i64)> {
    let (_, bank) = send(
        app,
        Method::POST,
        "/banks/",
        Some(json!({
            "bankCode": "044525225",
            "bankName": "Sberbank",
            "legalAddress": "19 Vavilova St"
        })),
    )
    .await?;
    let bank_id = bank["id"].as_i64().unwrap();

    let (_, atm) = send(
        app,
        Method::POST,
        "/atms/",
        Some(json!({
            "atmNumber": "ATM-0001",
            "atmAddress": "1 Tverskaya St",
            "bankId": bank_id
        })),
    )
    .await?;

    let (_, client) = send(
        app,
        Method::POST,
        "/clients/",
        Some(json!({
            "cardNumber": "4276000001",
            "fullName": "Ivan Petrov",
            "address": "5 Arbat St",
            "bankId": bank_id
        })),
    )
    .await?;

    Ok((
        bank_id,
        atm["id"].as_i64().unwrap(),
        client["id"].as_i64().unwrap(),
    ))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = send(&app, Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    Ok(())
}

#[tokio::test]
async fn test_create_then_get_bank() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, created) = send(
        &app,
        Method::POST,
        "/banks/",
        Some(json!({
            "id": 777,
            "bankCode": "044525225",
            "bankName": "Sberbank",
            "legalAddress": "19 Vavilova St"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_ne!(id, 777);

    let (status, fetched) = send(&app, Method::GET, &format!("/banks/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    assert_eq!(fetched["bankName"], "Sberbank");

    let (status, list) = send(&app, Method::GET, "/banks?skip=0&limit=10", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn test_update_bank_keeps_missing_fields() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let (bank_id, _, _) = seed(&app).await?;

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/banks/{bank_id}"),
        Some(json!({ "bankName": "Sber" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["bankName"], "Sber");
    assert_eq!(updated["bankCode"], "044525225");

    Ok(())
}

#[tokio::test]
async fn test_missing_records_return_404() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = send(&app, Method::DELETE, "/clients/999999", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["message"], "Client not found");

    let (status, body) = send(&app, Method::GET, "/atms/999999", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "ATM not found");

    let (status, body) = send(&app, Method::GET, "/operations/999999", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Withdrawal not found");

    Ok(())
}

#[tokio::test]
async fn test_invalid_bodies_return_400() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let (_, atm_id, client_id) = seed(&app).await?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/banks/",
        Some(json!({
            "bankCode": "0445252250000",
            "bankName": " ",
            "legalAddress": "19 Vavilova St"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"].as_array().map(Vec::len), Some(2));

    let (status, body) = send(
        &app,
        Method::POST,
        "/operations/",
        Some(json!({ "clientId": client_id, "atmId": atm_id, "amount": 0 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_AMOUNT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/operations/",
        Some(json!({ "amount": 100 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    Ok(())
}

#[tokio::test]
async fn test_bank_clients_route_pages_with_query_string() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let (bank_id, _, first_client) = seed(&app).await?;

    for card in ["4276000002", "4276000003", "4276000004"] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/clients",
            Some(json!({
                "cardNumber": card,
                "fullName": "Anna Petrova",
                "address": "7 Arbat St",
                "bankId": bank_id
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, all) = send(
        &app,
        Method::GET,
        &format!("/banks/{bank_id}/clients"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().cloned().unwrap_or_default();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0]["id"], first_client);

    let (status, page) = send(
        &app,
        Method::GET,
        &format!("/banks/{bank_id}/clients?skip=1&limit=2"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let page = page.as_array().cloned().unwrap_or_default();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["id"], all[1]["id"]);
    assert_eq!(page[1]["id"], all[2]["id"]);
    assert_eq!(page[0]["cardNumber"], "4276000002");

    let (_, tail) = send(
        &app,
        Method::GET,
        &format!("/banks/{bank_id}/clients?skip=3"),
        None,
    )
    .await?;
    assert_eq!(tail.as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/banks/{bank_id}/clients?skip=-1"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_attach_atm_to_bank_route() -> Result<()> {
    let (app, _temp) = test_app().await?;
    seed(&app).await?;
    let (_, other) = send(
        &app,
        Method::POST,
        "/banks",
        Some(json!({
            "bankCode": "044525974",
            "bankName": "Tinkoff",
            "legalAddress": "38A Khutorskaya St"
        })),
    )
    .await?;
    let other_id = other["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/banks/{other_id}/atms/ATM-0001"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ATM added to bank");

    let (_, atms) = send(&app, Method::GET, &format!("/banks/{other_id}/atms"), None).await?;
    assert_eq!(atms[0]["atmNumber"], "ATM-0001");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/banks/{other_id}/atms/NOPE"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_operations_routes() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let (_, atm_id, client_id) = seed(&app).await?;

    let (status, created) = send(
        &app,
        Method::POST,
        &format!("/atms/{atm_id}/operations"),
        Some(json!({
            "clientId": client_id,
            "date": "2024-05-01",
            "time": "10:15:00",
            "commission": true,
            "amount": 5000
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["atmId"], atm_id);
    assert_eq!(created["date"], "2024-05-01");
    assert_eq!(created["time"], "10:15:00");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/clients/{client_id}/operations"),
        Some(json!({ "atmId": atm_id, "amount": 700 })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, by_client) = send(
        &app,
        Method::GET,
        &format!("/clients/{client_id}/operations"),
        None,
    )
    .await?;
    assert_eq!(by_client.as_array().map(Vec::len), Some(2));

    let (_, commission) = send(&app, Method::GET, "/operations/commission", None).await?;
    assert_eq!(commission.as_array().map(Vec::len), Some(1));
    assert_eq!(commission[0]["id"], created["id"]);

    let (_, by_card) = send(&app, Method::GET, "/clients/card/4276000001", None).await?;
    assert_eq!(by_card[0]["id"], client_id);

    let (_, by_number) = send(&app, Method::GET, "/atms/number/ATM-0001", None).await?;
    assert_eq!(by_number[0]["id"], atm_id);

    Ok(())
}

#[tokio::test]
async fn test_delete_with_dependents_returns_409() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let (bank_id, atm_id, client_id) = seed(&app).await?;
    let (_, operation) = send(
        &app,
        Method::POST,
        "/operations",
        Some(json!({ "clientId": client_id, "atmId": atm_id, "amount": 100 })),
    )
    .await?;

    let (status, body) = send(&app, Method::DELETE, &format!("/banks/{bank_id}"), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(&app, Method::DELETE, &format!("/atms/{atm_id}"), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let operation_id = operation["id"].as_i64().unwrap();
    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/operations/{operation_id}"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Operation deleted");

    let (status, body) = send(&app, Method::DELETE, &format!("/atms/{atm_id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ATM deleted");

    Ok(())
}
