mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

async fn put(
    app: axum::Router,
    uri: &str,
    content_type: &str,
    content_md5: Option<&str>,
    body: Vec<u8>,
) -> axum::http::Response<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", content_type);
    if let Some(md5) = content_md5 {
        builder = builder.header("content-md5", md5);
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

async fn import_csv(app: axum::Router, pool: &str, request_id: &str, csv: &str) -> axum::http::Response<Body> {
    let md5 = voucher_rs::content_hash::content_md5_base64(csv.as_bytes());
    put(
        app,
        &format!("/{pool}/import/{request_id}"),
        "text/csv",
        Some(&md5),
        csv.as_bytes().to_vec(),
    )
    .await
}

async fn issue(
    app: axum::Router,
    pool: &str,
    operator: &str,
    request_id: &str,
    transaction_id: &str,
    user_id: &str,
    denomination: &str,
) -> axum::http::Response<Body> {
    let body = serde_json::json!({
        "transaction_id": transaction_id,
        "user_id": user_id,
        "denomination": denomination,
    });
    put(
        app,
        &format!("/{pool}/issue/{operator}/{request_id}"),
        "application/json",
        None,
        serde_json::to_vec(&body).unwrap(),
    )
    .await
}

#[tokio::test]
async fn scenario_a_basic_issue_and_replay() {
    let db = common::setup_pool().await;
    let pool = common::unique_pool_name();

    let csv = "operator,denomination,voucher\nTank,red,Tr0\nTank,red,Tr1\n";
    let resp = import_csv(common::app(&db), &pool, "imp-0", csv).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = issue(common::app(&db), &pool, "Tank", "req-0", "tx-0", "u-0", "red").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = common::body_json(resp).await;
    let first_voucher = json["voucher"].as_str().unwrap().to_string();
    assert!(first_voucher == "Tr0" || first_voucher == "Tr1");

    let resp = issue(common::app(&db), &pool, "Tank", "req-1", "tx-1", "u-0", "red").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = common::body_json(resp).await;
    let second_voucher = json["voucher"].as_str().unwrap().to_string();
    assert_ne!(first_voucher, second_voucher);

    // Replaying req-0 returns the same voucher, not a third one.
    let resp = issue(common::app(&db), &pool, "Tank", "req-0", "tx-0", "u-0", "red").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = common::body_json(resp).await;
    assert_eq!(json["voucher"].as_str().unwrap(), first_voucher);

    // Same request_id, different parameters -> AuditMismatch.
    let resp = issue(common::app(&db), &pool, "Tank", "req-0", "tx-0", "u-0", "blue").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scenario_b_no_voucher_available() {
    let db = common::setup_pool().await;
    let pool = common::unique_pool_name();

    let csv = "operator,denomination,voucher\nTank,red,Tr0\nTank,red,Tr1\n";
    import_csv(common::app(&db), &pool, "imp-0", csv).await;
    issue(common::app(&db), &pool, "Tank", "req-0", "tx-0", "u-0", "red").await;
    issue(common::app(&db), &pool, "Tank", "req-1", "tx-1", "u-0", "red").await;

    let resp = issue(common::app(&db), &pool, "Tank", "req-2", "tx-2", "u-0", "blue").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = common::body_json(resp).await;
    assert_eq!(json["error"], "No voucher available.");

    // Replay of req-2 with identical params -> same error.
    let resp = issue(common::app(&db), &pool, "Tank", "req-2", "tx-2", "u-0", "blue").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Replay of req-2 with a different user_id -> AuditMismatch.
    let resp = issue(common::app(&db), &pool, "Tank", "req-2", "tx-2", "u-1", "blue").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scenario_c_import_idempotence() {
    let db = common::setup_pool().await;
    let pool = common::unique_pool_name();

    let csv_x = "operator,denomination,voucher\nTank,red,Tr0\n";
    let resp = import_csv(common::app(&db), &pool, "imp-0", csv_x).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Re-import the same request_id with identical content -> replay, no duplicates.
    let resp = import_csv(common::app(&db), &pool, "imp-0", csv_x).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let count_resp = common::app(&db)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/{pool}/voucher_counts"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = common::body_json(count_resp).await;
    let counts = json["voucher_counts"].as_array().unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0]["count"], 1);

    // Re-import with different content under the same request_id -> AuditMismatch.
    let csv_y = "operator,denomination,voucher\nTank,red,Tr9\n";
    let resp = import_csv(common::app(&db), &pool, "imp-0", csv_y).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scenario_d_export_partial_and_replay() {
    let db = common::setup_pool().await;
    let pool = common::unique_pool_name();

    let csv = "operator,denomination,voucher\n\
               Tank,red,R0\nTank,red,R1\nTank,blue,B0\nTank,blue,B1\n";
    import_csv(common::app(&db), &pool, "imp-0", csv).await;

    let export_body = serde_json::json!({
        "count": 1,
        "operators": ["Tank"],
        "denominations": ["red", "blue"],
    });
    let resp = put(
        common::app(&db),
        &format!("/{pool}/export/req-E"),
        "application/json",
        None,
        serde_json::to_vec(&export_body).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = common::body_json(resp).await;
    let vouchers = json["vouchers"].as_array().unwrap().clone();
    assert_eq!(vouchers.len(), 2);
    assert!(json["warnings"].as_array().unwrap().is_empty());

    // Replaying the same request returns the same two vouchers, no new consumption.
    let resp = put(
        common::app(&db),
        &format!("/{pool}/export/req-E"),
        "application/json",
        None,
        serde_json::to_vec(&export_body).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let replay_json = common::body_json(resp).await;
    assert_eq!(replay_json["vouchers"].as_array().unwrap(), &vouchers);

    // Same request_id, different count -> AuditMismatch.
    let mismatched_body = serde_json::json!({
        "count": 2,
        "operators": ["Tank"],
        "denominations": ["red", "blue"],
    });
    let resp = put(
        common::app(&db),
        &format!("/{pool}/export/req-E"),
        "application/json",
        None,
        serde_json::to_vec(&mismatched_body).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scenario_e_export_over_request_yields_warning() {
    let db = common::setup_pool().await;
    let pool = common::unique_pool_name();

    let csv = "operator,denomination,voucher\nTank,red,R0\nTank,red,R1\n";
    import_csv(common::app(&db), &pool, "imp-0", csv).await;

    let export_body = serde_json::json!({
        "count": 4,
        "operators": ["Tank"],
        "denominations": ["red"],
    });
    let resp = put(
        common::app(&db),
        &format!("/{pool}/export/req-F"),
        "application/json",
        None,
        serde_json::to_vec(&export_body).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = common::body_json(resp).await;
    assert_eq!(json["vouchers"].as_array().unwrap().len(), 2);
    assert_eq!(
        json["warnings"].as_array().unwrap(),
        &vec![serde_json::json!("Insufficient vouchers available for 'Tank' 'red'.")]
    );
}

#[tokio::test]
async fn scenario_f_audit_query_ordering() {
    let db = common::setup_pool().await;
    let pool = common::unique_pool_name();

    let csv = "operator,denomination,voucher\nTank,red,R0\nTank,red,R1\nTank,red,R2\n";
    import_csv(common::app(&db), &pool, "imp-0", csv).await;

    issue(common::app(&db), &pool, "Tank", "req-0", "tx-0", "u-1", "red").await;
    issue(common::app(&db), &pool, "Tank", "req-1", "tx-1", "u-1", "red").await;
    issue(common::app(&db), &pool, "Tank", "req-2", "tx-2", "u-1", "red").await;

    let resp = common::app(&db)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/{pool}/audit_query?field=user_id&value=u-1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = common::body_json(resp).await;
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["request_id"], "req-0");
    assert_eq!(results[1]["request_id"], "req-1");
    assert_eq!(results[2]["request_id"], "req-2");
    for entry in results {
        assert!(entry["created_at"].as_str().unwrap().contains('T'));
    }
}

#[tokio::test]
async fn issue_against_nonexistent_pool_is_404() {
    let db = common::setup_pool().await;
    let pool = common::unique_pool_name();

    let resp = issue(common::app(&db), &pool, "Tank", "req-0", "tx-0", "u-0", "red").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_with_wrong_md5_is_rejected() {
    let db = common::setup_pool().await;
    let pool = common::unique_pool_name();

    let csv = "operator,denomination,voucher\nTank,red,R0\n";
    let resp = put(
        common::app(&db),
        &format!("/{pool}/import/imp-bad"),
        "text/csv",
        Some("not-a-real-digest"),
        csv.as_bytes().to_vec(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let count_resp = common::app(&db)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/{pool}/voucher_counts"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(count_resp.status(), StatusCode::NOT_FOUND);
}
