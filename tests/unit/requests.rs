use axum::body::Body;
use axum::extract::FromRequest;
use axum::http::Request;
use lead_engine::db::models::api::ActionResponse;
use lead_engine::error::AppError;
use lead_engine::routes::leads::{GenerateLeadsRequest, RevokeApprovalRequest};
use lead_engine::validation::{OptionalValidatedJson, parse_optional_body};

use super::support::day;

fn post(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/campaigns/00000000-0000-0000-0000-000000000000/generate-leads")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn field_of(err: &AppError) -> Option<String> {
    match err {
        AppError::Validation { details, .. } => details.first().and_then(|d| d.field.clone()),
        _ => None,
    }
}

#[test]
fn generate_without_body_uses_today() {
    let OptionalValidatedJson(req) = tokio_test::block_on(
        OptionalValidatedJson::<GenerateLeadsRequest>::from_request(post(""), &()),
    )
    .unwrap();
    assert_eq!(req.resolve_date(day(19)).unwrap(), day(19));

    let req: GenerateLeadsRequest = parse_optional_body(b"{}").unwrap();
    assert_eq!(req.resolve_date(day(19)).unwrap(), day(19));
}

#[test]
fn generate_with_explicit_date() {
    let OptionalValidatedJson(req) = tokio_test::block_on(
        OptionalValidatedJson::<GenerateLeadsRequest>::from_request(
            post(r#"{"date":"2026-10-21"}"#),
            &(),
        ),
    )
    .unwrap();
    assert_eq!(req.resolve_date(day(19)).unwrap(), day(21));
}

#[test]
fn generate_with_impossible_date_is_rejected() {
    let req: GenerateLeadsRequest = parse_optional_body(br#"{"date":"2026-13-45"}"#).unwrap();
    let err = req.resolve_date(day(19)).unwrap_err();
    assert_eq!(err.code(), "INVALID_DATE");
    assert_eq!(field_of(&err).as_deref(), Some("date"));

    let req: GenerateLeadsRequest = parse_optional_body(br#"{"date":"19/10/2026"}"#).unwrap();
    assert_eq!(req.resolve_date(day(19)).unwrap_err().code(), "INVALID_DATE");
}

#[test]
fn generate_with_malformed_body_is_rejected() {
    let err = tokio_test::block_on(OptionalValidatedJson::<GenerateLeadsRequest>::from_request(
        post(r#"{"date":"#),
        &(),
    ))
    .err()
    .unwrap();
    assert_eq!(err.code(), "INVALID_JSON");

    let err = parse_optional_body::<GenerateLeadsRequest>(br#"{"date":20261019}"#).unwrap_err();
    assert_eq!(err.code(), "INVALID_JSON");
}

#[test]
fn revoke_body_is_optional_but_checked_when_present() {
    let req: RevokeApprovalRequest = parse_optional_body(b"").unwrap();
    assert!(req.notes.is_none());

    let req: RevokeApprovalRequest = parse_optional_body(br#"{"notes":"customer disputed"}"#).unwrap();
    assert_eq!(req.notes.as_deref(), Some("customer disputed"));

    let body = format!(r#"{{"notes":"{}"}}"#, "x".repeat(2001));
    let err = parse_optional_body::<RevokeApprovalRequest>(body.as_bytes()).unwrap_err();
    assert_eq!(err.code(), "LENGTH");
    assert_eq!(field_of(&err).as_deref(), Some("notes"));

    let err = parse_optional_body::<RevokeApprovalRequest>(b"notes=please").unwrap_err();
    assert_eq!(err.code(), "INVALID_JSON");
}

#[test]
fn action_envelope_is_flat() {
    let body = serde_json::json!({ "count": 4, "date": "2026-10-19" });
    let value = serde_json::to_value(ActionResponse::new(true, "Generated 4 leads", body)).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["count"], 4);
    assert_eq!(value["date"], "2026-10-19");
    assert!(value.get("body").is_none());
    assert!(value["timestamp"].is_string());
}
