mod common;

use std::sync::{Arc, Mutex};

use axum::{
    extract::Path,
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use club_signup::{
    api::{ApiBaseUrl, ApiClient, ApiError},
    model::{FormId, MemberTypeId, RegistrationRequest},
    RegistrationApi,
};
use serde_json::{json, Value};

use common::{form_json, stub_server, ACTIVE_MEMBER, FORM_ID};

fn request() -> RegistrationRequest {
    RegistrationRequest {
        full_name: "Test Testesen".to_string(),
        email: "test@example.com".to_string(),
        phone_number: "12345678".to_string(),
        birth_date: "15.06.1990".to_string(),
        member_type_id: MemberTypeId::from(ACTIVE_MEMBER),
        group_id: None,
    }
}

#[tokio::test]
async fn fetches_form_from_envelope() {
    let router = Router::new().route(
        "/api/form",
        get(|| async { Json(json!({ "success": true, "data": form_json() })) }),
    );
    let client = stub_server(router).await;

    let form = client.get_form().await.unwrap();

    assert_eq!(form.form_id.as_str(), FORM_ID);
    assert_eq!(form.title, "Coding camp summer 2025");
    assert_eq!(form.member_types.len(), 2);
}

#[tokio::test]
async fn fetches_bare_form() {
    let router = Router::new().route("/api/form", get(|| async { Json(form_json()) }));
    let client = stub_server(router).await;

    let form = client.get_form().await.unwrap();

    assert_eq!(form.club_id, "britsport");
}

#[tokio::test]
async fn fetches_form_by_id() {
    let router = Router::new().route(
        "/api/form/:id",
        get(|Path(id): Path<String>| async move {
            let mut form = form_json();
            form["formId"] = Value::from(id);
            Json(json!({ "success": true, "data": form }))
        }),
    );
    let client = stub_server(router).await;

    let form = client.get_form_by_id(&FormId::from("7")).await.unwrap();

    assert_eq!(form.form_id.as_str(), "7");
}

#[tokio::test]
async fn uses_envelope_message_for_failed_form_fetch() {
    let router = Router::new().route(
        "/api/form",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Kunne ikke hente registreringsskjema. Prøv igjen senere.",
                    "error": "FORM_FETCH_ERROR"
                })),
            )
        }),
    );
    let client = stub_server(router).await;

    let error = client.get_form().await.unwrap_err();

    assert_eq!(
        error.to_string(),
        "Kunne ikke hente registreringsskjema. Prøv igjen senere."
    );
    assert_eq!(error.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn joins_field_errors_inline_for_form_fetch() {
    let router = Router::new().route(
        "/api/form",
        get(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": "Bad lookup:",
                    "error": "VALIDATION_ERROR",
                    "fieldErrors": { "clubId": "unknown club", "formId": "malformed" }
                })),
            )
        }),
    );
    let client = stub_server(router).await;

    let error = client.get_form().await.unwrap_err();

    assert_eq!(error.to_string(), "Bad lookup: unknown club, malformed");
}

#[tokio::test]
async fn falls_back_to_status_when_body_is_not_json() {
    let router = Router::new()
        .route("/api/form", get(|| async { (StatusCode::NOT_FOUND, "nothing here") }))
        .route(
            "/api/form/:id",
            get(|| async { (StatusCode::BAD_GATEWAY, "<html>proxy</html>") }),
        );
    let client = stub_server(router).await;

    let error = client.get_form().await.unwrap_err();
    assert_eq!(error.to_string(), "Registration form not found.");

    let error = client.get_form_by_id(&FormId::from("1")).await.unwrap_err();
    assert_eq!(error.to_string(), "Error 502: Bad Gateway");
}

#[tokio::test]
async fn unsuccessful_envelope_is_an_error() {
    let router = Router::new()
        .route(
            "/api/form",
            get(|| async { Json(json!({ "success": false, "message": "Skjemaet er stengt" })) }),
        )
        .route(
            "/api/form/:id",
            get(|| async { Json(json!({ "success": false })) }),
        );
    let client = stub_server(router).await;

    let error = client.get_form().await.unwrap_err();
    assert_eq!(error.to_string(), "Skjemaet er stengt");

    let error = client.get_form_by_id(&FormId::from("1")).await.unwrap_err();
    assert_eq!(error.to_string(), "Could not fetch registration form");
}

#[tokio::test]
async fn rejects_forms_with_duplicate_member_types() {
    let router = Router::new().route(
        "/api/form",
        get(|| async {
            let mut form = form_json();
            form["memberTypes"] = json!([
                { "id": ACTIVE_MEMBER, "name": "Active Member" },
                { "id": ACTIVE_MEMBER, "name": "Active Member again" }
            ]);
            Json(json!({ "success": true, "data": form }))
        }),
    );
    let client = stub_server(router).await;

    assert!(matches!(
        client.get_form().await,
        Err(ApiError::InvalidForm(_))
    ));
}

#[tokio::test]
async fn reports_unreachable_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ApiBaseUrl::new(format!("http://{addr}/api")));
    let error = client.get_form().await.unwrap_err();

    assert!(matches!(error, ApiError::Connection(_)));
    assert_eq!(
        error.to_string(),
        "Could not connect to server. Please check your internet connection."
    );
}

#[tokio::test]
async fn posts_registration_as_json() {
    let seen: Arc<Mutex<Option<(String, Value)>>> = Arc::default();
    let recorder = seen.clone();

    let router = Router::new().route(
        "/api/form/:form_id/register",
        post(move |Path(form_id): Path<String>, Json(body): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                *recorder.lock().unwrap() = Some((form_id, body));
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "success": true,
                        "message": "Takk for din registrering! Du vil motta en bekreftelse på e-post.",
                        "registrationId": 1234567890,
                        "memberName": "Test Testesen"
                    })),
                )
            }
        }),
    );
    let client = stub_server(router).await;

    let response = client
        .submit_registration(&FormId::from(FORM_ID), &request())
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.registration_id, Some(1234567890));
    assert_eq!(response.member_name.as_deref(), Some("Test Testesen"));

    let (form_id, body) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(form_id, FORM_ID);
    assert_eq!(body["fullName"], "Test Testesen");
    assert_eq!(body["memberTypeId"], ACTIVE_MEMBER);
    assert!(body.get("groupId").is_none());
}

#[tokio::test]
async fn flattens_field_errors_into_lines() {
    let router = Router::new().route(
        "/api/form/:form_id/register",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": "Fix errors:",
                    "error": "VALIDATION_ERROR",
                    "fieldErrors": { "fullName": "required" }
                })),
            )
        }),
    );
    let client = stub_server(router).await;

    let error = client
        .submit_registration(&FormId::from(FORM_ID), &request())
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Fix errors:\n\nfullName: required");
}

#[tokio::test]
async fn keeps_server_order_of_field_errors() {
    // Written out by hand: `json!` maps sort their keys.
    const BODY: &str = r#"{
        "success": false,
        "message": "Vennligst rett opp følgende feil:",
        "error": "VALIDATION_ERROR",
        "fieldErrors": {
            "fullName": "Fullt navn er påkrevd",
            "email": "E-post må ha gyldig format"
        }
    }"#;

    let router = Router::new().route(
        "/api/form/:form_id/register",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "application/json")],
                BODY,
            )
        }),
    );
    let client = stub_server(router).await;

    let error = client
        .submit_registration(&FormId::from(FORM_ID), &request())
        .await
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Vennligst rett opp følgende feil:\n\nfullName: Fullt navn er påkrevd\nemail: E-post må ha gyldig format"
    );
}

#[tokio::test]
async fn surfaces_server_failures_on_submit() {
    let router = Router::new()
        .route(
            "/api/form/:form_id/register",
            post(|Path(form_id): Path<String>| async move {
                if form_id == "empty" {
                    return (StatusCode::CONFLICT, Json(json!({ "success": false })));
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "message": "En uventet feil oppstod under registrering. Prøv igjen senere.",
                        "error": "REGISTRATION_ERROR"
                    })),
                )
            }),
        );
    let client = stub_server(router).await;

    let error = client
        .submit_registration(&FormId::from(FORM_ID), &request())
        .await
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "En uventet feil oppstod under registrering. Prøv igjen senere."
    );

    let error = client
        .submit_registration(&FormId::from("empty"), &request())
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Registration failed");
}

#[tokio::test]
async fn accepted_status_with_failed_body_is_an_error() {
    let router = Router::new().route(
        "/api/form/:form_id/register",
        post(|| async { Json(json!({ "success": false, "message": "Allerede registrert" })) }),
    );
    let client = stub_server(router).await;

    let error = client
        .submit_registration(&FormId::from(FORM_ID), &request())
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Allerede registrert");
}
