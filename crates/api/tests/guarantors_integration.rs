//! Integration tests for the guarantor invitation workflow.
//!
//! Run with: cargo test -p applicant-tracking-api --test guarantors_integration

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{
    body_json, empty_request, guarantor_form, json_request, login, register_and_login,
    session_cookie, signup, token_from_link, TestApp, TestApplicant, FORM_BASE_URL,
};
use domain::models::InvitationStatus;
use domain::services::{MockMailer, SentMail};
use serde_json::{json, Value};
use uuid::Uuid;

async fn send_invite(app: &TestApp, cookie: &str, email: &str) -> (StatusCode, Value) {
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/guarantors/send-invite",
            json!({ "email": email }),
            Some(cookie),
        ))
        .await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn submit_form(app: &TestApp, token: &str, form: Value) -> (StatusCode, Value) {
    let response = app
        .send(json_request(
            Method::POST,
            &format!("/api/v1/guarantors/submit-form?token={}", token),
            form,
            None,
        ))
        .await;
    let status = response.status();
    (status, body_json(response).await)
}

/// Sends an invitation and returns its token.
async fn invite(app: &TestApp, cookie: &str, email: &str) -> String {
    let (status, body) = send_invite(app, cookie, email).await;
    assert_eq!(status, StatusCode::OK, "send-invite failed: {}", body);
    body["data"]["guarantorInvitation"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_invitation_happy_path() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;

    let (status, body) = send_invite(&app, &cookie, "Guarantor@Example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Guarantor invitation sent successfully");
    assert_eq!(body["data"]["emailDelivered"], true);

    let invitation = &body["data"]["guarantorInvitation"];
    assert_eq!(invitation["email"], "guarantor@example.com");
    assert_eq!(invitation["status"], "pending");
    let link = invitation["link"].as_str().unwrap();
    assert!(link.starts_with(&format!("{}/guarantor-form?token=", FORM_BASE_URL)));

    let mailed_link = app
        .mailer
        .sent()
        .into_iter()
        .find_map(|m| match m {
            SentMail::GuarantorInvitation { to, link } if to == "guarantor@example.com" => {
                Some(link)
            }
            _ => None,
        })
        .expect("Invitation should be mailed");
    assert_eq!(mailed_link, link);

    let token = token_from_link(link);
    let (status, body) = submit_form(&app, &token, guarantor_form("guarantor@example.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Guarantor added successfully");
    assert_eq!(body["data"]["invitationCompleted"], true);
    assert_eq!(body["data"]["guarantor"]["email"], "guarantor@example.com");
    let guarantor_id = body["data"]["guarantor"]["id"].as_str().unwrap().to_string();

    let response = app
        .send(empty_request(
            Method::GET,
            "/api/v1/guarantors/invites",
            Some(cookie.as_str()),
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(
        body["data"]["guarantorInvitations"][0]["status"],
        "completed"
    );

    let response = app
        .send(empty_request(
            Method::GET,
            &format!("/api/v1/guarantors/{}", guarantor_id),
            Some(cookie.as_str()),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["guarantor"]["name"], "Chidi Okafor");
}

#[tokio::test]
async fn test_send_invite_requires_session() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/guarantors/send-invite",
            json!({ "email": "g@example.com" }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_send_invite_rejects_invalid_email() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;

    let (status, body) = send_invite(&app, &cookie, "not-an-email").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email format");
}

#[tokio::test]
async fn test_invitation_kept_when_email_fails() {
    let app = TestApp::with_mailer(MockMailer::failing());
    let applicant = TestApplicant::new();

    // No code can be mailed, so verify the account directly.
    let body = body_json(signup(&app, &applicant).await).await;
    let id: Uuid = body["data"]["applicant"]["id"].as_str().unwrap().parse().unwrap();
    app.store.set_flags(id, true, true);
    let response = login(&app, &applicant.email, &applicant.password).await;
    let cookie = session_cookie(&response).unwrap();

    let (status, body) = send_invite(&app, &cookie, "g@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["emailDelivered"], false);

    let stored = app.store.invitations();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, InvitationStatus::Pending);
}

#[tokio::test]
async fn test_capacity_blocks_fourth_guarantor() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;

    for n in 0..3 {
        let email = format!("g{}@example.com", n);
        let token = invite(&app, &cookie, &email).await;
        let (status, _) = submit_form(&app, &token, guarantor_form(&email)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send_invite(&app, &cookie, "g3@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Maximum number of guarantors reached");
    assert_eq!(body["statusCode"], 400);

    let response = app
        .send(empty_request(
            Method::GET,
            "/api/v1/guarantors?page=1&limit=2",
            Some(cookie.as_str()),
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["guarantors"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["pagination"]["total"], 3);
    assert_eq!(body["data"]["pagination"]["hasNextPage"], true);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_submissions_cannot_exceed_capacity() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;

    let mut pending = Vec::new();
    for n in 0..3 {
        let email = format!("g{}@example.com", n);
        pending.push((email.clone(), invite(&app, &cookie, &email).await));
    }
    let (email, token) = pending.remove(0);
    let token_a = invite(&app, &cookie, "a@example.com").await;
    let (status, _) = submit_form(&app, &token, guarantor_form(&email)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = submit_form(&app, &token_a, guarantor_form("a@example.com")).await;
    assert_eq!(status, StatusCode::OK);

    // Two guarantors stored, two invitations left; plus a third racing on a
    // token already used.
    let (results_b, results_c, results_d) = tokio::join!(
        submit_form(&app, &pending[0].1, guarantor_form(&pending[0].0)),
        submit_form(&app, &pending[1].1, guarantor_form(&pending[1].0)),
        submit_form(&app, &token_a, guarantor_form("a@example.com")),
    );

    let statuses = [results_b.0, results_c.0, results_d.0];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(app.store.guarantors().len(), 3);
}

#[tokio::test]
async fn test_capacity_checked_again_on_submit() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;

    // Four invitations outstanding while fewer than three guarantors exist.
    let mut tokens = Vec::new();
    for n in 0..4 {
        let email = format!("g{}@example.com", n);
        tokens.push((email.clone(), invite(&app, &cookie, &email).await));
    }

    for (email, token) in &tokens[..3] {
        let (status, _) = submit_form(&app, token, guarantor_form(email)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (email, token) = &tokens[3];
    let (status, body) = submit_form(&app, token, guarantor_form(email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Maximum number of guarantors reached");
    assert_eq!(app.store.guarantors().len(), 3);
}

#[tokio::test]
async fn test_duplicate_guarantor_rejected() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;

    let first = invite(&app, &cookie, "dup@example.com").await;
    let second = invite(&app, &cookie, "dup@example.com").await;

    let (status, _) = submit_form(&app, &first, guarantor_form("dup@example.com")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = submit_form(&app, &second, guarantor_form("dup@example.com")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Guarantor already exists");
}

#[tokio::test]
async fn test_submit_form_token_errors() {
    let app = TestApp::new();

    let (status, body) = submit_form(&app, "not-a-jwt", guarantor_form("g@example.com")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid invitation token");

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/guarantors/submit-form",
            guarantor_form("g@example.com"),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid invitation token");
}

#[tokio::test]
async fn test_submit_form_email_must_match_invitation() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;
    let token = invite(&app, &cookie, "invited@example.com").await;

    let (status, body) = submit_form(&app, &token, guarantor_form("someone@example.com")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email does not match the invitation");
    assert!(app.store.guarantors().is_empty());
}

#[tokio::test]
async fn test_submit_form_without_email_uses_invited_address() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;
    let token = invite(&app, &cookie, "invited@example.com").await;

    let mut form = guarantor_form("unused@example.com");
    form.as_object_mut().unwrap().remove("email");
    let (status, body) = submit_form(&app, &token, form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["guarantor"]["email"], "invited@example.com");
}

#[tokio::test]
async fn test_get_invites_expires_overdue_invitations() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;

    let stale = invite(&app, &cookie, "old@example.com").await;
    invite(&app, &cookie, "new@example.com").await;
    app.store
        .set_invitation_expiry(&stale, Utc::now() - Duration::minutes(5));

    let response = app
        .send(empty_request(
            Method::GET,
            "/api/v1/guarantors/invites",
            Some(cookie.as_str()),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Guarantor invitations fetched successfully");

    let invitations = body["data"]["guarantorInvitations"].as_array().unwrap();
    assert_eq!(invitations.len(), 2);
    for invitation in invitations {
        let expected = if invitation["email"] == "old@example.com" {
            "expired"
        } else {
            "pending"
        };
        assert_eq!(invitation["status"], expected);
    }

    let statuses: Vec<InvitationStatus> =
        app.store.invitations().into_iter().map(|i| i.status).collect();
    assert!(statuses.contains(&InvitationStatus::Expired));

    let (status, body) = submit_form(&app, &stale, guarantor_form("old@example.com")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invitation token has expired");
    assert!(app.store.guarantors().is_empty());
}

#[tokio::test]
async fn test_get_guarantor_of_another_applicant_not_found() {
    let app = TestApp::new();
    let owner = register_and_login(&app, &TestApplicant::new()).await;
    let other = register_and_login(&app, &TestApplicant::new()).await;

    let token = invite(&app, &owner, "g@example.com").await;
    let (_, body) = submit_form(&app, &token, guarantor_form("g@example.com")).await;
    let guarantor_id = body["data"]["guarantor"]["id"].as_str().unwrap().to_string();

    let response = app
        .send(empty_request(
            Method::GET,
            &format!("/api/v1/guarantors/{}", guarantor_id),
            Some(other.as_str()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Guarantor not found");
}

#[tokio::test]
async fn test_get_guarantor_malformed_id() {
    let app = TestApp::new();
    let cookie = register_and_login(&app, &TestApplicant::new()).await;

    let response = app
        .send(empty_request(
            Method::GET,
            "/api/v1/guarantors/not-a-uuid",
            Some(cookie.as_str()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
