mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{complete_questionnaire, spawn_app};
use onboarding_backend::models::{
    candidate::CandidateStatus, invitation::InvitationStatus, user::UserRole,
};

#[tokio::test]
async fn ivan_petrov_completes_onboarding() {
    let app = spawn_app();
    let (_, recruiter) = app.seed_user("anna@example.com", UserRole::Recruiter).await;

    let issued = app.invite(&recruiter, "ivan.petrov@example.com").await;
    assert_eq!(issued["status"], "sent");
    assert_eq!(issued["emailSent"], true);
    let token = issued["token"].as_str().unwrap().to_string();
    let invitation_id = issued["id"].as_str().unwrap().to_string();
    assert_eq!(
        issued["invitationUrl"],
        format!("https://hr.example.com/questionnaire/{}", token)
    );

    let messages = app.mail.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to, "ivan.petrov@example.com");
    assert!(messages[0].html.contains(&token));

    let opened = app
        .send(
            "GET",
            &format!("/api/v1/questionnaires/token/{}", token),
            None,
            None,
            &[("x-forwarded-for", "203.0.113.9"), ("user-agent", "Mozilla/5.0")],
        )
        .await;
    assert_eq!(opened.status, StatusCode::OK);
    assert_eq!(opened.json()["status"], "draft");

    let invitation = app
        .get(&format!("/api/v1/invitations/{}", invitation_id), Some(&recruiter))
        .await
        .json();
    assert_eq!(invitation["status"], "opened");
    assert_eq!(invitation["ipAddress"], "203.0.113.9");
    assert_eq!(invitation["userAgent"], "Mozilla/5.0");

    let saved = app
        .post(
            &format!("/api/v1/questionnaires/token/{}", token),
            None,
            Some(complete_questionnaire()),
        )
        .await;
    assert_eq!(saved.status, StatusCode::OK, "{:?}", saved.json());

    let submitted = app
        .post(&format!("/api/v1/questionnaires/token/{}/submit", token), None, None)
        .await;
    assert_eq!(submitted.status, StatusCode::OK, "{:?}", submitted.json());
    let body = submitted.json();
    assert_eq!(body["status"], "submitted");
    assert!(body["submittedAt"].is_string());

    let stored = app
        .repos
        .invitations
        .find_by_token(&token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, InvitationStatus::Completed);
    assert!(stored.completed_at.is_some());

    let candidate = app
        .repos
        .candidates
        .find_by_email("ivan.petrov@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(candidate.status, CandidateStatus::QuestionnaireSubmitted);
}

#[tokio::test]
async fn repeated_invitations_keep_one_active() {
    let app = spawn_app();
    let (_, recruiter) = app.seed_user("anna@example.com", UserRole::Recruiter).await;

    let mut last_id = String::new();
    for _ in 0..3 {
        last_id = app.invite(&recruiter, "ivan@example.com").await["id"]
            .as_str()
            .unwrap()
            .to_string();
    }

    let all = app.get("/api/v1/invitations", Some(&recruiter)).await.json();
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    let active: Vec<_> = all
        .iter()
        .filter(|i| matches!(i["status"].as_str(), Some("pending" | "sent" | "opened")))
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"], last_id.as_str());
    assert!(all
        .iter()
        .filter(|i| i["id"] != last_id.as_str())
        .all(|i| i["status"] == "revoked"));
}

#[tokio::test]
async fn revoking_twice_conflicts() {
    let app = spawn_app();
    let (_, recruiter) = app.seed_user("anna@example.com", UserRole::Recruiter).await;
    let issued = app.invite(&recruiter, "ivan@example.com").await;
    let uri = format!("/api/v1/invitations/{}/revoke", issued["id"].as_str().unwrap());

    let first = app.post(&uri, Some(&recruiter), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json()["status"], "revoked");

    let second = app.post(&uri, Some(&recruiter), None).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.json()["error"], "Invitation is already revoked");

    let token = issued["token"].as_str().unwrap();
    let public = app
        .get(&format!("/api/v1/questionnaires/token/{}", token), None)
        .await;
    assert_eq!(public.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn email_failure_still_creates_pending_invitation() {
    let app = spawn_app();
    let (_, recruiter) = app.seed_user("anna@example.com", UserRole::Recruiter).await;
    app.mail.set_failing(true);

    let issued = app.invite(&recruiter, "ivan@example.com").await;
    assert_eq!(issued["status"], "pending");
    assert_eq!(issued["emailSent"], false);
    assert!(issued["sentAt"].is_null());

    app.mail.set_failing(false);
    let resent = app
        .post(
            &format!("/api/v1/invitations/{}/resend", issued["id"].as_str().unwrap()),
            Some(&recruiter),
            None,
        )
        .await;
    assert_eq!(resent.status, StatusCode::CREATED);
    let resent = resent.json();
    assert_eq!(resent["status"], "sent");
    assert_ne!(resent["token"], issued["token"]);
}

#[tokio::test]
async fn unknown_invitation_is_not_found() {
    let app = spawn_app();
    let (_, recruiter) = app.seed_user("anna@example.com", UserRole::Admin).await;
    let missing = uuid::Uuid::new_v4();
    let response = app
        .post(
            &format!("/api/v1/invitations/{}/resend", missing),
            Some(&recruiter),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .get(&format!("/api/v1/invitations/{}", missing), Some(&recruiter))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_invitation_payload_is_rejected() {
    let app = spawn_app();
    let (_, recruiter) = app.seed_user("anna@example.com", UserRole::Recruiter).await;
    let response = app
        .post(
            "/api/v1/invitations",
            Some(&recruiter),
            Some(json!({ "firstName": "", "lastName": "Petrov", "email": "not-an-email" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"], "Validation failed");
    assert!(body["fields"]["email"].is_array());
    assert!(app.mail.messages().is_empty());
}

#[tokio::test]
async fn candidate_detail_shows_invitations_and_questionnaire() {
    let app = spawn_app();
    let (_, recruiter) = app.seed_user("anna@example.com", UserRole::Recruiter).await;
    let (_, security) = app.seed_user("oleg@example.com", UserRole::Security).await;
    let issued = app.invite(&recruiter, "ivan@example.com").await;
    let token = issued["token"].as_str().unwrap();
    app.get(&format!("/api/v1/questionnaires/token/{}", token), None)
        .await;

    let candidate_id = issued["candidateId"].as_str().unwrap();
    let detail = app
        .get(&format!("/api/v1/candidates/{}", candidate_id), Some(&security))
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    let detail = detail.json();
    assert_eq!(detail["email"], "ivan@example.com");
    assert_eq!(detail["questionnaireStatus"], "draft");
    assert_eq!(detail["invitations"].as_array().unwrap().len(), 1);

    let forbidden = app
        .send(
            "DELETE",
            &format!("/api/v1/candidates/{}", candidate_id),
            Some(&security),
            None,
            &[],
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let deleted = app
        .send(
            "DELETE",
            &format!("/api/v1/candidates/{}", candidate_id),
            Some(&recruiter),
            None,
            &[],
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = app
        .get(&format!("/api/v1/questionnaires/token/{}", token), None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invitation_requires_phone() {
    let app = spawn_app();
    let (_, recruiter) = app.seed_user("anna@example.com", UserRole::Recruiter).await;

    for body in [
        json!({ "firstName": "Ivan", "lastName": "Petrov", "email": "ivan@example.com" }),
        json!({
            "firstName": "Ivan",
            "lastName": "Petrov",
            "email": "ivan@example.com",
            "phone": "  "
        }),
    ] {
        let response = app.post("/api/v1/invitations", Some(&recruiter), Some(body)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.json()["fields"]["phone"].is_array());
    }
    assert!(app.repos.candidates.list().await.unwrap().is_empty());
}
