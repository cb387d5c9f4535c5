use crate::helpers::spawn_app;
use weather_desk::domain::UserEmail;

#[tokio::test]
async fn updating_the_profile_requires_a_token() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;

    let response = app
        .put_update_profile(
            "ursula@gmail.com",
            &serde_json::json!({ "name": "Ursula K." }),
            None,
        )
        .await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(response.headers()["WWW-Authenticate"], "Bearer");
}

#[tokio::test]
async fn a_garbage_token_is_rejected() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;

    let response = app
        .put_update_profile(
            "ursula@gmail.com",
            &serde_json::json!({ "name": "Ursula K." }),
            Some("not-a-token"),
        )
        .await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn users_can_rename_themselves() {
    let app = spawn_app().await;
    let token = app.signup("Ursula", "ursula@gmail.com", "earthsea").await;

    let response = app
        .put_update_profile(
            "ursula@gmail.com",
            &serde_json::json!({ "name": "Ursula K." }),
            Some(&token),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Profile updated successfully.");
    assert_eq!(body["user"]["name"], "Ursula K.");
    assert!(body["user"].get("passwordHash").is_none());
    // The password did not change.
    app.login("ursula@gmail.com", "earthsea").await;
}

#[tokio::test]
async fn a_new_password_is_used_on_the_next_login() {
    let app = spawn_app().await;
    let token = app.signup("Ursula", "ursula@gmail.com", "earthsea").await;

    let response = app
        .put_update_profile(
            "ursula@gmail.com",
            &serde_json::json!({ "name": "", "password": "tehanu" }),
            Some(&token),
        )
        .await;
    assert_eq!(200, response.status().as_u16());

    let old = app
        .post_login(&serde_json::json!({ "email": "ursula@gmail.com", "password": "earthsea" }))
        .await;
    assert_eq!(400, old.status().as_u16());
    app.login("ursula@gmail.com", "tehanu").await;

    let email = UserEmail::parse("ursula@gmail.com".into()).unwrap();
    let saved = app.users.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(saved.name, "Ursula");
}

#[tokio::test]
async fn fields_outside_the_allow_list_are_rejected() {
    let app = spawn_app().await;
    let token = app.signup("Ursula", "ursula@gmail.com", "earthsea").await;

    let response = app
        .put_update_profile(
            "ursula@gmail.com",
            &serde_json::json!({ "role": "admin" }),
            Some(&token),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
    let email = UserEmail::parse("ursula@gmail.com".into()).unwrap();
    let saved = app.users.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(saved.role.as_str(), "user");
}

#[tokio::test]
async fn updating_an_unknown_email_returns_404() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let response = app
        .put_update_profile(
            "nobody@gmail.com",
            &serde_json::json!({ "name": "Ghost" }),
            Some(&token),
        )
        .await;

    assert_eq!(404, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User not found.");
}

#[tokio::test]
async fn users_cannot_update_somebody_elses_profile() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;
    let intruder = app.signup("Mallory", "mallory@gmail.com", "sneaky").await;

    let response = app
        .put_update_profile(
            "ursula@gmail.com",
            &serde_json::json!({ "name": "Pwned" }),
            Some(&intruder),
        )
        .await;

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn admins_can_update_any_profile() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;
    let token = app.admin_token().await;

    let response = app
        .put_update_profile(
            "ursula@gmail.com",
            &serde_json::json!({ "name": "Ursula K." }),
            Some(&token),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
}
