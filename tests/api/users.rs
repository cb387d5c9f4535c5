use crate::helpers::{spawn_app, ADMIN_EMAIL};

#[tokio::test]
async fn the_user_list_requires_authentication() {
    let app = spawn_app().await;

    let response = app.get_users(None).await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn regular_users_cannot_reach_admin_routes() {
    let app = spawn_app().await;
    let token = app.signup("Ursula", "ursula@gmail.com", "earthsea").await;
    let id = app.user_id("ursula@gmail.com").await;

    assert_eq!(403, app.get_users(Some(&token)).await.status().as_u16());
    assert_eq!(403, app.get_user(&id, Some(&token)).await.status().as_u16());
    assert_eq!(403, app.delete_user(&id, Some(&token)).await.status().as_u16());
    assert_eq!(
        403,
        app.put_user(&id, &serde_json::json!({ "name": "x" }), Some(&token))
            .await
            .status()
            .as_u16()
    );
    assert_eq!(403, app.get_feedback(Some(&token)).await.status().as_u16());
}

#[tokio::test]
async fn admins_see_every_user_without_password_hashes() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;
    app.signup("Octavia", "octavia@gmail.com", "kindred").await;
    let token = app.admin_token().await;

    let response = app.get_users(Some(&token)).await;

    assert_eq!(200, response.status().as_u16());
    let users: Vec<serde_json::Value> = response.json().await.unwrap();
    let emails: Vec<_> = users.iter().map(|u| u["email"].as_str().unwrap()).collect();
    assert_eq!(emails, vec![ADMIN_EMAIL, "ursula@gmail.com", "octavia@gmail.com"]);
    for user in &users {
        assert!(user.get("passwordHash").is_none());
        assert!(user.get("password").is_none());
    }
}

#[tokio::test]
async fn admins_can_fetch_a_single_user() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;
    let id = app.user_id("ursula@gmail.com").await;
    let token = app.admin_token().await;

    let response = app.get_user(&id, Some(&token)).await;

    assert_eq!(200, response.status().as_u16());
    let user: serde_json::Value = response.json().await.unwrap();
    assert_eq!(user["name"], "Ursula");
}

#[tokio::test]
async fn a_malformed_id_returns_400() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let response = app.get_user("not-a-uuid", Some(&token)).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn deleting_a_user_removes_it() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;
    let id = app.user_id("ursula@gmail.com").await;
    let token = app.admin_token().await;

    let response = app.delete_user(&id, Some(&token)).await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User deleted successfully.");
    assert_eq!(404, app.get_user(&id, Some(&token)).await.status().as_u16());
    assert_eq!(404, app.delete_user(&id, Some(&token)).await.status().as_u16());
}

#[tokio::test]
async fn admins_can_update_a_user_by_id() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;
    let id = app.user_id("ursula@gmail.com").await;
    let token = app.admin_token().await;

    let response = app
        .put_user(
            &id,
            &serde_json::json!({ "name": "Ursula K.", "password": "tehanu" }),
            Some(&token),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let user: serde_json::Value = response.json().await.unwrap();
    assert_eq!(user["name"], "Ursula K.");
    app.login("ursula@gmail.com", "tehanu").await;
}

#[tokio::test]
async fn an_admin_update_cannot_touch_the_email() {
    let app = spawn_app().await;
    app.signup("Ursula", "ursula@gmail.com", "earthsea").await;
    let id = app.user_id("ursula@gmail.com").await;
    let token = app.admin_token().await;

    let response = app
        .put_user(
            &id,
            &serde_json::json!({ "email": "other@gmail.com" }),
            Some(&token),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
}
