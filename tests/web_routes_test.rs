mod common;

use axum::http::{StatusCode, header};

use taskboard::db::services::{TagService, TaskInput, TaskService};

#[tokio::test]
async fn anonymous_home_redirects_to_login() {
    let app = common::test_app(common::setup_db().await);

    let resp = common::get(&app, "/", None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/login?next=%2F");
}

#[tokio::test]
async fn guarded_routes_redirect_with_next() {
    let app = common::test_app(common::setup_db().await);

    let resp = common::get(&app, "/tasks/new", None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/login?next=%2Ftasks%2Fnew");

    let resp = common::post_form(&app, "/tasks/1/delete", "", None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(common::location(&resp).starts_with("/login?next="));

    let resp = common::get(&app, "/tags", Some("token=forged")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn health_check_is_public() {
    let app = common::test_app(common::setup_db().await);

    let resp = common::get(&app, "/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(common::body_text(resp).await, "OK");
}

#[tokio::test]
async fn create_task_through_form_shows_on_home() {
    let db = common::setup_db().await;
    let alice = common::create_user(&db, "alice").await;
    let tag = TagService::create_tag(&db, "shopping").await.unwrap();
    let app = common::test_app(db.clone());
    let cookie = common::auth_cookie(&alice);

    let form = format!(
        "content=Buy+milk&deadline=2030-01-02T10%3A30&tags={}",
        tag.id
    );
    let resp = common::post_form(&app, "/tasks/new", &form, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/");

    let tasks = TaskService::list_tasks(&db, alice.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].tag_ids(), vec![tag.id]);
    assert!(tasks[0].deadline.is_some());

    let resp = common::get(&app, "/", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_text(resp).await;
    assert!(body.contains("Buy milk"));
    assert!(body.contains("shopping"));
}

#[tokio::test]
async fn invalid_task_form_is_re_rendered_with_errors() {
    let db = common::setup_db().await;
    let alice = common::create_user(&db, "alice").await;
    let app = common::test_app(db.clone());
    let cookie = common::auth_cookie(&alice);

    let form = format!("content={}", "a".repeat(256));
    let resp = common::post_form(&app, "/tasks/new", &form, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_text(resp).await;
    assert!(body.contains("Ensure this value has at most 255 characters (it has 256)."));

    let resp = common::post_form(&app, "/tasks/new", "content=x&deadline=tomorrow", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(common::body_text(resp).await.contains("Enter a valid date&#x2F;time."));

    assert!(TaskService::list_tasks(&db, alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn other_users_tasks_are_not_found() {
    let db = common::setup_db().await;
    let alice = common::create_user(&db, "alice").await;
    let bob = common::create_user(&db, "bob").await;
    let task = TaskService::create_task(
        &db,
        alice.id,
        TaskInput {
            content: "Alice only".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let app = common::test_app(db.clone());
    let bob_cookie = common::auth_cookie(&bob);

    let edit = format!("/tasks/{}/edit", task.id);
    let resp = common::get(&app, &edit, Some(&bob_cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = common::post_form(&app, &edit, "content=Bob+was+here", Some(&bob_cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = common::post_form(&app, &format!("/tasks/{}/toggle", task.id), "", Some(&bob_cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = common::post_form(&app, &format!("/tasks/{}/delete", task.id), "", Some(&bob_cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let unchanged = TaskService::get_owned_task(&db, alice.id, task.id).await.unwrap();
    assert_eq!(unchanged.content, "Alice only");
    assert!(!unchanged.is_done);
}

#[tokio::test]
async fn owner_can_toggle_edit_and_delete() {
    let db = common::setup_db().await;
    let alice = common::create_user(&db, "alice").await;
    let task = TaskService::create_task(
        &db,
        alice.id,
        TaskInput {
            content: "Walk dog".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let app = common::test_app(db.clone());
    let cookie = common::auth_cookie(&alice);

    let resp = common::post_form(&app, &format!("/tasks/{}/toggle", task.id), "", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(TaskService::get_owned_task(&db, alice.id, task.id).await.unwrap().is_done);

    let resp = common::get(&app, &format!("/tasks/{}/edit", task.id), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(common::body_text(resp).await.contains("Walk dog"));

    // An unchecked box is simply absent from the form.
    let resp = common::post_form(
        &app,
        &format!("/tasks/{}/edit", task.id),
        "content=Walk+the+dog",
        Some(&cookie),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let updated = TaskService::get_owned_task(&db, alice.id, task.id).await.unwrap();
    assert_eq!(updated.content, "Walk the dog");
    assert!(!updated.is_done);

    let resp = common::post_form(&app, &format!("/tasks/{}/delete", task.id), "", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(TaskService::list_tasks(&db, alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn recent_tasks_page_is_paginated() {
    let db = common::setup_db().await;
    let alice = common::create_user(&db, "alice").await;
    for i in 0..6 {
        TaskService::create_task(
            &db,
            alice.id,
            TaskInput {
                content: format!("Item {i}"),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }
    let app = common::test_app(db);
    let cookie = common::auth_cookie(&alice);

    let resp = common::get(&app, "/tasks/recent", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_text(resp).await;
    assert!(body.contains("Item 5"));
    assert!(!body.contains("Item 0"));

    let resp = common::get(&app, "/tasks/recent?page=2", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(common::body_text(resp).await.contains("Item 0"));

    for bad in ["/tasks/recent?page=3", "/tasks/recent?page=0", "/tasks/recent?page=abc"] {
        let resp = common::get(&app, bad, Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{bad}");
    }
}

#[tokio::test]
async fn register_then_login_sets_session_cookie() {
    let db = common::setup_db().await;
    let app = common::test_app(db);

    let resp = common::get(&app, "/register", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let form = "username=judy&email=judy%40example.com&password1=long-enough-pw&password2=long-enough-pw";
    let resp = common::post_form(&app, "/register", form, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/login");
    let flash = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(flash.starts_with("flash=registered"));

    let resp = common::get(&app, "/login", Some("flash=registered")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(common::body_text(resp).await.contains("Your account has been created!"));

    let resp = common::post_form(
        &app,
        "/login",
        "username=judy&password=long-enough-pw&next=%2Ftags",
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/tags");
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));

    // The issued cookie opens the guarded pages.
    let token = set_cookie.split(';').next().unwrap_or_default();
    let resp = common::get(&app, "/tags", Some(token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_login_and_registration_re_render() {
    let db = common::setup_db().await;
    common::create_user(&db, "kate").await;
    let app = common::test_app(db);

    let resp = common::post_form(&app, "/login", "username=kate&password=nope", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        common::body_text(resp)
            .await
            .contains("Please enter a correct username and password.")
    );

    let form = "username=kate&email=kate%40example.com&password1=long-enough-pw&password2=long-enough-pw";
    let resp = common::post_form(&app, "/register", form, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        common::body_text(resp)
            .await
            .contains("A user with that username already exists.")
    );
}

#[tokio::test]
async fn login_ignores_offsite_next() {
    let db = common::setup_db().await;
    common::create_user(&db, "leo").await;
    let app = common::test_app(db);

    let form = format!(
        "username=leo&password={}&next=https%3A%2F%2Fevil.example",
        common::PASSWORD
    );
    let resp = common::post_form(&app, "/login", &form, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/");

    // A tab between the slashes would collapse to `//evil.example` in a browser.
    let form = format!(
        "username=leo&password={}&next=%2F%09%2Fevil.example",
        common::PASSWORD
    );
    let resp = common::post_form(&app, "/login", &form, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/");
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let db = common::setup_db().await;
    let mia = common::create_user(&db, "mia").await;
    let app = common::test_app(db);

    let resp = common::post_form(&app, "/logout", "", Some(&common::auth_cookie(&mia))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/login");
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn tag_pages_manage_tags() {
    let db = common::setup_db().await;
    let ned = common::create_user(&db, "ned").await;
    let app = common::test_app(db.clone());
    let cookie = common::auth_cookie(&ned);

    let resp = common::post_form(&app, "/tags/new", "name=garden", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/tags");

    let tag = TagService::list_tags(&db).await.unwrap().remove(0);
    assert_eq!(tag.name, "garden");

    let resp = common::get(&app, "/tags", Some(&cookie)).await;
    assert!(common::body_text(resp).await.contains("garden"));

    let edit = format!("/tags/{}/edit", tag.id);
    let resp = common::post_form(&app, &edit, &format!("name={}", "g".repeat(51)), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(common::body_text(resp).await.contains("at most 50 characters"));

    let resp = common::post_form(&app, &edit, "name=yard", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(TagService::get_tag(&db, tag.id).await.unwrap().name, "yard");

    let resp = common::post_form(&app, &format!("/tags/{}/delete", tag.id), "", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(TagService::list_tags(&db).await.unwrap().is_empty());

    let resp = common::get(&app, &edit, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = common::test_app(common::setup_db().await);
    let resp = common::get(&app, "/no/such/page", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
