mod common;

use anyhow::Result;
use reqwest::{header::LOCATION, StatusCode};

fn location(res: &reqwest::Response) -> &str {
    res.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn register_login_post_logout() -> Result<()> {
    let server = common::spawn_server().await?;
    let browser = common::browser();

    let res = browser
        .post(server.url("/register"))
        .form(&[
            ("username", "alice"),
            ("name", "Alice"),
            ("password", "pw1"),
            ("confirmPassword", "pw1"),
        ])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");

    let res = browser
        .post(server.url("/login"))
        .form(&[("username", "alice"), ("password", "pw1")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");

    let page = browser.get(server.url("/new")).send().await?;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await?.contains("alice"));

    let res = browser
        .post(server.url("/new"))
        .form(&[("slug", "hello"), ("title", "Hello"), ("body", "<p>hi</p>")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/hello");

    let page = browser.get(server.url("/hello")).send().await?.text().await?;
    assert!(page.contains("<p>hi</p>"));
    assert!(page.contains("Alice"));

    let res = browser.get(server.url("/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::FOUND);

    let res = browser.get(server.url("/new")).send().await?;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
    Ok(())
}

#[tokio::test]
async fn failed_login_flashes_exactly_once() -> Result<()> {
    let server = common::spawn_server().await?;
    server.create_user("alice", "Alice", "pw1").await?;
    let browser = common::browser();

    let res = browser
        .post(server.url("/login"))
        .form(&[("username", "alice"), ("password", "nope")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");

    let first = browser.get(server.url("/login")).send().await?.text().await?;
    assert!(first.contains("login failed"));

    let second = browser.get(server.url("/login")).send().await?.text().await?;
    assert!(!second.contains("login failed"));
    Ok(())
}

#[tokio::test]
async fn mismatched_passwords_refill_the_form() -> Result<()> {
    let server = common::spawn_server().await?;
    let browser = common::browser();

    let res = browser
        .post(server.url("/register"))
        .form(&[
            ("username", "bob"),
            ("name", "Bob"),
            ("password", "a"),
            ("confirmPassword", "b"),
        ])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/register");

    let page = browser.get(server.url("/register")).send().await?.text().await?;
    assert!(page.contains("passwords don"));
    assert!(page.contains("t match"));
    assert!(page.contains("value=\"bob\""));

    assert!(server.state.credentials.find_by_username("bob").await.is_err());
    Ok(())
}

#[tokio::test]
async fn registration_does_not_take_over_accounts() -> Result<()> {
    let server = common::spawn_server().await?;
    server.create_user("alice", "Alice", "pw1").await?;
    let browser = common::browser();

    let res = browser
        .post(server.url("/register"))
        .form(&[
            ("username", "alice"),
            ("name", "Mallory"),
            ("password", "evil"),
            ("confirmPassword", "evil"),
        ])
        .send()
        .await?;
    assert_eq!(location(&res), "/register");

    let alice = server.state.credentials.find_by_username("alice").await?;
    assert_eq!(alice.display_name, "Alice");
    assert!(server.state.credentials.verify_password(&alice, "pw1"));
    Ok(())
}

#[tokio::test]
async fn deleted_user_session_is_turned_away() -> Result<()> {
    let server = common::spawn_server().await?;
    server.create_user("alice", "Alice", "pw1").await?;
    let browser = common::browser();

    browser
        .post(server.url("/login"))
        .form(&[("username", "alice"), ("password", "pw1")])
        .send()
        .await?;
    assert_eq!(browser.get(server.url("/new")).send().await?.status(), StatusCode::OK);

    server.state.credentials.remove("alice").await?;

    let res = browser.get(server.url("/new")).send().await?;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
    Ok(())
}

#[tokio::test]
async fn forged_cookie_is_ignored() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?
        .get(server.url("/new"))
        .header("cookie", "blog=eyJhY3RpdmVfdXNlciI6ImFsaWNlIn0")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
    Ok(())
}

#[tokio::test]
async fn racing_registrations_create_one_account() -> Result<()> {
    let server = common::spawn_server().await?;
    let (first, second) = (common::browser(), common::browser());

    let register = |browser: &reqwest::Client, name: &'static str, password: &'static str| {
        browser
            .post(server.url("/register"))
            .form(&[
                ("username", "alice"),
                ("name", name),
                ("password", password),
                ("confirmPassword", password),
            ])
            .send()
    };

    let (a, b) = tokio::join!(register(&first, "Alice", "pw1"), register(&second, "Mallory", "evil"));
    let (a, b) = (a?, b?);

    let winners: Vec<&str> = [(&a, "Alice"), (&b, "Mallory")]
        .into_iter()
        .filter(|(res, _)| location(res) == "/")
        .map(|(_, name)| name)
        .collect();
    assert_eq!(winners.len(), 1, "{} / {}", location(&a), location(&b));

    let stored = server.state.credentials.find_by_username("alice").await?;
    assert_eq!(stored.display_name, winners[0]);
    let password = if winners[0] == "Alice" { "pw1" } else { "evil" };
    assert!(server.state.credentials.verify_password(&stored, password));
    Ok(())
}
