// Live note CRUD tests - need the server binary plus a reachable PostgreSQL.
// Run with: cargo test --features live-db-tests
#![cfg(feature = "live-db-tests")]

mod common;

use anyhow::Result;
use chrono::DateTime;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn anonymous_token(base_url: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/auth/anonymous", base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    Ok(body["token"].as_str().unwrap().to_string())
}

async fn create_note(base_url: &str, token: &str, payload: Value) -> Result<reqwest::Response> {
    let client = reqwest::Client::new();
    Ok(client
        .post(format!("{}/api/notes", base_url))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?)
}

#[tokio::test]
async fn note_crud_round_trip() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = anonymous_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    // Create
    let res = create_note(
        &server.base_url,
        &token,
        json!({ "title": "Groceries", "content": "milk, eggs" }),
    )
    .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    assert_eq!(created["title"], "Groceries");
    assert_eq!(created["content"], "milk, eggs");
    let id = created["id"].as_str().unwrap().to_string();

    // Fetch by id: identical title/content/owner
    let fetched: Value = client
        .get(format!("{}/api/notes/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fetched["title"], created["title"]);
    assert_eq!(fetched["content"], created["content"]);
    assert_eq!(fetched["userId"], created["userId"]);

    // Update: new title, updatedAt advances beyond createdAt
    let res = client
        .put(format!("{}/api/notes/{}", server.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "title": "Groceries (weekend)", "content": "milk, eggs, flour" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["title"], "Groceries (weekend)");
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["userId"], created["userId"]);

    let created_at = DateTime::parse_from_rfc3339(updated["createdAt"].as_str().unwrap())?;
    let updated_at = DateTime::parse_from_rfc3339(updated["updatedAt"].as_str().unwrap())?;
    assert!(updated_at > created_at, "updatedAt must advance on update");

    // Delete: 204 with no body, then the note is gone
    let res = client
        .delete(format!("{}/api/notes/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/api/notes/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn create_validates_title_and_defaults_content() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = anonymous_token(&server.base_url).await?;

    // Blank titles fail validation
    for title in ["", "   "] {
        let res = create_note(&server.base_url, &token, json!({ "title": title })).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "title: {:?}", title);
        let body: Value = res.json().await?;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    // Omitted content is stored and returned as null
    let res = create_note(&server.base_url, &token, json!({ "title": "Untitled ideas" })).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert!(body["content"].is_null());
    Ok(())
}

#[tokio::test]
async fn notes_are_invisible_across_users() -> Result<()> {
    let server = common::ensure_server().await?;
    let owner_token = anonymous_token(&server.base_url).await?;
    let other_token = anonymous_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let res = create_note(
        &server.base_url,
        &owner_token,
        json!({ "title": "Private", "content": "secret" }),
    )
    .await?;
    let note: Value = res.json().await?;
    let id = note["id"].as_str().unwrap();

    // Foreign-owned and nonexistent ids fail identically with 404
    let res = client
        .get(format!("{}/api/notes/{}", server.base_url, id))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/api/notes/{}", server.base_url, uuid::Uuid::new_v4()))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .put(format!("{}/api/notes/{}", server.base_url, id))
        .bearer_auth(&other_token)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/api/notes/{}", server.base_url, id))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The other user's listing stays empty; the owner still sees the note
    let listing: Value = client
        .get(format!("{}/api/notes", server.base_url))
        .bearer_auth(&other_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listing.as_array().unwrap().len(), 0);

    let listing: Value = client
        .get(format!("{}/api/notes", server.base_url))
        .bearer_auth(&owner_token)
        .send()
        .await?
        .json()
        .await?;
    let titles: Vec<_> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Private"]);
    Ok(())
}

#[tokio::test]
async fn listing_is_ordered_newest_first() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = anonymous_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    for title in ["first", "second", "third"] {
        let res = create_note(&server.base_url, &token, json!({ "title": title })).await?;
        assert_eq!(res.status(), StatusCode::CREATED);
        // Keep created_at strictly increasing
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let listing: Value = client
        .get(format!("{}/api/notes", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let titles: Vec<_> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["third", "second", "first"]);

    let timestamps: Vec<_> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|n| DateTime::parse_from_rfc3339(n["createdAt"].as_str().unwrap()).unwrap())
        .collect();
    assert!(timestamps.windows(2).all(|w| w[0] > w[1]));
    Ok(())
}

#[tokio::test]
async fn notes_require_valid_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/notes", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/api/notes", server.base_url))
        .bearer_auth("bogus")
        .json(&json!({ "title": "nope" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
