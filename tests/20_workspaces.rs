mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn slugs_are_derived_and_deduplicated() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let bob = app.user("bob@example.com").await?;

    let first = app.post("/api/workspaces", &ada, json!({ "name": "My Awesome Workspace" })).await?;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.body);
    assert_eq!(first.data()["slug"], "my-awesome-workspace");
    assert_eq!(first.data()["role"], "OWNER");

    let second = app.post("/api/workspaces", &bob, json!({ "name": "my awesome   workspace!" })).await?;
    assert_eq!(second.data()["slug"], "my-awesome-workspace-1");
    Ok(())
}

#[tokio::test]
async fn explicit_slug_conflicts_instead_of_renaming() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;

    let ok = app.post("/api/workspaces", &ada, json!({ "name": "Acme", "slug": "acme" })).await?;
    assert_eq!(ok.status, StatusCode::CREATED);

    let taken = app.post("/api/workspaces", &ada, json!({ "name": "Acme 2", "slug": "acme" })).await?;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    assert_eq!(taken.body["code"], "CONFLICT");

    let invalid = app.post("/api/workspaces", &ada, json!({ "name": "Acme", "slug": "Bad Slug" })).await?;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let unusable = app.post("/api/workspaces", &ada, json!({ "name": "!!!" })).await?;
    assert_eq!(unusable.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn new_workspace_has_owner_and_default_labels() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;

    let members = app.get(&format!("/api/workspaces/{}/members", ws), &ada).await?;
    let members = members.data().as_array().cloned().unwrap_or_default();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["role"], "OWNER");
    assert_eq!(members[0]["email"], "ada@example.com");

    let labels = app.get(&format!("/api/workspaces/{}/labels", ws), &ada).await?;
    let mut names: Vec<String> = labels
        .data()
        .as_array()
        .map(|a| a.iter().filter_map(|l| l["name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    names.sort();
    assert_eq!(names, vec!["Bug", "Documentation", "Feature", "Improvement"]);

    let dup = app.post(&format!("/api/workspaces/{}/labels", ws), &ada, json!({ "name": "bug" })).await?;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn gate_distinguishes_missing_workspace_from_non_member() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let eve = app.user("eve@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;

    let foreign = app.get(&format!("/api/workspaces/{}", ws), &eve).await?;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let missing = app.get(&format!("/api/workspaces/{}", uuid::Uuid::new_v4()), &eve).await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let malformed = app.get("/api/workspaces/not-a-uuid", &eve).await?;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_keeps_slug_and_requires_admin() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let vic = app.user("vic@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    app.join(ws, &ada, &vic, "VIEWER").await?;

    let path = format!("/api/workspaces/{}", ws);
    let denied = app.patch(&path, &vic, json!({ "name": "Hijacked" })).await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert!(denied.body["message"].as_str().unwrap_or_default().contains("OWNER, ADMIN"));

    let renamed = app
        .patch(&path, &ada, json!({ "name": "Acme Corp", "slug": "ignored" }))
        .await?;
    assert_eq!(renamed.status, StatusCode::OK, "{}", renamed.body);
    assert_eq!(renamed.data()["name"], "Acme Corp");
    assert_eq!(renamed.data()["slug"], "acme");
    Ok(())
}

#[tokio::test]
async fn listing_is_scoped_to_membership_and_super_admin() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let bob = app.user("bob@example.com").await?;
    let root = app.super_admin("root@example.com").await?;
    app.workspace(&ada, "Acme").await?;
    app.workspace(&bob, "Globex").await?;

    let mine = app.get("/api/workspaces", &ada).await?;
    let mine = mine.data().as_array().cloned().unwrap_or_default();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["slug"], "acme");

    let denied = app.get("/api/admin/workspaces", &ada).await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let all = app.get("/api/admin/workspaces", &root).await?;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.data().as_array().map(Vec::len), Some(2));

    // Super admin is not a member and gets no workspace access from the flag
    let ws = mine[0]["id"].as_str().unwrap_or_default();
    let inside = app.get(&format!("/api/workspaces/{}", ws), &root).await?;
    assert_eq!(inside.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn only_owner_deletes_and_deleted_workspace_disappears() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let adm = app.user("adm@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    app.join(ws, &ada, &adm, "ADMIN").await?;

    let path = format!("/api/workspaces/{}", ws);
    assert_eq!(app.delete(&path, &adm).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&path, &ada).await?.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&path, &ada).await?.status, StatusCode::NOT_FOUND);

    // Slug is free again once the holder is deleted
    let again = app.post("/api/workspaces", &ada, json!({ "name": "Acme" })).await?;
    assert_eq!(again.data()["slug"], "acme");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_name_workspaces_get_distinct_slugs() -> Result<()> {
    let app = std::sync::Arc::new(TestApp::new());
    let ada = app.user("ada@example.com").await?;

    let handles: Vec<_> = (0..24)
        .map(|_| {
            let app = app.clone();
            let token = ada.token.clone();
            tokio::spawn(async move {
                app.send(
                    axum::http::Method::POST,
                    "/api/workspaces",
                    Some(&token),
                    Some(json!({ "name": "Acme" })),
                )
                .await
            })
        })
        .collect();

    let mut slugs = std::collections::HashSet::new();
    let mut created = 0;
    for handle in handles {
        let reply = handle.await??;
        match reply.status {
            StatusCode::CREATED => {
                created += 1;
                let slug = reply.data()["slug"].as_str().unwrap_or_default().to_string();
                assert!(slug == "acme" || slug.starts_with("acme-"), "{}", slug);
                assert!(slugs.insert(slug.clone()), "slug {} issued twice", slug);
            }
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {}: {}", other, reply.body),
        }
    }
    assert!(created > 0);
    assert_eq!(slugs.len(), created);
    Ok(())
}
