mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn project_keys_are_derived_and_never_reused() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;

    let mad = app.project(ws, &ada, "Mobile App Development").await?;
    assert_eq!(mad.status, StatusCode::CREATED, "{}", mad.body);
    assert_eq!(mad.data()["key"], "MAD");

    let mob = app.project(ws, &ada, "Mobile").await?;
    assert_eq!(mob.data()["key"], "MOB");
    let mob_id = mob.id()?;

    let mob1 = app.project(ws, &ada, "mobile").await?;
    assert_eq!(mob1.data()["key"], "MOB1");

    // Deleting MOB does not free its key
    let path = format!("/api/workspaces/{}/projects/{}", ws, mob_id);
    assert_eq!(app.delete(&path, &ada).await?.status, StatusCode::NO_CONTENT);
    let mob2 = app.project(ws, &ada, "Mobile").await?;
    assert_eq!(mob2.data()["key"], "MOB2");

    let fallback = app.project(ws, &ada, "%%%").await?;
    assert_eq!(fallback.data()["key"], "PRJ");

    // Keys are per workspace
    let other = app.workspace(&ada, "Globex").await?;
    let fresh = app.project(other, &ada, "Mobile").await?;
    assert_eq!(fresh.data()["key"], "MOB");
    Ok(())
}

#[tokio::test]
async fn explicit_key_conflicts_and_dates_are_checked() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    let path = format!("/api/workspaces/{}/projects", ws);

    let web = app.post(&path, &ada, json!({ "name": "Website", "key": "web" })).await?;
    assert_eq!(web.data()["key"], "WEB");
    let clash = app.post(&path, &ada, json!({ "name": "Web 2", "key": "WEB" })).await?;
    assert_eq!(clash.status, StatusCode::CONFLICT);

    let backwards = app
        .post(
            &path,
            &ada,
            json!({ "name": "Q3", "start_date": "2024-09-30", "end_date": "2024-07-01" }),
        )
        .await?;
    assert_eq!(backwards.status, StatusCode::BAD_REQUEST);

    let update = app
        .patch(
            &format!("{}/{}", path, web.id()?),
            &ada,
            json!({ "status": "ON_HOLD", "start_date": "2024-01-01", "end_date": "2024-03-31" }),
        )
        .await?;
    assert_eq!(update.status, StatusCode::OK, "{}", update.body);
    assert_eq!(update.data()["status"], "ON_HOLD");
    assert_eq!(update.data()["key"], "WEB");
    Ok(())
}

#[tokio::test]
async fn member_project_creation_follows_workspace_setting() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let mem = app.user("mem@example.com").await?;
    let vic = app.user("vic@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    app.join(ws, &ada, &mem, "MEMBER").await?;
    app.join(ws, &ada, &vic, "VIEWER").await?;

    assert_eq!(app.project(ws, &mem, "Allowed").await?.status, StatusCode::CREATED);
    assert_eq!(app.project(ws, &vic, "Viewer").await?.status, StatusCode::FORBIDDEN);

    let closed = app
        .patch(
            &format!("/api/workspaces/{}", ws),
            &ada,
            json!({ "settings": { "allow_member_project_creation": false } }),
        )
        .await?;
    assert_eq!(closed.status, StatusCode::OK, "{}", closed.body);
    assert_eq!(app.project(ws, &mem, "Blocked").await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.project(ws, &ada, "Owner").await?.status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn tickets_are_numbered_per_project() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let vic = app.user("vic@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    app.join(ws, &ada, &vic, "VIEWER").await?;

    let mob = app.project(ws, &ada, "Mobile").await?.id()?;
    let web = app.project(ws, &ada, "Web").await?.id()?;
    let tasks = |p: uuid::Uuid| format!("/api/workspaces/{}/projects/{}/tasks", ws, p);

    let mut ids = vec![];
    for title in ["Login", "Logout", "Signup"] {
        let reply = app.post(&tasks(mob), &ada, json!({ "title": title })).await?;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        ids.push(reply.data()["ticket_id"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(ids, vec!["MOB-1", "MOB-2", "MOB-3"]);

    let first_web = app.post(&tasks(web), &ada, json!({ "title": "Landing" })).await?;
    assert_eq!(first_web.data()["ticket_id"], "WEB-1");
    assert_eq!(first_web.data()["status"], "TODO");
    assert_eq!(first_web.data()["priority"], "MEDIUM");

    let viewer = app.post(&tasks(mob), &vic, json!({ "title": "Nope" })).await?;
    assert_eq!(viewer.status, StatusCode::FORBIDDEN);

    let listed = app.get(&tasks(mob), &vic).await?;
    assert_eq!(listed.data().as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn assignees_must_be_members() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let mem = app.user("mem@example.com").await?;
    let eve = app.user("eve@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    app.join(ws, &ada, &mem, "MEMBER").await?;
    let project = app.project(ws, &ada, "Mobile").await?.id()?;
    let tasks = format!("/api/workspaces/{}/projects/{}/tasks", ws, project);

    let outsider = app
        .post(&tasks, &ada, json!({ "title": "Fix", "assignee_ids": [eve.id()] }))
        .await?;
    assert_eq!(outsider.status, StatusCode::BAD_REQUEST);

    let created = app
        .post(&tasks, &ada, json!({ "title": "Fix", "assignee_ids": [mem.id(), mem.id()], "priority": "URGENT" }))
        .await?;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.data()["assignee_ids"].as_array().map(Vec::len), Some(1));

    let moved = app
        .patch(
            &format!("{}/{}", tasks, created.id()?),
            &mem,
            json!({ "status": "IN_PROGRESS", "title": "Fix crash" }),
        )
        .await?;
    assert_eq!(moved.status, StatusCode::OK, "{}", moved.body);
    assert_eq!(moved.data()["status"], "IN_PROGRESS");
    assert_eq!(moved.data()["ticket_id"], "MOB-1");
    Ok(())
}

#[tokio::test]
async fn comments_are_edited_by_author_and_deleted_by_admins() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let mem = app.user("mem@example.com").await?;
    let mem2 = app.user("mem2@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    app.join(ws, &ada, &mem, "MEMBER").await?;
    app.join(ws, &ada, &mem2, "MEMBER").await?;
    let project = app.project(ws, &ada, "Mobile").await?.id()?;
    let task = app
        .post(&format!("/api/workspaces/{}/projects/{}/tasks", ws, project), &mem, json!({ "title": "Bug" }))
        .await?
        .id()?;
    let comments = format!("/api/workspaces/{}/projects/{}/tasks/{}/comments", ws, project, task);

    let comment = app.post(&comments, &mem, json!({ "body": "Repro steps" })).await?;
    assert_eq!(comment.status, StatusCode::CREATED, "{}", comment.body);
    let path = format!("{}/{}", comments, comment.id()?);

    assert_eq!(app.patch(&path, &ada, json!({ "body": "edited" })).await?.status, StatusCode::FORBIDDEN);
    let edited = app.patch(&path, &mem, json!({ "body": "Better repro" })).await?;
    assert_eq!(edited.data()["body"], "Better repro");

    assert_eq!(app.delete(&path, &mem2).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&path, &ada).await?.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&comments, &mem).await?.data().as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn attachments_reference_typed_targets() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;
    let mem = app.user("mem@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    app.join(ws, &ada, &mem, "MEMBER").await?;
    let project = app.project(ws, &ada, "Mobile").await?.id()?;
    let task = app
        .post(&format!("/api/workspaces/{}/projects/{}/tasks", ws, project), &ada, json!({ "title": "Bug" }))
        .await?
        .id()?;
    let attachments = format!("/api/workspaces/{}/attachments", ws);

    let upload = app
        .post(
            &attachments,
            &mem,
            json!({
                "target": { "type": "TASK", "id": task },
                "file_name": "crash.png",
                "mime_type": "image/png",
                "size_bytes": 2048,
                "url": "https://files.example.com/crash.png"
            }),
        )
        .await?;
    assert_eq!(upload.status, StatusCode::CREATED, "{}", upload.body);
    assert_eq!(upload.data()["project_id"], project.to_string());

    let missing = app
        .post(
            &attachments,
            &mem,
            json!({
                "target": { "type": "COMMENT", "id": uuid::Uuid::new_v4() },
                "file_name": "x", "mime_type": "text/plain", "size_bytes": 1, "url": "https://x"
            }),
        )
        .await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let listed = app
        .get(&format!("{}?target_type=task&target_id={}", attachments, task), &ada)
        .await?;
    assert_eq!(listed.data().as_array().map(Vec::len), Some(1));

    let bad = app.get(&format!("{}?target_type=folder&target_id={}", attachments, task), &ada).await?;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let path = format!("{}/{}", attachments, upload.id()?);
    assert_eq!(app.delete(&path, &ada).await?.status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_name_projects_get_distinct_keys() -> Result<()> {
    let app = std::sync::Arc::new(TestApp::new());
    let ada = app.user("ada@example.com").await?;
    let ws = app.workspace(&ada, "Acme").await?;
    let path = format!("/api/workspaces/{}/projects", ws);

    let handles: Vec<_> = (0..24)
        .map(|_| {
            let app = app.clone();
            let token = ada.token.clone();
            let path = path.clone();
            tokio::spawn(async move {
                app.send(
                    axum::http::Method::POST,
                    &path,
                    Some(&token),
                    Some(json!({ "name": "Mobile" })),
                )
                .await
            })
        })
        .collect();

    let mut keys = std::collections::HashSet::new();
    let mut created = 0;
    for handle in handles {
        let reply = handle.await??;
        match reply.status {
            StatusCode::CREATED => {
                created += 1;
                let key = reply.data()["key"].as_str().unwrap_or_default().to_string();
                assert!(key.starts_with("MOB"), "{}", key);
                assert!(keys.insert(key.clone()), "key {} issued twice", key);
            }
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {}: {}", other, reply.body),
        }
    }
    assert!(created > 0);
    assert_eq!(keys.len(), created);

    let listed = app.get(&path, &ada).await?;
    assert_eq!(listed.data().as_array().map(Vec::len), Some(created));
    Ok(())
}
