//! End-to-end chat flow: models, chats, and messages over HTTP.

mod common;

use anyhow::Result;
use serde_json::{Value, json};

use common::BOB_SESSION;

#[tokio::test]
async fn test_conversation_flow() -> Result<()> {
    let server = common::TestServer::start().await?;
    let model_id = server.create_model("gpt-4o").await?;
    let chat_id = server.create_chat(common::ALICE_SESSION, "Trip planning").await?;

    for (kind, content) in [("user", "Where should I go?"), ("ai", "Lisbon.")] {
        let resp = server
            .post("/messages")
            .json(&json!({
                "chat_id": chat_id,
                "model_id": model_id,
                "type": kind,
                "content": content,
            }))
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 201);
    }

    let messages: Vec<Value> = server
        .get(&format!("/messages/chat/{chat_id}"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "Where should I go?");
    assert_eq!(messages[0]["model"]["name"], "gpt-4o");

    let latest: Value = server
        .get(&format!("/messages/chat/{chat_id}/latest"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(latest["type"], "ai");

    let ai_only: Vec<Value> = server
        .get(&format!("/messages/chat/{chat_id}/type/ai"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(ai_only.len(), 1);

    let message_id = common::id_of(latest)?;
    let rated: Value = server
        .patch_as(common::ALICE_SESSION, &format!("/messages/{message_id}/feedback"))
        .json(&json!({ "feedback": "positive" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(rated["feedback"], "positive");

    let with_feedback: Vec<Value> = server
        .get(&format!("/messages/chat/{chat_id}/feedback"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(with_feedback.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_message_with_auto_chat() -> Result<()> {
    let server = common::TestServer::start().await?;
    let model_id = server.create_model("claude").await?;
    let content = "a".repeat(80);

    let resp = server
        .post("/messages/with-chat")
        .json(&json!({ "model_id": model_id, "content": content }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 201);
    let created: Value = resp.json().await?;
    let chat_id = created["chat_id"].as_str().unwrap_or_default().to_string();

    let chat: Value = server.get(&format!("/chats/{chat_id}")).send().await?.json().await?;
    assert_eq!(chat["title"], format!("{}...", "a".repeat(50)));

    Ok(())
}

#[tokio::test]
async fn test_disabled_model_rejects_messages() -> Result<()> {
    let server = common::TestServer::start().await?;
    let model_id = server.create_model("legacy").await?;
    let chat_id = server.create_chat(common::ALICE_SESSION, "Old").await?;

    let resp = server
        .patch_as(common::ALICE_SESSION, &format!("/models/{model_id}/disable"))
        .send()
        .await?;
    assert!(resp.status().is_success());

    let resp = server
        .post("/messages")
        .json(&json!({
            "chat_id": chat_id,
            "model_id": model_id,
            "type": "user",
            "content": "hello",
        }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    // A referenced-by-nothing model can still be deleted.
    let resp = server.delete(&format!("/models/{model_id}")).send().await?;
    assert_eq!(resp.status().as_u16(), 200);

    Ok(())
}

#[tokio::test]
async fn test_other_users_cannot_touch_messages() -> Result<()> {
    let server = common::TestServer::start().await?;
    let model_id = server.create_model("shared").await?;
    let chat_id = server.create_chat(common::ALICE_SESSION, "Private").await?;

    let created: Value = server
        .post("/messages")
        .json(&json!({
            "chat_id": chat_id,
            "model_id": model_id,
            "type": "user",
            "content": "secret",
        }))
        .send()
        .await?
        .json()
        .await?;
    let message_id = common::id_of(created)?;

    let resp = server
        .get_as(BOB_SESSION, &format!("/messages/{message_id}"))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);

    let resp = server
        .delete_as(BOB_SESSION, &format!("/messages/{message_id}"))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);

    let resp = server
        .put_as(BOB_SESSION, &format!("/messages/{message_id}"))
        .json(&json!({ "content": "hijacked" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);

    let exists: Value = server
        .get(&format!("/messages/{message_id}/exists"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(exists["exists"], true);

    Ok(())
}

#[tokio::test]
async fn test_bulk_chat_operations() -> Result<()> {
    let server = common::TestServer::start().await?;
    let a = server.create_chat(common::ALICE_SESSION, "a").await?;
    let b = server.create_chat(common::ALICE_SESSION, "b").await?;
    let theirs = server.create_chat(BOB_SESSION, "c").await?;

    let result: Value = server
        .post("/chats/bulk/delete")
        .json(&json!({ "ids": [a, b, theirs] }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(result, json!({ "success_count": 2, "failed_count": 1 }));

    let deleted: Vec<Value> = server.get("/chats/deleted").send().await?.json().await?;
    assert_eq!(deleted.len(), 2);

    let result: Value = server
        .post("/chats/bulk/restore")
        .json(&json!({ "chat_ids": [a] }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(result["success_count"], 1);

    let result: Value = server
        .post("/chats/bulk/delete/permanent")
        .json(&json!({ "ids": [a, b] }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(result["success_count"], 2);

    let count: Value = server.get("/chats/count").send().await?.json().await?;
    assert_eq!(count["total"], 0);

    Ok(())
}

#[tokio::test]
async fn test_delete_all_messages_in_chat() -> Result<()> {
    let server = common::TestServer::start().await?;
    let model_id = server.create_model("m").await?;
    let chat_id = server.create_chat(common::ALICE_SESSION, "Chat").await?;

    for content in ["one", "two", "three"] {
        server
            .post("/messages")
            .json(&json!({
                "chat_id": chat_id,
                "model_id": model_id,
                "type": "user",
                "content": content,
            }))
            .send()
            .await?;
    }

    let result: Value = server
        .delete(&format!("/messages/chat/{chat_id}/all"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(result["deleted_count"], 3);

    let count: Value = server
        .get(&format!("/messages/chat/{chat_id}/count"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(count["count"], 0);

    let count: Value = server
        .get(&format!("/messages/chat/{chat_id}/count?include_deleted=true"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(count["count"], 3);

    Ok(())
}
