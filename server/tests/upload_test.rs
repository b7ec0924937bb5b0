//! Integration tests for pack upload: catalog flow and reupload protection
//! end to end over HTTP.

use serde_json::json;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use tokio::net::TcpListener;

async fn start_test_server() -> String {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = arsound_server::db::init_db(&data_dir).expect("Failed to init DB");
    let jwt_secret = arsound_server::auth::jwt::load_or_generate_jwt_secret(&data_dir)
        .expect("Failed to generate JWT secret");

    let state = arsound_server::state::AppState {
        db,
        jwt_secret,
        data_dir,
        max_upload_size_mb: 1,
    };

    let app = arsound_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
        let _keep = tmp_dir;
    });

    format!("http://{}", addr)
}

/// Register a user and return (access_token, profile_id).
async fn register_user(base_url: &str, name: &str) -> (String, String) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({ "display_name": name }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201, "Registration failed for {}", name);
    let body: serde_json::Value = resp.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();
    let profile_id = body["profile_id"].as_str().unwrap().to_string();
    (access_token, profile_id)
}

async fn upload_pack(
    base_url: &str,
    token: &str,
    title: &str,
    data: &[u8],
) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api/packs", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .header("X-Pack-Title", title)
        .body(data.to_vec())
        .send()
        .await
        .unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_upload_and_download_roundtrip() {
    let base_url = start_test_server().await;
    let (token, profile_id) = register_user(&base_url, "Seller").await;

    let data = b"drum loops 140bpm".to_vec();
    let resp = upload_pack(&base_url, &token, "Drum Loops", &data).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    let pack_id = body["pack_id"].as_str().unwrap().to_string();
    let expected_hash = hex::encode(Sha256::digest(&data));
    assert_eq!(body["hash"].as_str().unwrap(), expected_hash);
    assert_eq!(body["reused"], json!(false));

    // Catalog lists the pack with its owner
    let client = reqwest::Client::new();
    let catalog: serde_json::Value = client
        .get(format!("{}/api/packs", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let packs = catalog["packs"].as_array().unwrap();
    assert_eq!(packs.len(), 1);
    assert_eq!(packs[0]["id"].as_str().unwrap(), pack_id);
    assert_eq!(packs[0]["owner_id"].as_str().unwrap(), profile_id);
    assert_eq!(packs[0]["owner_name"].as_str().unwrap(), "Seller");

    // Downloaded bytes match what was uploaded
    let downloaded = client
        .get(format!("{}/api/packs/{}/download", base_url, pack_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(downloaded.status(), 200);
    assert_eq!(downloaded.bytes().await.unwrap().to_vec(), data);
}

#[tokio::test]
async fn test_self_reupload_returns_existing_pack() {
    let base_url = start_test_server().await;
    let (token, _) = register_user(&base_url, "Seller").await;

    let data = b"ambient textures".to_vec();
    let first: serde_json::Value = upload_pack(&base_url, &token, "Ambient", &data)
        .await
        .json()
        .await
        .unwrap();

    let resp = upload_pack(&base_url, &token, "Ambient Again", &data).await;
    assert_eq!(resp.status(), 200, "Self re-upload is allowed");
    let second: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(second["reused"], json!(true));
    assert_eq!(second["pack_id"], first["pack_id"]);

    // Still exactly one catalog entry
    let catalog: serde_json::Value = reqwest::Client::new()
        .get(format!("{}/api/packs", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(catalog["packs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_upload_one_strike_then_block() {
    let base_url = start_test_server().await;
    let (owner_token, _) = register_user(&base_url, "Alice").await;
    let (thief_token, _) = register_user(&base_url, "Bob").await;

    let data = b"808 bass collection".to_vec();
    let resp = upload_pack(&base_url, &owner_token, "808 Bass", &data).await;
    assert_eq!(resp.status(), 201);

    // First violation: rejected with a warning, account not blocked
    let resp = upload_pack(&base_url, &thief_token, "My 808 Bass", &data).await;
    assert_eq!(resp.status(), 409, "First duplicate is a 409 warning");
    let message = resp.text().await.unwrap();
    assert!(
        message.contains("permanently block"),
        "Warning names the one-strike policy: {}",
        message
    );

    let client = reqwest::Client::new();
    let me: serde_json::Value = client
        .get(format!("{}/api/profile/me", base_url))
        .header("Authorization", format!("Bearer {}", thief_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["is_blocked"], json!(false));

    // Second violation for the same file: permanent block
    let resp = upload_pack(&base_url, &thief_token, "My 808 Bass 2", &data).await;
    assert_eq!(resp.status(), 403, "Second duplicate blocks the account");

    let me: serde_json::Value = client
        .get(format!("{}/api/profile/me", base_url))
        .header("Authorization", format!("Bearer {}", thief_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["is_blocked"], json!(true));
    assert!(me["blocked_reason"].as_str().unwrap().contains("another user"));
    assert!(me["blocked_at"].as_str().is_some());

    // Even a completely original upload is now rejected
    let resp = upload_pack(&base_url, &thief_token, "Original Work", b"my own sounds").await;
    assert_eq!(resp.status(), 403, "Blocked account cannot upload anything");

    // The stolen pack never entered the catalog twice
    let catalog: serde_json::Value = client
        .get(format!("{}/api/packs", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(catalog["packs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_requires_auth_and_title() {
    let base_url = start_test_server().await;
    let (token, _) = register_user(&base_url, "Seller").await;
    let client = reqwest::Client::new();

    // No token
    let resp = client
        .post(format!("{}/api/packs", base_url))
        .header("X-Pack-Title", "Pack")
        .body(b"bytes".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // No title
    let resp = client
        .post(format!("{}/api/packs", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .body(b"bytes".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Empty body
    let resp = client
        .post(format!("{}/api/packs", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .header("X-Pack-Title", "Pack")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_client_hash_is_verified_when_present() {
    let base_url = start_test_server().await;
    let (token, _) = register_user(&base_url, "Seller").await;
    let client = reqwest::Client::new();

    let data = b"fx risers".to_vec();
    let good_hash = hex::encode(Sha256::digest(&data));

    // Wrong hash → 400, nothing stored
    let resp = client
        .post(format!("{}/api/packs", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .header("X-Pack-Title", "FX")
        .header("X-Pack-Hash", "0".repeat(64))
        .body(data.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Malformed hash → 400
    let resp = client
        .post(format!("{}/api/packs", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .header("X-Pack-Title", "FX")
        .header("X-Pack-Hash", "nothex")
        .body(data.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Matching hash → accepted
    let resp = client
        .post(format!("{}/api/packs", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .header("X-Pack-Title", "FX")
        .header("X-Pack-Hash", good_hash)
        .body(data)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let base_url = start_test_server().await;
    let (token, _) = register_user(&base_url, "Seller").await;

    // Test server caps uploads at 1 MB
    let data = vec![0u8; 1024 * 1024 + 1];
    let resp = upload_pack(&base_url, &token, "Too Big", &data).await;
    assert_eq!(resp.status(), 413);
}

#[tokio::test]
async fn test_download_unknown_pack_is_404() {
    let base_url = start_test_server().await;
    let (token, _) = register_user(&base_url, "Seller").await;

    let resp = reqwest::Client::new()
        .get(format!("{}/api/packs/no-such-id/download", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
