use applier_console::build_rocket;
use applier_console::core::schema::default_config;
use applier_console::core::{ConfigManager, Database, SharedRemoteStore};
use jsonwebtoken::{encode, EncodingKey, Header as JwtHeader};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

const SECRET: &str = "integration-secret";

fn manager(dir: &Path, extra: &[(&str, &str)]) -> ConfigManager {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert(
        "CONFIG_JSON_PATH".to_string(),
        dir.join("config.json").display().to_string(),
    );
    vars.insert("SUPABASE_JWT_SECRET".to_string(), SECRET.to_string());
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    ConfigManager::from_lookup(dir, move |key| vars.get(key).cloned()).unwrap()
}

async fn client(dir: &Path, extra: &[(&str, &str)], remote: Option<SharedRemoteStore>) -> Client {
    Client::tracked(build_rocket(&manager(dir, extra), remote))
        .await
        .unwrap()
}

fn bearer(user_id: &str) -> Header<'static> {
    let exp = chrono::Utc::now().timestamp() + 3600;
    let token = encode(
        &JwtHeader::default(),
        &json!({ "sub": user_id, "exp": exp, "role": "authenticated" }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    Header::new("Authorization", format!("Bearer {}", token))
}

fn defaults() -> Value {
    serde_json::to_value(default_config()).unwrap()
}

#[rocket::async_test]
async fn anonymous_config_defaults_without_file_or_reference() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(dir.path(), &[], None).await;

    let response = client.get("/api/config").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_json::<Value>().await.unwrap(), defaults());
}

#[rocket::async_test]
async fn partial_update_merges_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(dir.path(), &[], None).await;

    let response = client
        .put("/api/config")
        .header(ContentType::JSON)
        .body(r#"{"search": {"switch_number": 50}, "bogus": {"x": 1}}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let merged = response.into_json::<Value>().await.unwrap();

    let mut expected = defaults();
    expected["search"]["switch_number"] = json!(50);
    assert_eq!(merged, expected);

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("config.json")).unwrap())
            .unwrap();
    assert_eq!(stored, expected);

    let second = client
        .post("/api/config")
        .body(r#"{"personals": {"first_name": "Ada"}}"#)
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(second["search"]["switch_number"], json!(50));
    assert_eq!(second["personals"]["first_name"], json!("Ada"));
}

#[rocket::async_test]
async fn empty_or_invalid_body_is_an_empty_update() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(dir.path(), &[], None).await;

    for body in ["", "not json"] {
        let response = client.put("/api/config").body(body).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_json::<Value>().await.unwrap(), defaults());
    }
}

#[rocket::async_test]
async fn signed_in_users_are_isolated_from_anonymous_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("store.db")).await.unwrap();
    let client = client(dir.path(), &[], Some(Arc::new(db))).await;

    let response = client
        .put("/api/config")
        .header(bearer("user-1"))
        .body(r#"{"search": {"switch_number": 7}}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let user = client
        .get("/api/config")
        .header(bearer("user-1"))
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(user["search"]["switch_number"], json!(7));

    let anonymous = client
        .get("/api/config")
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(anonymous, defaults());
    assert!(!dir.path().join("config.json").exists());
}

#[rocket::async_test]
async fn invalid_token_is_treated_as_anonymous() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(dir.path(), &[], None).await;

    let response = client
        .get("/api/config")
        .header(Header::new("Authorization", "Bearer not-a-token"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .post("/api/applied-jobs/sync")
        .header(Header::new("Authorization", "Bearer not-a-token"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn sync_requires_identity_then_remote_store() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(dir.path(), &[], None).await;

    let response = client.post("/api/applied-jobs/sync").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert!(response.into_json::<Value>().await.unwrap()["error"].is_string());

    let response = client
        .post("/api/applied-jobs/sync")
        .header(bearer("user-1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::ServiceUnavailable);
}

#[rocket::async_test]
async fn sync_then_list_for_signed_in_user() {
    let dir = tempfile::tempdir().unwrap();
    let csv_dir = dir.path().join("reference").join("all excels");
    std::fs::create_dir_all(&csv_dir).unwrap();
    std::fs::write(
        csv_dir.join("all_applied_applications_history.csv"),
        "Job ID,Title,Company,HR Name,HR Link,Job Link,External Job link,Date Applied\n\
         1,Engineer,Acme,,,,,2024-01-01\n",
    )
    .unwrap();
    let db = Database::new(&dir.path().join("store.db")).await.unwrap();
    let client = client(dir.path(), &[], Some(Arc::new(db))).await;

    let anonymous = client
        .get("/api/applied-jobs")
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(anonymous[0]["Job_ID"], json!("1"));
    assert_eq!(anonymous[0]["HR_Name"], json!(""));

    for _ in 0..2 {
        let synced = client
            .post("/api/applied-jobs/sync")
            .header(bearer("user-1"))
            .dispatch()
            .await
            .into_json::<Value>()
            .await
            .unwrap();
        assert_eq!(synced, json!({ "synced": 1 }));
    }

    let listed = client
        .get("/api/applied-jobs")
        .header(bearer("user-1"))
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["Company"], json!("Acme"));
}

#[rocket::async_test]
async fn pipeline_idle_status_and_stop() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(dir.path(), &[], None).await;

    let status = client
        .get("/api/pipeline/status")
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(status, json!({ "running": false }));

    let stop = client
        .post("/api/pipeline/stop")
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(
        stop,
        json!({ "running": false, "message": "No pipeline was running" })
    );
}

#[rocket::async_test]
async fn start_without_entry_script_materializes_then_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("reference")).unwrap();
    let client = client(dir.path(), &[], None).await;

    let response = client
        .post("/api/pipeline/start")
        .body(r#"{"config": {"search": {"switch_number": 3}}}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::InternalServerError);

    let search =
        std::fs::read_to_string(dir.path().join("reference").join("config").join("search.py"))
            .unwrap();
    assert!(search.contains("switch_number = 3"));
}

#[rocket::async_test]
async fn restricted_mode_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(dir.path(), &[("RESTRICTED_MODE", "1")], None).await;

    let response = client.post("/api/pipeline/start").dispatch().await;
    assert_eq!(response.status(), Status::ServiceUnavailable);
    assert_eq!(
        response.into_json::<Value>().await.unwrap()["restricted"],
        json!(true)
    );

    let status = client
        .get("/api/pipeline/status")
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(status, json!({ "running": false, "restricted": true }));
    assert!(!dir.path().join("reference").join("config").exists());
}

#[rocket::async_test]
async fn auth_env_exposes_public_values_only() {
    let dir = tempfile::tempdir().unwrap();

    let client = client(
        dir.path(),
        &[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ],
        None,
    )
    .await;
    let env = client
        .get("/api/auth/env")
        .dispatch()
        .await
        .into_json::<Value>()
        .await
        .unwrap();
    assert_eq!(
        env,
        json!({ "SUPABASE_URL": "https://abc.supabase.co", "SUPABASE_ANON_KEY": "anon" })
    );
}

#[rocket::async_test]
async fn cors_preflight_and_index() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(dir.path(), &[], None).await;

    let response = client.options("/api/config").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);

    std::fs::create_dir_all(dir.path().join("static")).unwrap();
    std::fs::write(dir.path().join("static").join("index.html"), "<h1>console</h1>").unwrap();
    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().await.unwrap(), "<h1>console</h1>");
}
