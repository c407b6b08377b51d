pub mod health;
pub mod resume;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Document and session state
        .route(
            "/api/v1/resumes/:user_id",
            get(resume::handle_get_resume).delete(resume::handle_reset_resume),
        )
        .route(
            "/api/v1/resumes/:user_id/commands",
            post(resume::handle_command),
        )
        .route(
            "/api/v1/resumes/:user_id/sections/:section/open",
            post(resume::handle_open_section),
        )
        .route(
            "/api/v1/resumes/:user_id/sections/:section/close",
            post(resume::handle_close_section),
        )
        .route("/api/v1/resumes/:user_id/scope", put(resume::handle_set_scope))
        .route(
            "/api/v1/resumes/:user_id/navigation",
            put(resume::handle_set_navigation),
        )
        // Drag and drop
        .route(
            "/api/v1/resumes/:user_id/drag/start",
            post(resume::handle_drag_start),
        )
        .route(
            "/api/v1/resumes/:user_id/drag/hover",
            post(resume::handle_drag_hover),
        )
        .route(
            "/api/v1/resumes/:user_id/drag/drop",
            post(resume::handle_drag_drop),
        )
        .route(
            "/api/v1/resumes/:user_id/drag/cancel",
            post(resume::handle_drag_cancel),
        )
        // Crafting and generation
        .route("/api/v1/resumes/:user_id/ingest", post(resume::handle_ingest))
        .route("/api/v1/resumes/:user_id/craft", post(resume::handle_craft))
        .route(
            "/api/v1/resumes/:user_id/document",
            post(resume::handle_generate_document),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::resume::snapshot::Snapshot;
    use crate::state::SessionRegistry;
    use crate::store::{MemorySnapshotStore, SnapshotStore, StoreError};
    use crate::upstream::{CraftClient, DocumentClient};

    /// Loads normally but refuses every write.
    struct ReadOnlyStore(MemorySnapshotStore);

    #[async_trait]
    impl SnapshotStore for ReadOnlyStore {
        async fn load(&self, user_id: Uuid) -> Result<Option<Snapshot>, StoreError> {
            self.0.load(user_id).await
        }

        async fn save(&self, _user_id: Uuid, _snapshot: &Snapshot) -> Result<(), StoreError> {
            Err(StoreError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "write refused",
            ))))
        }

        async fn delete(&self, user_id: Uuid) -> Result<(), StoreError> {
            self.0.delete(user_id).await
        }
    }

    fn test_state(store: Arc<dyn SnapshotStore>) -> AppState {
        let config = Config::from_lookup(|key| match key {
            "CRAFT_SERVICE_URL" => Some("http://127.0.0.1:9".to_string()),
            "DOCUMENT_SERVICE_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
        .unwrap();
        AppState {
            sessions: SessionRegistry::new(store, config.drag_throttle, config.session_idle),
            craft: CraftClient::new(&config.craft_service_url).unwrap(),
            documents: DocumentClient::new(&config.document_service_url).unwrap(),
            archive: None,
            config,
        }
    }

    fn memory_app() -> Router {
        build_router(test_state(Arc::new(MemorySnapshotStore::new())))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = memory_app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_command_is_persisted() {
        let store = Arc::new(MemorySnapshotStore::new());
        let app = build_router(test_state(store.clone()));
        let user = Uuid::new_v4();
        let uri = format!("/api/v1/resumes/{user}/commands");

        let (status, body) =
            send(&app, Method::POST, &uri, Some(json!({"op": "add_skill"}))).await;
        assert_eq!(status, StatusCode::OK);
        let skill_id = body["created_id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({"op": "update_skill", "skill_id": skill_id, "topic": "Languages"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let snapshot = store.load(user).await.unwrap().unwrap();
        assert_eq!(snapshot.saved_skills[0].topic, "Languages");
    }

    #[tokio::test]
    async fn test_unknown_entity_is_404_with_error_body() {
        let app = memory_app();
        let uri = format!("/api/v1/resumes/{}/commands", Uuid::new_v4());
        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({"op": "delete_skill", "skill_id": Uuid::new_v4()})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_ingest_and_scope_routing() {
        let app = memory_app();
        let user = Uuid::new_v4();
        let base = format!("/api/v1/resumes/{user}");

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("{base}/scope"),
            Some(json!({"establishedExpertise": false, "expandingKnowledgeBase": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{base}/ingest"),
            Some(json!({
                "payload": {
                    "full_name": "Ada",
                    "professional_history": [{"company_name": "Acme", "job_title": "Engineer"}],
                    "professional_projects": [
                        {"work_experience": "Acme - Engineer", "project_name": "Billing"}
                    ],
                    "personal_projects": [{"project_name": "Side"}]
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["activeProjects"][0]["name"], "Side");
        assert_eq!(body["projectStore"][0]["scope"], "expanding");
        let content = &body["savedProfessionalExperiences"][0]["jobTitles"][0]["content"];
        assert_eq!(content[0], json!({"type": "project_header", "name": "Billing"}));
        assert_eq!(body["navigation"]["hasCrafted"], true);
    }

    #[tokio::test]
    async fn test_failed_ingest_leaves_state_untouched() {
        let app = memory_app();
        let base = format!("/api/v1/resumes/{}", Uuid::new_v4());
        send(
            &app,
            Method::POST,
            &format!("{base}/commands"),
            Some(json!({"op": "set_name", "name": "Before"})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{base}/ingest"),
            Some(json!({"payload": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INGEST_FAILED");

        let (_, body) = send(&app, Method::GET, &base, None).await;
        assert_eq!(body["name"], "Before");
    }

    #[tokio::test]
    async fn test_failed_store_write_leaves_session_untouched() {
        let user = Uuid::new_v4();
        let inner = MemorySnapshotStore::new();
        inner.put_raw(user, r#"{"name": "Before"}"#).await;
        let app = build_router(test_state(Arc::new(ReadOnlyStore(inner))));
        let base = format!("/api/v1/resumes/{user}");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{base}/ingest"),
            Some(json!({"payload": {"full_name": "Crafted"}})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "STORE_ERROR");

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("{base}/commands"),
            Some(json!({"op": "add_skill"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) =
            send(&app, Method::POST, &format!("{base}/sections/skills/open"), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (_, body) = send(&app, Method::GET, &base, None).await;
        assert_eq!(body["name"], "Before");
        assert_eq!(body["savedSkills"], json!([]));
        assert_eq!(body["openSections"], json!([]));
        assert_eq!(body["navigation"]["hasCrafted"], false);
    }

    #[tokio::test]
    async fn test_drag_and_drop_reorders_skills() {
        let app = memory_app();
        let base = format!("/api/v1/resumes/{}", Uuid::new_v4());
        let commands = format!("{base}/commands");
        let mut ids = Vec::new();
        for topic in ["a", "b", "c", "d"] {
            let (_, body) =
                send(&app, Method::POST, &commands, Some(json!({"op": "add_skill"}))).await;
            let id = body["created_id"].as_str().unwrap().to_string();
            send(
                &app,
                Method::POST,
                &commands,
                Some(json!({"op": "update_skill", "skill_id": id, "topic": topic})),
            )
            .await;
            ids.push(id);
        }

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("{base}/drag/start"),
            Some(json!({"list": "skills", "key": ids[0]})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{base}/drag/drop"),
            Some(json!({
                "list": "skills",
                "target": ids[2],
                "offset_y": 15.0,
                "target_height": 20.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["new_index"], 2);
        let topics: Vec<&str> = body["resume"]["savedSkills"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["topic"].as_str().unwrap())
            .collect();
        assert_eq!(topics, vec!["b", "c", "a", "d"]);
    }

    #[tokio::test]
    async fn test_session_restores_from_store() {
        let store = Arc::new(MemorySnapshotStore::new());
        let user = Uuid::new_v4();
        store
            .put_raw(user, r#"{"name": "Restored", "savedProjects": [{"name": "old"}]}"#)
            .await;
        let app = build_router(test_state(store));
        let uri = format!("/api/v1/resumes/{user}");
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Restored");
        assert_eq!(body["activeProjects"][0]["name"], "old");
    }

    #[tokio::test]
    async fn test_open_and_close_section() {
        let app = memory_app();
        let base = format!("/api/v1/resumes/{}", Uuid::new_v4());
        let (status, body) =
            send(&app, Method::POST, &format!("{base}/sections/skills/open"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["openSections"], json!(["skills"]));

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{base}/sections/skills/close"),
            Some(json!({"mode": "discard"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["openSections"], json!([]));
    }
}
