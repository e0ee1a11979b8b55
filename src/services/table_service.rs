use crate::{
    dto::{table::TableStateResponse, validation::validate_resource_id},
    error::ServiceError,
    state::SharedState,
};

/// Serve the REST fallback sync pull for one table.
///
/// This is the path viewers use when the push channel cannot be established
/// or was lost; it always reflects the authoritative persisted snapshot.
pub async fn current_state(
    state: &SharedState,
    table_id: &str,
) -> Result<TableStateResponse, ServiceError> {
    validate_resource_id(table_id)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid table id: {err}")))?;

    let store = state.require_live_store().await?;
    let Some(entity) = store.table_snapshot(table_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "table `{table_id}` has no state"
        )));
    };

    Ok(entity.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::config::AppConfig;
    use crate::dao::live_store::testing::MockLiveStore;
    use crate::dao::models::TableStateEntity;
    use crate::state::AppState;

    #[tokio::test]
    async fn degraded_mode_is_reported_as_unavailable() {
        let state = AppState::new(AppConfig::default(), None);
        let err = current_state(&state, "t1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn unknown_table_is_not_found() {
        let state = AppState::new(AppConfig::default(), None);
        state.set_live_store(Arc::new(MockLiveStore::new())).await;

        let err = current_state(&state, "t1").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn invalid_table_id_is_rejected_before_the_store() {
        let state = AppState::new(AppConfig::default(), None);
        let err = current_state(&state, "not a table").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn returns_the_stored_snapshot() {
        let store = MockLiveStore::new();
        store.put_snapshot(TableStateEntity {
            table_id: "t1".into(),
            snapshot: json!({"pot": 42, "turn": "u1"}),
            updated_at_ms: 1_700_000_000_000,
        });

        let state = AppState::new(AppConfig::default(), None);
        state.set_live_store(Arc::new(store)).await;

        let response = current_state(&state, "t1").await.unwrap();
        assert_eq!(response.table_id, "t1");
        assert_eq!(response.snapshot["pot"], 42);
        assert_eq!(response.updated_at, "2023-11-14T22:13:20Z");
    }
}
