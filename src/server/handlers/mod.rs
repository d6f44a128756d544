pub mod chat;
pub mod health;
pub mod ingest;

#[cfg(test)]
pub(crate) mod test_state {
    use std::sync::Arc;

    use crate::core::config::{AppPaths, ConfigService, Settings};
    use crate::llm::GenerativeClient;
    use crate::rag::test_support::temp_store;
    use crate::rag::VectorIndex;
    use crate::state::AppState;

    /// State over a temp document store; the tempdir must outlive the state.
    pub async fn build(
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn GenerativeClient>,
    ) -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::with_data_dir(
            dir.path().to_path_buf(),
            dir.path().join("data"),
        ));
        let config = ConfigService::new(paths.clone());
        let store = temp_store().await;
        let state = AppState::from_parts(
            paths,
            config,
            Settings::default(),
            store,
            index,
            generator,
        );
        (Arc::new(state), dir)
    }
}
