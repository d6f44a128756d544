use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::settings::VectorBackend;
use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::llm::{build_generator, GenerativeClient, OpenAiEmbedder};
use crate::rag::{
    ChatOptions, ChatPipeline, DocumentStore, IngestionPipeline, PineconeIndex,
    SqliteDocumentStore, SqliteVectorIndex, VectorIndex,
};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes and the ingest command.
///
/// Every collaborator is built once here and handed to the pipelines
/// explicitly; nothing reads configuration after startup.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Settings,
    pub store: Arc<dyn DocumentStore>,
    pub index: Arc<dyn VectorIndex>,
    pub chat: ChatPipeline,
    pub ingestion: IngestionPipeline,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// 1. Resolve paths and load configuration
    /// 2. Open the document store
    /// 3. Connect the configured vector index
    /// 4. Build the generative client and both pipelines
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let config = ConfigService::new(paths.clone());
        let settings = config
            .settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let store: Arc<dyn DocumentStore> = Arc::new(
            SqliteDocumentStore::new(paths.as_ref())
                .await
                .map_err(|e| InitializationError::DocumentStore(e.into()))?,
        );

        let index = build_index(&paths, &settings)
            .await
            .map_err(|e| InitializationError::VectorIndex(e.into()))?;

        let generator =
            build_generator(&settings.llm).map_err(|e| InitializationError::Llm(e.into()))?;

        Ok(Arc::new(Self::from_parts(
            paths, config, settings, store, index, generator,
        )))
    }

    /// Wire pre-built collaborators together.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: Settings,
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn GenerativeClient>,
    ) -> Self {
        let options = ChatOptions {
            child_fetch_concurrency: settings.pipeline.child_fetch_concurrency,
            detect_small_talk: settings.pipeline.detect_small_talk,
        };
        let chat = ChatPipeline::new(index.clone(), store.clone(), generator, options);
        let ingestion = IngestionPipeline::new(store.clone(), index.clone());

        Self {
            paths,
            config,
            settings,
            store,
            index,
            chat,
            ingestion,
            started_at: Utc::now(),
        }
    }
}

async fn build_index(
    paths: &AppPaths,
    settings: &Settings,
) -> Result<Arc<dyn VectorIndex>, crate::core::errors::PipelineError> {
    let top_k = settings.vector_index.top_k;
    let index: Arc<dyn VectorIndex> = match settings.vector_index.backend {
        VectorBackend::Sqlite => {
            let embedder = Arc::new(OpenAiEmbedder::new(&settings.embedding));
            Arc::new(
                SqliteVectorIndex::with_path(paths.vector_db_path.clone(), embedder, top_k)
                    .await?,
            )
        }
        VectorBackend::Pinecone => {
            Arc::new(PineconeIndex::new(&settings.vector_index.pinecone, top_k)?)
        }
    };
    tracing::info!(
        "Using {:?} vector index (top_k = {})",
        settings.vector_index.backend,
        top_k
    );
    Ok(index)
}
