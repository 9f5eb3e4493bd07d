use std::sync::Arc;

use crate::config::Config;
use crate::image_client::ImageClient;
use crate::llm_client::LlmClient;
use crate::records::RecordStore;
use crate::storage::StorageClient;

/// Everything a pipeline run needs: the resolved configuration plus the
/// injected collaborators. Built once in `main` (or a test) and passed by
/// reference; nothing here is global.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<dyn LlmClient>,
    pub image: Arc<dyn ImageClient>,
    pub storage: Arc<dyn StorageClient>,
    pub records: Arc<dyn RecordStore>,
}
