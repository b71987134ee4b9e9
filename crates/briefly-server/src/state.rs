use std::sync::Arc;

use briefly_core::store::Store;
use briefly_pipeline::BriefingComposer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub briefing: Arc<BriefingComposer>,
}
