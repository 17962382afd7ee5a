pub mod app;
pub mod core;

use once_cell::sync::OnceCell;

pub use crate::app::CreateCollectionPage;
pub use crate::core::guard::{AccountGuard, GuardStatus, PreconditionError};
pub use crate::core::orchestrator::{CreateCollectionFlow, FlowState, LaunchpadError, SubmissionResult};
pub use crate::core::payload::{build_payload, CollectionDraft, CreateCollectionPayload, EntryFunctionPayload};
pub use crate::core::settings::{ConfigError, LaunchpadConfig};
pub use crate::core::uploader::{upload_collection_data, CollectionMetadata, FileSet};

static LOGGER: OnceCell<()> = OnceCell::new();

#[cfg(target_arch = "wasm32")]
fn install_logger() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

#[cfg(not(target_arch = "wasm32"))]
fn install_logger() {
    // fails when the host already installed a logger
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(log::LevelFilter::Info).init() {
        log::debug!("Logger already set: {}", e);
    }
}

/// Install the platform logger; later calls are no-ops
pub fn init_logging() {
    LOGGER.get_or_init(install_logger);
}
