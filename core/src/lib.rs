pub mod archive;
pub mod config;
pub mod llm;
pub mod locator;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod translate;
pub mod workspace;

pub use archive::{
    extract_archive, package_single_resource, repackage_archive, write_translated_resource,
    ArchiveError, ArchiveResult,
};
pub use config::{ConfigError, LlmConfig, DEFAULT_API_BASE_URL, DEFAULT_MODEL};
pub use llm::{ChatRequest, LlmClient, LlmError};
pub use locator::{
    locate_lang_resources, LangResource, LocatorError, SOURCE_LANG_FILE, TARGET_LANG_FILE,
};
pub use parser::parse_translation_response;
pub use pipeline::{process_mod_archive, PipelineError};
pub use progress::{NoProgress, ProgressEvent, ProgressSink, SinkError};
pub use session::{Session, SessionStore};
pub use translate::{
    translate_resource, translate_texts, SourceEntry, TextTranslation, TranslationEntry,
    TranslationOutcome, MAX_TOKENS_PER_REQUEST,
};
pub use workspace::Workspace;
