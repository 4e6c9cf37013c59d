//! The reading pipeline: retrieval fan-out, imagery/interpretation
//! synthesis, and the SSE-emitting orchestrator (spec §4.9-§4.11 Retriever,
//! ImageryGenerator, Interpreter; §4.10 ReadingOrchestrator).

mod cancellation;
mod context;
mod imagery;
mod interpreter;
mod orchestrator;
mod process_row;
mod reading;
mod reading_store;
mod retriever;

pub use cancellation::cancellation_pair;
pub use cancellation::CancellationHandle;
pub use cancellation::CancellationToken;
pub use context::ReadingContext;
pub use imagery::ImageryGenerator;
pub use imagery::ImageryOutput;
pub use interpreter::Interpreter;
pub use interpreter::OutputLanguage;
pub use orchestrator::ReadingOrchestrator;
pub use process_row::AuditSink;
pub use process_row::LoggingAuditSink;
pub use process_row::ProcessRow;
pub use process_row::STEP_CARD_SELECTION;
pub use process_row::STEP_IMAGERY;
pub use process_row::STEP_INTERPRETATION;
pub use process_row::STEP_PATTERN_ANALYSIS;
pub use process_row::STEP_QUESTION_ANALYSIS;
pub use process_row::STEP_RAG_RETRIEVAL;
pub use reading::Reading;
pub use reading::ReadingStatus;
pub use reading_store::LoggingReadingStore;
pub use reading_store::ReadingStore;
pub use retriever::merge_all;
pub use retriever::BackgroundRetrieval;
pub use retriever::CardOutcome;
pub use retriever::Retriever;
