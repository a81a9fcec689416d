//! ledgerlens-core: statement data model, the model seam, and the bounded
//! parallel row processor shared by every annotation stage.

pub mod annotation;
pub mod batch;
pub mod model;
pub mod progress;
pub mod transaction;

pub use annotation::{CategoryAnnotation, Confidence, RemarkAnnotation, NO_DOUBTS, UNCLEAR};
pub use batch::{
    process_batch, process_batch_gated, BatchError, BatchResult, Concurrency, RowOutcome, Stage,
    DEFAULT_CONCURRENCY,
};
pub use model::Model;
pub use progress::{Progress, DEFAULT_REPORT_EVERY};
pub use transaction::{AnnotatedStatement, AnnotatedTransaction, Statement, Transaction};
