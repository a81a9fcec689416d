//! ledgerlens-finance: remark normalization, categorization, summary and chat context

pub mod categorize;
pub mod chat;
pub mod money;
pub mod pipeline;
pub mod prompts;
pub mod remarks;
pub mod response;
pub mod summary;

pub use categorize::{CategorizeInput, Categorizer};
pub use chat::{ask, ChatCommand, ChatContext, HELP_TEXT};
pub use money::format_inr;
pub use pipeline::{Analyzer, ProgressFn};
pub use remarks::RemarkNormalizer;
pub use response::{parse_category_response, parse_remark_response, ParseFailure};
pub use summary::{CategoryTotal, GroupTotal, Summary};
