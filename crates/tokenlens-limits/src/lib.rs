//! Limit checking and batch planning
//!
//! [`LimitChecker`] looks a model up in the catalog, counts tokens with a
//! tokenizer from the registry at an explicit tier and, when the text is over
//! the limit, asks the batch planner for a split. Media requests are validated
//! against the declared media limits.

pub mod checker;
pub mod error;
pub mod media;
pub mod planner;
pub mod report;

pub use checker::{LimitChecker, TextCheckOptions};
pub use error::{LimitError, LimitResult};
pub use media::{AvatarRequest, ContentRequest, ImageRequest, VideoRequest, VoiceRequest};
pub use planner::{Batch, PlanError, PlanResult, plan_batches, plan_token_batches};
pub use report::{CheckReport, LimitCheckResult, MediaCheckResult, ProviderSummary, Violation};
