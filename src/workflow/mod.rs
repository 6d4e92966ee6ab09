pub mod job_ctx;
pub mod label_job;

pub use job_ctx::JobContext;
pub use label_job::{JobOutcome, LabelJob};
