pub mod issues;

pub use issues::{format_preview, IssueRecord, IssuesClient};
