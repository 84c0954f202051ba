//! Commit models

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Whether a commit is already on the remote-tracking ref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushedStatus {
    Pushed,
    Unpushed,
}

/// Commit information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub oid: String,
    pub short_hash: String,
    pub full_message: String,
    pub author_name: String,
    pub author_date: DateTime<FixedOffset>,
    pub pushed_status: PushedStatus,
}

impl CommitInfo {
    pub fn from_git2(commit: &git2::Commit, pushed_status: PushedStatus) -> Self {
        let author = commit.author();
        let oid = commit.id().to_string();

        CommitInfo {
            short_hash: short_hash(&oid),
            oid,
            full_message: commit.message().unwrap_or("").trim().to_string(),
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_date: signature_time(&author.when()),
            pushed_status,
        }
    }
}

/// First seven hex characters of an object id
pub fn short_hash(oid: &str) -> String {
    oid.chars().take(7).collect()
}

/// Convert a git timestamp, keeping the signer's UTC offset
fn signature_time(time: &git2::Time) -> DateTime<FixedOffset> {
    let utc = DateTime::<Utc>::from_timestamp(time.seconds(), 0).unwrap_or_default();
    match FixedOffset::east_opt(time.offset_minutes() * 60) {
        Some(offset) => offset.from_utc_datetime(&utc.naive_utc()),
        None => utc.fixed_offset(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_signature_time_keeps_offset() {
        let time = git2::Time::new(1_700_000_000, 120);
        let date = signature_time(&time);
        assert_eq!(date.offset().local_minus_utc(), 7200);
        assert_eq!(date.timestamp(), 1_700_000_000);
    }
}
