//! Reduce a cast stream to one record per author
//!
//! Authors are keyed by FID. The first cast seen for an author supplies the
//! snapshot (username, follower count, wallets); later casts by the same
//! author only bump the duplicate counter.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants;
use crate::neynar::Cast;

/// Likely-bot heuristic: very new accounts (high FID) with almost no followers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpamFilter {
    pub max_fid: u64,
    pub min_followers: u64,
}

impl Default for SpamFilter {
    fn default() -> Self {
        Self {
            max_fid: constants::SPAM_MAX_FID,
            min_followers: constants::SPAM_MIN_FOLLOWERS,
        }
    }
}

impl SpamFilter {
    /// Both conditions must hold; boundary values are kept
    pub fn is_spam(&self, fid: u64, follower_count: u64) -> bool {
        fid > self.max_fid && follower_count < self.min_followers
    }
}

/// One unique cast author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueUser {
    pub username: String,
    pub display_name: String,
    pub fid: u64,
    pub follower_count: u64,
    /// Verified Ethereum addresses in profile order
    pub verified_addresses: Vec<String>,
    pub profile_image: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupeStats {
    pub total_casts: usize,
    pub duplicate_casts: usize,
    pub filtered_bots: usize,
    /// Casts with no author or no username
    pub skipped_casts: usize,
}

/// Extract unique users, first-seen order
pub fn dedupe(casts: &[Cast], filter: &SpamFilter) -> (Vec<UniqueUser>, DedupeStats) {
    let mut seen = HashSet::new();
    let mut users = Vec::new();
    let mut stats = DedupeStats {
        total_casts: casts.len(),
        ..DedupeStats::default()
    };

    for cast in casts {
        let Some(author) = &cast.author else {
            stats.skipped_casts += 1;
            continue;
        };
        let Some(username) = author.username.as_deref().filter(|u| !u.is_empty()) else {
            stats.skipped_casts += 1;
            continue;
        };

        let follower_count = author.follower_count.unwrap_or(0);
        if filter.is_spam(author.fid, follower_count) {
            stats.filtered_bots += 1;
            continue;
        }

        if !seen.insert(author.fid) {
            stats.duplicate_casts += 1;
            continue;
        }

        let display_name = author
            .display_name
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(username)
            .to_string();

        users.push(UniqueUser {
            username: username.to_string(),
            display_name,
            fid: author.fid,
            follower_count,
            verified_addresses: author.verified_addresses.eth_addresses.clone(),
            profile_image: author.pfp_url.clone().unwrap_or_default(),
        });
    }

    tracing::info!(
        casts = stats.total_casts,
        unique_users = users.len(),
        duplicates = stats.duplicate_casts,
        bots = stats.filtered_bots,
        "Extracted unique users"
    );

    (users, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neynar::{Author, VerifiedAddresses};

    fn cast(fid: u64, username: &str, followers: u64, wallets: &[&str]) -> Cast {
        Cast {
            hash: format!("0x{}{}", fid, username),
            text: "$elizaOS".to_string(),
            timestamp: None,
            author: Some(Author {
                fid,
                username: Some(username.to_string()),
                display_name: None,
                follower_count: Some(followers),
                verified_addresses: VerifiedAddresses {
                    eth_addresses: wallets.iter().map(|w| w.to_string()).collect(),
                    sol_addresses: Vec::new(),
                },
                pfp_url: None,
            }),
        }
    }

    #[test]
    fn test_first_seen_snapshot_wins() {
        let casts = vec![
            cast(1, "alice", 100, &["0xaaa"]),
            cast(2, "bob", 50, &[]),
            cast(1, "alice_renamed", 9999, &["0xbbb"]),
            cast(2, "bob", 51, &["0xccc"]),
        ];

        let (users, stats) = dedupe(&casts, &SpamFilter::default());

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].fid, 1);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].follower_count, 100);
        assert_eq!(users[0].verified_addresses, vec!["0xaaa".to_string()]);
        assert_eq!(users[1].fid, 2);
        assert!(users[1].verified_addresses.is_empty());
        assert_eq!(stats.duplicate_casts, 2);
    }

    #[test]
    fn test_at_most_one_record_per_fid() {
        let casts: Vec<Cast> = (0..50).map(|i| cast(i % 7, &format!("user{}", i % 7), 10, &[])).collect();

        let (users, stats) = dedupe(&casts, &SpamFilter::default());

        let fids: HashSet<u64> = users.iter().map(|u| u.fid).collect();
        assert_eq!(fids.len(), users.len());
        assert_eq!(users.len(), 7);
        assert_eq!(stats.duplicate_casts, 43);
    }

    #[test]
    fn test_spam_filter_boundaries() {
        let filter = SpamFilter::default();

        assert!(filter.is_spam(1_000_001, 4));
        // Equal values are not excluded
        assert!(!filter.is_spam(1_000_000, 4));
        assert!(!filter.is_spam(1_000_001, 5));
        assert!(!filter.is_spam(1_000_000, 5));
        // Both conditions are required
        assert!(!filter.is_spam(5, 0));
        assert!(!filter.is_spam(2_000_000, 500));
    }

    #[test]
    fn test_bots_are_dropped() {
        let casts = vec![
            cast(1_500_000, "fresh_bot", 1, &["0xaaa"]),
            cast(1_500_001, "fresh_human", 5, &[]),
            cast(12, "og", 0, &[]),
        ];

        let (users, stats) = dedupe(&casts, &SpamFilter::default());

        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["fresh_human", "og"]);
        assert_eq!(stats.filtered_bots, 1);
    }

    #[test]
    fn test_custom_thresholds() {
        let filter = SpamFilter {
            max_fid: 10,
            min_followers: 100,
        };
        let casts = vec![cast(11, "a", 99, &[]), cast(11, "a", 100, &[])];

        let (users, stats) = dedupe(&casts, &filter);

        // The first cast is filtered, so the second one becomes the snapshot
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].follower_count, 100);
        assert_eq!(stats.filtered_bots, 1);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut with_name = cast(3, "carol", 10, &[]);
        if let Some(author) = with_name.author.as_mut() {
            author.display_name = Some("Carol C".to_string());
            author.pfp_url = Some("https://img/carol.png".to_string());
        }
        let casts = vec![cast(1, "alice", 10, &[]), with_name];

        let (users, _) = dedupe(&casts, &SpamFilter::default());

        assert_eq!(users[0].display_name, "alice");
        assert_eq!(users[0].profile_image, "");
        assert_eq!(users[1].display_name, "Carol C");
        assert_eq!(users[1].profile_image, "https://img/carol.png");
    }

    #[test]
    fn test_casts_without_author_are_skipped() {
        let mut anonymous = cast(9, "x", 10, &[]);
        anonymous.author = None;
        let mut nameless = cast(10, "", 10, &[]);
        if let Some(author) = nameless.author.as_mut() {
            author.username = None;
        }

        let (users, stats) = dedupe(&[anonymous, nameless], &SpamFilter::default());

        assert!(users.is_empty());
        assert_eq!(stats.skipped_casts, 2);
    }
}
