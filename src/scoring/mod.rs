//! Link scoring: keyword ratings and priority tiers
//!
//! Two independent, pure computations over a candidate link:
//!
//! - **Rating** accumulates, for every (keyword, flagged word) match, the
//!   keyword's markup visibility weight scaled by the flagged word's
//!   configured priority. More matches mean a higher score; nothing is
//!   normalized away by text length.
//! - **Priority** is a first-match decision table over URL shape and domain
//!   reputation, with a configurable rating-promotion floor applied after
//!   the table. The rating can promote a link into a higher tier but never
//!   demote one.
//!
//! All numeric constants and tier numbers come from [`ScoringConfig`]
//! rather than being baked in; deployments disagree about them.

use crate::config::ScoringConfig;
use std::collections::HashSet;
use std::sync::RwLock;
use url::Url;

/// One piece of keyword evidence extracted near a link
///
/// `visibility` reflects the enclosing markup: text under an `<h1>` weighs
/// more than body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub text: String,
    pub visibility: u32,
}

/// A flagged word with its configured priority weight
///
/// Loaded once at startup from the flagged-word list; the word is stored
/// case-normalized.
#[derive(Debug, Clone)]
pub struct FlaggedWord {
    pub word: String,
    pub priority: i64,
}

impl FlaggedWord {
    pub fn new(word: &str, priority: i64) -> Self {
        Self {
            word: word.to_lowercase(),
            priority,
        }
    }
}

/// Computes the importance rating for a link from its keyword evidence
///
/// A keyword matches a flagged word when the flagged word's normalized text
/// is a substring of the keyword's normalized text. Each match contributes
/// `visibility * rating_factor * flagged.priority`.
pub fn link_rating(
    flagged_words: &[FlaggedWord],
    keywords: &[Keyword],
    config: &ScoringConfig,
) -> f64 {
    let mut rating = 0.0;
    for keyword in keywords {
        let text = keyword.text.to_lowercase();
        for flagged in flagged_words {
            if text.contains(&flagged.word) {
                rating += keyword.visibility as f64 * config.rating_factor * flagged.priority as f64;
            }
        }
    }
    rating
}

/// In-process domain reputation shared by all workers
///
/// `good` holds hostnames that previously yielded geolocated content;
/// `known` holds every hostname that has passed through the scorer. Both
/// live for the process lifetime and are rebuilt on restart.
#[derive(Default)]
pub struct DomainReputation {
    good: RwLock<HashSet<String>>,
    known: RwLock<HashSet<String>>,
}

impl DomainReputation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a hostname as having yielded geolocated content
    pub fn mark_good(&self, host: &str) {
        self.good.write().unwrap().insert(host.to_lowercase());
    }

    pub fn is_good(&self, host: &str) -> bool {
        self.good.read().unwrap().contains(&host.to_lowercase())
    }

    pub fn is_known(&self, host: &str) -> bool {
        self.known.read().unwrap().contains(&host.to_lowercase())
    }

    /// Records that a hostname has been scored at least once
    pub fn observe(&self, host: &str) {
        self.known.write().unwrap().insert(host.to_lowercase());
    }
}

/// Assigns the frontier tier for a link
///
/// The decision table is evaluated in precedence order, first match wins:
///
/// 1. Path suffix names a high-value executable/document type
/// 2. Path suffix names an image/media type of secondary interest
/// 3. The hostname is marked good
/// 4. The hostname has not been seen before
/// 5. Baseline
///
/// Afterwards, a rating above `promote_threshold` raises the priority to
/// `promote_floor` when the table produced something lower. The result is
/// deterministic for a given (URL, rating, reputation state).
pub fn link_priority(
    dest: &Url,
    rating: f64,
    reputation: &DomainReputation,
    config: &ScoringConfig,
) -> u32 {
    let url_lower = dest.as_str().to_lowercase();

    let table = if has_suffix(&url_lower, &config.executable_suffixes) {
        config.executable_tier
    } else if has_suffix(&url_lower, &config.media_suffixes) {
        config.media_tier
    } else if dest
        .host_str()
        .map(|h| reputation.is_good(h))
        .unwrap_or(false)
    {
        config.good_domain_tier
    } else if dest
        .host_str()
        .map(|h| !reputation.is_known(h))
        .unwrap_or(false)
    {
        config.new_domain_tier
    } else {
        config.baseline_tier
    };

    if rating > config.promote_threshold && table < config.promote_floor {
        config.promote_floor
    } else {
        table
    }
}

fn has_suffix(url_lower: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|s| url_lower.ends_with(s.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn flagged() -> Vec<FlaggedWord> {
        vec![FlaggedWord::new("Report", 3), FlaggedWord::new("archive", 1)]
    }

    #[test]
    fn rating_is_zero_without_evidence() {
        assert_eq!(link_rating(&flagged(), &[], &config()), 0.0);
    }

    #[test]
    fn rating_matches_are_case_insensitive_substrings() {
        let keywords = vec![Keyword {
            text: "Annual REPORT 2023".to_string(),
            visibility: 7,
        }];
        // 7 * 2.0 * 3
        assert_eq!(link_rating(&flagged(), &keywords, &config()), 42.0);
    }

    #[test]
    fn rating_grows_with_each_match() {
        let one = vec![Keyword {
            text: "report".to_string(),
            visibility: 1,
        }];
        let two = vec![
            Keyword {
                text: "report".to_string(),
                visibility: 1,
            },
            Keyword {
                text: "report archive".to_string(),
                visibility: 1,
            },
        ];
        let cfg = config();
        let r1 = link_rating(&flagged(), &one, &cfg);
        let r2 = link_rating(&flagged(), &two, &cfg);
        assert!(r1 > 0.0);
        assert!(r2 > r1);
    }

    #[test]
    fn executable_suffix_beats_everything() {
        let cfg = config();
        let reputation = DomainReputation::new();
        reputation.mark_good("good.example");

        let url = Url::parse("https://good.example/tool.exe").unwrap();
        assert_eq!(
            link_priority(&url, 1000.0, &reputation, &cfg),
            cfg.executable_tier
        );
    }

    #[test]
    fn media_suffix_gets_the_secondary_tier() {
        let cfg = config();
        let reputation = DomainReputation::new();
        let url = Url::parse("https://example.com/photo.JPG").unwrap();
        assert_eq!(link_priority(&url, 0.0, &reputation, &cfg), cfg.media_tier);
    }

    #[test]
    fn good_domain_outranks_new_domain() {
        let cfg = config();
        let reputation = DomainReputation::new();
        reputation.mark_good("good.example");

        let url = Url::parse("https://good.example/page").unwrap();
        assert_eq!(
            link_priority(&url, 0.0, &reputation, &cfg),
            cfg.good_domain_tier
        );
    }

    #[test]
    fn unseen_domain_gets_the_new_domain_tier() {
        let cfg = config();
        let reputation = DomainReputation::new();

        let url = Url::parse("https://fresh.example/page").unwrap();
        assert_eq!(
            link_priority(&url, 0.0, &reputation, &cfg),
            cfg.new_domain_tier
        );

        reputation.observe("fresh.example");
        assert_eq!(
            link_priority(&url, 0.0, &reputation, &cfg),
            cfg.baseline_tier
        );
    }

    #[test]
    fn rating_promotes_but_never_demotes() {
        let cfg = config();
        let reputation = DomainReputation::new();
        reputation.observe("example.com");

        let page = Url::parse("https://example.com/page").unwrap();
        let promoted = link_priority(&page, cfg.promote_threshold + 1.0, &reputation, &cfg);
        assert_eq!(promoted, cfg.promote_floor);

        // A tier above the floor is untouched by the promotion rule.
        let media = Url::parse("https://example.com/photo.png").unwrap();
        let kept = link_priority(&media, cfg.promote_threshold + 1.0, &reputation, &cfg);
        assert_eq!(kept, cfg.media_tier);
        assert!(kept >= cfg.promote_floor);
    }

    #[test]
    fn priority_is_deterministic() {
        let cfg = config();
        let reputation = DomainReputation::new();
        reputation.observe("example.com");

        let url = Url::parse("https://example.com/some/page.html").unwrap();
        let first = link_priority(&url, 12.5, &reputation, &cfg);
        for _ in 0..10 {
            assert_eq!(link_priority(&url, 12.5, &reputation, &cfg), first);
        }
    }
}
