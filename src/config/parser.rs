use crate::config::types::Config;
use crate::config::validation::validate;
use crate::scoring::FlaggedWord;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the flagged-word list
///
/// The file holds one `word,priority` pair per line. Words are
/// case-normalized on load; blank lines and `#` comments are skipped.
///
/// # Example file
///
/// ```text
/// # word,priority
/// report,3
/// archive,1
/// ```
pub fn load_flagged_words(path: &Path) -> Result<Vec<FlaggedWord>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut words = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (word, priority) = line.split_once(',').ok_or(ConfigError::FlaggedWord {
            line: idx + 1,
            message: "expected `word,priority`".to_string(),
        })?;
        let word = word.trim();
        if word.is_empty() {
            return Err(ConfigError::FlaggedWord {
                line: idx + 1,
                message: "empty word".to_string(),
            });
        }
        let priority: i64 = priority.trim().parse().map_err(|_| ConfigError::FlaggedWord {
            line: idx + 1,
            message: format!("invalid priority `{}`", priority.trim()),
        })?;

        words.push(FlaggedWord::new(word, priority));
    }

    Ok(words)
}

/// Loads the seed URL list: one URL per line, blank lines and `#`
/// comments skipped
pub fn load_seed_urls(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn empty_config_uses_defaults() {
        let f = write_temp("");
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.crawler.worker_sets, 3);
        assert_eq!(config.fetch.max_response_size, 200_000_000);
        assert_eq!(config.seen.expected_items, 10_000_000);
        assert_eq!(config.scoring.promote_floor, 80);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let f = write_temp(
            r#"
[crawler]
worker-sets = 1
fetch-tiers = [90, 50]

[fetch]
use-browser = true
max-response-size = 1000

[queue]
backend = "memory"

[scoring]
promote-threshold = 5.0
"#,
        );
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.crawler.worker_sets, 1);
        assert_eq!(config.crawler.fetch_tiers, vec![90, 50]);
        assert!(config.fetch.use_browser);
        assert_eq!(config.fetch.max_response_size, 1000);
        assert_eq!(
            config.queue.backend,
            crate::config::QueueBackend::Memory
        );
        assert_eq!(config.scoring.promote_threshold, 5.0);
    }

    #[test]
    fn flagged_words_parse_and_normalize() {
        let f = write_temp("# comment\nReport,3\n\narchive , 1\n");
        let words = load_flagged_words(f.path()).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].word, "report");
        assert_eq!(words[0].priority, 3);
        assert_eq!(words[1].word, "archive");
        assert_eq!(words[1].priority, 1);
    }

    #[test]
    fn malformed_flagged_word_reports_line() {
        let f = write_temp("good,1\nbad-line\n");
        match load_flagged_words(f.path()) {
            Err(ConfigError::FlaggedWord { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected flagged-word error, got {other:?}"),
        }
    }

    #[test]
    fn seed_urls_skip_comments_and_blanks() {
        let f = write_temp("https://a.example/\n\n# seed two\nhttps://b.example/\n");
        let seeds = load_seed_urls(f.path()).unwrap();
        assert_eq!(seeds, vec!["https://a.example/", "https://b.example/"]);
    }
}
