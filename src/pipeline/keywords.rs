use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, StopWordConfig};
use crate::error::{DashboardError, Result};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static word regex"));

/// Standard English stop words
const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Words that are common in incident reports but say nothing about the incident
const DOMAIN_EXCLUSIONS: &[&str] = &[
    "product", "use", "used", "using", "problem", "issue", "report", "fda", "medwatch", "patient",
    "consumer", "box", "bottle", "package", "ok", "yes", "day", "date", "time", "also", "got",
    "took", "take", "felt", "feel", "started", "like", "since", "get",
];

/// Set of tokens excluded from keyword rankings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stop_words = Self::default();
        stop_words.extend(words);
        stop_words
    }

    pub fn english() -> Self {
        Self::new(ENGLISH_STOP_WORDS.iter())
    }

    pub fn domain_exclusions() -> Self {
        Self::new(DOMAIN_EXCLUSIONS.iter())
    }

    /// English list plus domain exclusions
    pub fn standard() -> Self {
        Self::english().union(Self::domain_exclusions())
    }

    pub fn union(mut self, other: StopWords) -> Self {
        self.words.extend(other.words);
        self
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Load the standard list from `source` and add the domain exclusions.
    /// When the source is unavailable only the domain exclusions are used.
    pub fn resolve(source: &dyn StopWordSource) -> Self {
        match source.load() {
            Ok(words) => {
                info!("Loaded {} stop words from {}", words.len(), source.describe());
                words.union(Self::domain_exclusions())
            }
            Err(e) => {
                warn!(
                    "Failed to load stop words from {} ({}). Keyword analysis might be less accurate.",
                    source.describe(),
                    e
                );
                Self::domain_exclusions()
            }
        }
    }

    /// Build the stop-word set described by the run configuration
    pub fn from_config(config: &Config) -> Self {
        let mut stop_words = match source_for(&config.stop_words) {
            Some(source) => Self::resolve(source.as_ref()),
            None => Self::domain_exclusions(),
        };
        stop_words.extend(&config.extra_stop_words);
        stop_words
    }
}

/// A place the standard stop-word list can come from. Loading may fail;
/// callers degrade rather than abort.
pub trait StopWordSource {
    fn describe(&self) -> String;
    fn load(&self) -> Result<StopWords>;
}

pub struct EmbeddedEnglish;

impl StopWordSource for EmbeddedEnglish {
    fn describe(&self) -> String {
        "embedded English list".to_string()
    }

    fn load(&self) -> Result<StopWords> {
        Ok(StopWords::english())
    }
}

/// Plain-text word list, one word per line, `#` comments
pub struct FileStopWords {
    pub path: PathBuf,
}

impl StopWordSource for FileStopWords {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn load(&self) -> Result<StopWords> {
        let content = fs::read_to_string(&self.path)?;
        let words = parse_word_list(&content);
        if words.is_empty() {
            return Err(DashboardError::StopWords(format!(
                "{} contains no words",
                self.path.display()
            )));
        }
        Ok(words)
    }
}

/// Word list downloaded over HTTP, same format as `FileStopWords`
pub struct HttpStopWords {
    pub url: String,
    pub timeout: Duration,
}

impl HttpStopWords {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl StopWordSource for HttpStopWords {
    fn describe(&self) -> String {
        format!("url {}", self.url)
    }

    fn load(&self) -> Result<StopWords> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let body = client.get(&self.url).send()?.error_for_status()?.text()?;
        let words = parse_word_list(&body);
        if words.is_empty() {
            return Err(DashboardError::StopWords(format!("{} returned no words", self.url)));
        }
        Ok(words)
    }
}

fn source_for(config: &StopWordConfig) -> Option<Box<dyn StopWordSource>> {
    match config {
        StopWordConfig::Embedded => Some(Box::new(EmbeddedEnglish)),
        StopWordConfig::File { path } => Some(Box::new(FileStopWords { path: path.clone() })),
        StopWordConfig::Url { url } => Some(Box::new(HttpStopWords::new(url.clone()))),
        StopWordConfig::None => None,
    }
}

fn parse_word_list(content: &str) -> StopWords {
    StopWords::new(
        content
            .lines()
            .map(|line| line.split('#').next().unwrap_or(""))
            .filter(|line| !line.trim().is_empty()),
    )
}

/// Ranks the words of a text column by frequency
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stop_words: StopWords,
    min_len: usize,
    top_n: usize,
}

impl KeywordExtractor {
    pub fn new(stop_words: StopWords, min_len: usize, top_n: usize) -> Self {
        Self { stop_words, min_len, top_n }
    }

    pub fn from_config(config: &Config, stop_words: StopWords) -> Self {
        Self::new(stop_words, config.min_keyword_len, config.top_n)
    }

    /// Top-N `(word, count)` pairs, most frequent first. Equal counts keep
    /// the order in which the words first appeared.
    pub fn extract<'a, I>(&self, texts: I) -> Vec<(String, usize)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();

        for text in texts {
            for token in WORD_RE.find_iter(text) {
                let word = token.as_str().to_lowercase();
                if word.chars().count() < self.min_len || self.stop_words.contains(&word) {
                    continue;
                }
                match index.get(&word) {
                    Some(&i) => counts[i].1 += 1,
                    None => {
                        index.insert(word.clone(), counts.len());
                        counts.push((word, 1));
                    }
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(self.top_n);
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct Unavailable;

    impl StopWordSource for Unavailable {
        fn describe(&self) -> String {
            "nowhere".to_string()
        }

        fn load(&self) -> Result<StopWords> {
            Err(DashboardError::StopWords("offline".to_string()))
        }
    }

    #[test]
    fn test_ranks_by_frequency_after_filtering() {
        let extractor = KeywordExtractor::new(StopWords::new(["the", "was", "box", "product"]), 3, 15);
        let ranked = extractor.extract(["the product box was bad", "bad box again"]);
        assert_eq!(ranked, vec![("bad".to_string(), 2), ("again".to_string(), 1)]);
    }

    #[test]
    fn test_short_tokens_dropped_and_case_folded() {
        let extractor = KeywordExtractor::new(StopWords::default(), 3, 15);
        let ranked = extractor.extract(["An ITCHY rash, itchy eyes", "no"]);
        assert_eq!(
            ranked,
            vec![
                ("itchy".to_string(), 2),
                ("rash".to_string(), 1),
                ("eyes".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_truncates_to_top_n() {
        let extractor = KeywordExtractor::new(StopWords::default(), 3, 2);
        let ranked = extractor.extract(["alpha beta gamma gamma delta"]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0], ("gamma".to_string(), 2));
        assert_eq!(ranked[1], ("alpha".to_string(), 1));
    }

    #[test]
    fn test_empty_column_is_empty_result() {
        let extractor = KeywordExtractor::new(StopWords::standard(), 3, 15);
        assert!(extractor.extract(Vec::<&str>::new()).is_empty());
        assert!(extractor.extract(["", "   "]).is_empty());
    }

    #[test]
    fn test_standard_set_includes_domain_terms() {
        let words = StopWords::standard();
        assert!(words.contains("the"));
        assert!(words.contains("medwatch"));
        assert!(!words.contains("rash"));
    }

    #[test]
    fn test_unavailable_source_degrades_to_domain_exclusions() {
        let words = StopWords::resolve(&Unavailable);
        assert_eq!(words, StopWords::domain_exclusions());
        assert!(!words.contains("the"));
    }

    #[test]
    fn test_file_source_reads_word_list() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# custom list\nRash\n\nhives  # trailing comment").unwrap();

        let source = FileStopWords { path: file.path().to_path_buf() };
        let words = source.load().unwrap();
        assert_eq!(words, StopWords::new(["rash", "hives"]));
    }

    #[test]
    fn test_config_extra_words_are_added() {
        let config = Config {
            stop_words: StopWordConfig::None,
            extra_stop_words: vec!["Sunscreen".to_string()],
            ..Config::default()
        };
        let words = StopWords::from_config(&config);
        assert!(words.contains("sunscreen"));
        assert!(words.contains("product"));
        assert!(!words.contains("the"));
    }
}
