// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Bucket Name Permutation Engine
 * Generates candidate S3 bucket names from seed keywords
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static VALID_BUCKET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").unwrap());

/// Checks whether a name conforms to S3 bucket naming rules.
pub fn is_valid_bucket_name(name: &str) -> bool {
    if name.len() < 3 || name.len() > 63 {
        return false;
    }

    // Dotted-quad names are reserved (would look like an IP address)
    if is_ipv4_shaped(name) {
        return false;
    }

    if name.contains("..") {
        return false;
    }

    VALID_BUCKET_NAME.is_match(name)
}

/// Four dot-separated groups of 1-3 digits, e.g. "192.168.1.1".
fn is_ipv4_shaped(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts
        .iter()
        .all(|part| !part.is_empty() && part.len() <= 3 && part.bytes().all(|b| b.is_ascii_digit()))
}

/// Generates bucket name permutations from seed keywords.
///
/// The knob sets ship with common AWS naming patterns; operators can
/// replace any of them before generating.
#[derive(Debug, Clone)]
pub struct PermutationEngine {
    pub suffixes: Vec<&'static str>,
    pub prefixes: Vec<&'static str>,
    pub separators: Vec<&'static str>,
    pub years: Vec<&'static str>,
    pub regions: Vec<&'static str>,
}

impl Default for PermutationEngine {
    fn default() -> Self {
        Self {
            suffixes: vec![
                "", "-dev", "-prod", "-staging", "-backup", "-backups", "-logs", "-assets",
                "-internal", "-public", "-private", "-data", "-files", "-media", "-static", "-cdn",
                "-api", "-web", "-app", "-test", "-temp", "-archive", "-old", "-new", "-v2",
                "-beta",
            ],
            prefixes: vec![
                "", "dev-", "prod-", "staging-", "backup-", "test-", "internal-", "public-",
                "private-", "temp-", "old-",
            ],
            separators: vec!["-", "."],
            years: vec![
                "", "-2022", "-2023", "-2024", "-2025", "-22", "-23", "-24", "-25",
            ],
            regions: vec![
                "",
                "-us-east-1",
                "-us-east-2",
                "-us-west-1",
                "-us-west-2",
                "-eu-west-1",
                "-eu-west-2",
                "-eu-central-1",
                "-ap-south-1",
                "-ap-northeast-1",
                "-ap-southeast-1",
            ],
        }
    }
}

impl PermutationEngine {
    /// Creates all permutations for the given seed keyword.
    ///
    /// Output is deduplicated, validated, and deterministic for a fixed
    /// seed and knob set.
    pub fn generate(&self, seed: &str) -> Vec<String> {
        let seed = seed.trim().to_lowercase();
        if seed.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();

        let mut add = |name: String| {
            if is_valid_bucket_name(&name) && seen.insert(name.clone()) {
                results.push(name);
            }
        };

        // Base seed
        add(seed.clone());

        // Prefix + seed
        for prefix in &self.prefixes {
            add(format!("{prefix}{seed}"));
        }

        // Seed + suffix
        for suffix in &self.suffixes {
            add(format!("{seed}{suffix}"));
        }

        // Prefix + seed + suffix
        for prefix in &self.prefixes {
            for suffix in &self.suffixes {
                add(format!("{prefix}{seed}{suffix}"));
            }
        }

        // Seed + year
        for year in &self.years {
            add(format!("{seed}{year}"));
        }

        // Seed + suffix + year
        for suffix in &self.suffixes {
            for year in &self.years {
                add(format!("{seed}{suffix}{year}"));
            }
        }

        // Seed + region
        for region in &self.regions {
            add(format!("{seed}{region}"));
        }

        // Seed + suffix + region
        for suffix in &self.suffixes {
            for region in &self.regions {
                add(format!("{seed}{suffix}{region}"));
            }
        }

        // Separator variations (replace - with .)
        for sep in &self.separators {
            if *sep != "-" {
                let variant = seed.replace('-', sep);
                if variant != seed {
                    add(variant.clone());
                    for suffix in &self.suffixes {
                        add(format!("{variant}{suffix}"));
                    }
                }
            }
        }

        results
    }
}

/// Extracts permutation-worthy words from a subdomain list.
///
/// The base domain suffix is stripped, the remainder split on `.` and `-`,
/// and tokens shorter than 3 characters are dropped (they produce noise
/// like `m` or `v1`). First occurrence wins, order preserved.
pub fn extract_subdomain_words(subdomains: &[String], base_domain: &str) -> Vec<String> {
    let base_suffix = format!(".{}", base_domain.trim().to_lowercase());
    let mut seen = HashSet::new();
    let mut words = Vec::new();

    for sub in subdomains {
        let sub = sub.trim().to_lowercase();
        let stripped = sub.strip_suffix(&base_suffix).unwrap_or(&sub);

        for part in stripped.split(['.', '-']) {
            if part.len() >= 3 && seen.insert(part.to_string()) {
                words.push(part.to_string());
            }
        }
    }

    words
}

/// Assembles the full candidate list for one scan.
///
/// All input sources feed one global dedup set: first insertion wins and
/// insertion order is preserved, so a fixed set of inputs always yields
/// the same scan list.
#[derive(Debug, Default)]
pub struct NameGenerator {
    engine: PermutationEngine,
    seen: HashSet<String>,
    names: Vec<String>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::with_engine(PermutationEngine::default())
    }

    pub fn with_engine(engine: PermutationEngine) -> Self {
        Self {
            engine,
            seen: HashSet::new(),
            names: Vec::new(),
        }
    }

    fn add(&mut self, name: &str) {
        let name = name.trim().to_lowercase();
        if is_valid_bucket_name(&name) && self.seen.insert(name.clone()) {
            self.names.push(name);
        }
    }

    /// Runs the permutation engine over a seed keyword.
    pub fn add_seed(&mut self, seed: &str) {
        for name in self.engine.generate(seed) {
            self.add(&name);
        }
    }

    /// Adds wordlist entries verbatim (trim + lowercase only).
    ///
    /// No permutation is applied: wordlists give operators exact control
    /// over what gets probed.
    pub fn add_wordlist(&mut self, words: &[String]) {
        for word in words {
            self.add(word);
        }
    }

    /// Adds discovered subdomains verbatim, then permutes the words
    /// extracted from them.
    pub fn add_subdomains(&mut self, subdomains: &[String], base_domain: &str) {
        for sub in subdomains {
            self.add(sub);
        }
        for word in extract_subdomain_words(subdomains, base_domain) {
            self.add_seed(&word);
        }
    }

    /// Adds an externally supplied batch (AI suggestions, operator input)
    /// verbatim.
    pub fn add_external(&mut self, names: &[String]) {
        for name in names {
            self.add(name);
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_length_boundaries() {
        assert!(!is_valid_bucket_name("ab"));
        assert!(is_valid_bucket_name("abc"));
        assert!(is_valid_bucket_name(&"a".repeat(63)));
        assert!(!is_valid_bucket_name(&"a".repeat(64)));
    }

    #[test]
    fn rejects_invalid_characters_and_shapes() {
        assert!(!is_valid_bucket_name("ACME"));
        assert!(!is_valid_bucket_name("acme_dev"));
        assert!(!is_valid_bucket_name("-acme"));
        assert!(!is_valid_bucket_name("acme-"));
        assert!(!is_valid_bucket_name("acme..logs"));
        assert!(is_valid_bucket_name("acme.logs"));
    }

    #[test]
    fn rejects_ipv4_shaped_names() {
        assert!(!is_valid_bucket_name("192.168.1.1"));
        assert!(!is_valid_bucket_name("1.2.3.4"));
        assert!(!is_valid_bucket_name("255.255.255.255"));
        // Not dotted-quad digits, so these are fine
        assert!(is_valid_bucket_name("1.2.3.a"));
        assert!(is_valid_bucket_name("1.2.3.4.5"));
    }

    #[test]
    fn generates_expected_permutations_for_seed() {
        let engine = PermutationEngine::default();
        let names = engine.generate("acme");

        for expected in [
            "acme",
            "acme-dev",
            "acme-prod",
            "dev-acme",
            "acme-backup",
            "acme-2024",
            "acme-us-east-1",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }

        assert!(!names.contains(&"ACME".to_string()));
        assert!(!names.contains(&"acme_dev".to_string()));
        assert!(names.len() >= 700, "only {} names generated", names.len());
    }

    #[test]
    fn generation_is_deterministic_and_unique() {
        let engine = PermutationEngine::default();
        let first = engine.generate("acme");
        let second = engine.generate("acme");
        assert_eq!(first, second);

        let unique: HashSet<&String> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
    }

    #[test]
    fn normalizes_seed_case_and_whitespace() {
        let engine = PermutationEngine::default();
        assert_eq!(engine.generate("  ACME  "), engine.generate("acme"));
        assert!(engine.generate("   ").is_empty());
    }

    #[test]
    fn separator_variant_replaces_hyphens() {
        let engine = PermutationEngine::default();
        let names = engine.generate("acme-corp");
        assert!(names.contains(&"acme.corp".to_string()));
        assert!(names.contains(&"acme.corp-dev".to_string()));
    }

    #[test]
    fn wordlist_entries_are_not_permuted() {
        let mut gen = NameGenerator::new();
        gen.add_wordlist(&["backup".to_string(), "logs".to_string()]);
        assert_eq!(
            gen.into_names(),
            vec!["backup".to_string(), "logs".to_string()]
        );
    }

    #[test]
    fn wordlist_entries_are_normalized_and_validated() {
        let mut gen = NameGenerator::new();
        gen.add_wordlist(&[
            " Backup ".to_string(),
            "x".to_string(),
            "backup".to_string(),
        ]);
        assert_eq!(gen.into_names(), vec!["backup".to_string()]);
    }

    #[test]
    fn extracts_words_from_subdomains() {
        let subs = vec![
            "assets.acme.com".to_string(),
            "dev-api.acme.com".to_string(),
            "m.acme.com".to_string(),
        ];
        let words = extract_subdomain_words(&subs, "acme.com");
        assert_eq!(
            words,
            vec!["assets".to_string(), "dev".to_string(), "api".to_string()]
        );
    }

    #[test]
    fn subdomains_added_verbatim_and_words_permuted() {
        let mut gen = NameGenerator::new();
        gen.add_subdomains(&["assets.acme.com".to_string()], "acme.com");
        let names = gen.into_names();

        assert!(names.contains(&"assets.acme.com".to_string()));
        // Extracted word went through the full permutation engine
        assert!(names.contains(&"assets".to_string()));
        assert!(names.contains(&"assets-backup".to_string()));
    }

    #[test]
    fn dedup_is_global_across_sources() {
        let mut gen = NameGenerator::new();
        gen.add_seed("acme");
        let after_seed = gen.len();
        gen.add_wordlist(&["acme".to_string(), "acme-dev".to_string()]);
        assert_eq!(gen.len(), after_seed);
    }
}
