// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic keyword/pattern pre-filter.
//!
//! Stateless and pure: the same text always yields the same hit, safe to
//! re-run. Keywords are matched case-insensitively through one Aho-Corasick
//! automaton labeled by risk code; phone numbers, street addresses, and
//! social-handle solicitations are matched by compiled regexes and map to the
//! `personal_info` code. Any match routes the message `immediate`; no match
//! routes it `batch`.

use aho_corasick::AhoCorasick;
use regex::Regex;
use vigil_core::{RiskCode, VigilError};

/// Keyword table, one entry per (risk code, phrase).
const KEYWORDS: &[(RiskCode, &str)] = &[
    // Grooming language.
    (RiskCode::Grooming, "our little secret"),
    (RiskCode::Grooming, "mature for your age"),
    (RiskCode::Grooming, "so grown up"),
    (RiskCode::Grooming, "special friend"),
    (RiskCode::Grooming, "do you have a boyfriend"),
    (RiskCode::Grooming, "do you have a girlfriend"),
    (RiskCode::Grooming, "do your parents check your phone"),
    (RiskCode::Grooming, "i can teach you"),
    (RiskCode::Grooming, "buy you anything"),
    // Secrecy pressure.
    (RiskCode::Secrecy, "don't tell anyone"),
    (RiskCode::Secrecy, "dont tell anyone"),
    (RiskCode::Secrecy, "keep this between us"),
    (RiskCode::Secrecy, "delete this chat"),
    (RiskCode::Secrecy, "delete these messages"),
    (RiskCode::Secrecy, "no one can know"),
    (RiskCode::Secrecy, "use this app instead"),
    // Meetup / location solicitation.
    (RiskCode::Meetup, "meet up"),
    (RiskCode::Meetup, "meet me"),
    (RiskCode::Meetup, "come over"),
    (RiskCode::Meetup, "where do you live"),
    (RiskCode::Meetup, "what school do you go to"),
    (RiskCode::Meetup, "pick you up"),
    (RiskCode::Meetup, "home alone"),
    (RiskCode::Meetup, "are your parents home"),
    // Sexualized content.
    (RiskCode::SexualContent, "sexy"),
    (RiskCode::SexualContent, "nudes"),
    (RiskCode::SexualContent, "what are you wearing"),
    (RiskCode::SexualContent, "touch yourself"),
    (RiskCode::SexualContent, "turn me on"),
    // Explicit imagery requests.
    (RiskCode::ExplicitImagery, "send me a picture of you"),
    (RiskCode::ExplicitImagery, "send a pic"),
    (RiskCode::ExplicitImagery, "pic for pic"),
    (RiskCode::ExplicitImagery, "show me your body"),
    (RiskCode::ExplicitImagery, "without your clothes"),
    // Extortion / sextortion.
    (RiskCode::Extortion, "i have your photos"),
    (RiskCode::Extortion, "i'll share your photos"),
    (RiskCode::Extortion, "ill share your photos"),
    (RiskCode::Extortion, "everyone will see"),
    (RiskCode::Extortion, "unless you send"),
    (RiskCode::Extortion, "or i will post"),
    // Isolation tactics.
    (RiskCode::Isolation, "they don't understand you"),
    (RiskCode::Isolation, "they dont understand you"),
    (RiskCode::Isolation, "your parents don't care"),
    (RiskCode::Isolation, "your parents dont care"),
    (RiskCode::Isolation, "no one else gets you"),
    (RiskCode::Isolation, "i'm the only one who"),
    (RiskCode::Isolation, "im the only one who"),
];

/// Routing priority assigned by the pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePriority {
    /// Forward synchronously to Tier-1.
    Immediate,
    /// Append to the conversation's pending batch.
    Batch,
}

/// Pre-filter result for one message.
#[derive(Debug, Clone)]
pub struct PrefilterHit {
    /// Whether anything matched.
    pub suspicious: bool,
    /// Matched keyword phrases.
    pub keywords: Vec<String>,
    /// Matched regex pattern labels.
    pub patterns: Vec<String>,
    /// Derived risk codes, deduplicated, in match order.
    pub risk_codes: Vec<RiskCode>,
    /// Routing priority for the message.
    pub priority: RoutePriority,
}

/// Compiled keyword automaton and regex patterns.
pub struct Prefilter {
    keywords: AhoCorasick,
    keyword_codes: Vec<RiskCode>,
    keyword_phrases: Vec<String>,
    patterns: Vec<(String, Regex)>,
}

impl Prefilter {
    /// Compile the keyword automaton and regex patterns.
    pub fn new() -> Result<Self, VigilError> {
        let phrases: Vec<&str> = KEYWORDS.iter().map(|(_, phrase)| *phrase).collect();
        let keywords = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&phrases)
            .map_err(|e| VigilError::Internal(format!("failed to build keyword matcher: {e}")))?;

        let patterns = [
            ("phone_number", r"\+?\d[\d\s().-]{6,}\d"),
            (
                "street_address",
                r"(?i)\b\d{1,5}\s+\w+(\s+\w+)?\s+(street|st|avenue|ave|road|rd|lane|ln|drive|dr|boulevard|blvd|court|ct)\b",
            ),
            (
                "social_handle",
                r"(?i)(@[a-z0-9_.]{3,}|\badd me on (snap(chat)?|insta(gram)?|telegram|whatsapp|discord|signal)\b)",
            ),
        ]
        .into_iter()
        .map(|(label, pattern)| {
            Regex::new(pattern)
                .map(|re| (label.to_string(), re))
                .map_err(|e| VigilError::Internal(format!("failed to compile pattern {label}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            keywords,
            keyword_codes: KEYWORDS.iter().map(|(code, _)| *code).collect(),
            keyword_phrases: phrases.iter().map(|p| p.to_string()).collect(),
            patterns,
        })
    }

    /// Evaluate one message text (body plus caption, pre-joined by the caller).
    pub fn evaluate(&self, text: &str) -> PrefilterHit {
        let mut keywords = Vec::new();
        let mut risk_codes: Vec<RiskCode> = Vec::new();

        for mat in self.keywords.find_iter(text) {
            let idx = mat.pattern().as_usize();
            let phrase = &self.keyword_phrases[idx];
            if !keywords.contains(phrase) {
                keywords.push(phrase.clone());
            }
            let code = self.keyword_codes[idx];
            if !risk_codes.contains(&code) {
                risk_codes.push(code);
            }
        }

        let mut patterns = Vec::new();
        for (label, regex) in &self.patterns {
            if regex.is_match(text) {
                patterns.push(label.clone());
                if !risk_codes.contains(&RiskCode::PersonalInfo) {
                    risk_codes.push(RiskCode::PersonalInfo);
                }
            }
        }

        let suspicious = !keywords.is_empty() || !patterns.is_empty();
        let priority = if suspicious {
            RoutePriority::Immediate
        } else {
            RoutePriority::Batch
        };

        PrefilterHit {
            suspicious,
            keywords,
            patterns,
            risk_codes,
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn prefilter() -> Prefilter {
        Prefilter::new().unwrap()
    }

    #[test]
    fn benign_text_is_batch() {
        let pf = prefilter();
        for text in [
            "",
            "see you at practice tomorrow",
            "did you finish the homework",
            "lol that video was great",
        ] {
            let hit = pf.evaluate(text);
            assert!(!hit.suspicious, "{text:?} should not match");
            assert_eq!(hit.priority, RoutePriority::Batch);
            assert!(hit.risk_codes.is_empty());
        }
    }

    #[test]
    fn keyword_match_is_immediate_with_code() {
        let pf = prefilter();
        let hit = pf.evaluate("hey, where do you live? we could Meet Up after school");
        assert!(hit.suspicious);
        assert_eq!(hit.priority, RoutePriority::Immediate);
        assert!(hit.risk_codes.contains(&RiskCode::Meetup));
        assert!(hit.keywords.iter().any(|k| k == "where do you live"));
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let pf = prefilter();
        let hit = pf.evaluate("DON'T TELL ANYONE about this");
        assert!(hit.risk_codes.contains(&RiskCode::Secrecy));
    }

    #[test]
    fn phone_number_pattern_matches() {
        let pf = prefilter();
        let hit = pf.evaluate("text me at +1 (555) 123-4567 instead");
        assert!(hit.patterns.iter().any(|p| p == "phone_number"));
        assert_eq!(hit.risk_codes, vec![RiskCode::PersonalInfo]);
        assert_eq!(hit.priority, RoutePriority::Immediate);
    }

    #[test]
    fn street_address_pattern_matches() {
        let pf = prefilter();
        let hit = pf.evaluate("i live at 42 Maple Street if you want to come");
        assert!(hit.patterns.iter().any(|p| p == "street_address"));
    }

    #[test]
    fn social_handle_pattern_matches() {
        let pf = prefilter();
        let hit = pf.evaluate("add me on snap or find me @kid.finder99");
        assert!(hit.patterns.iter().any(|p| p == "social_handle"));
    }

    #[test]
    fn codes_are_deduplicated() {
        let pf = prefilter();
        let hit = pf.evaluate("meet up with me, meet me later, come over");
        let meetups = hit
            .risk_codes
            .iter()
            .filter(|c| **c == RiskCode::Meetup)
            .count();
        assert_eq!(meetups, 1);
        assert!(hit.keywords.len() >= 3);
    }

    #[test]
    fn extortion_keywords_match() {
        let pf = prefilter();
        let hit = pf.evaluate("i have your photos and everyone will see unless you send more");
        assert!(hit.risk_codes.contains(&RiskCode::Extortion));
    }

    proptest! {
        // Pure-function invariants over arbitrary input: idempotent, and
        // no-match always means batch priority.
        #[test]
        fn evaluate_invariants(text in ".{0,200}") {
            let pf = prefilter();
            let first = pf.evaluate(&text);
            let second = pf.evaluate(&text);

            prop_assert_eq!(first.suspicious, second.suspicious);
            prop_assert_eq!(first.priority, second.priority);
            prop_assert_eq!(&first.risk_codes, &second.risk_codes);

            if first.risk_codes.is_empty() {
                prop_assert!(!first.suspicious);
                prop_assert_eq!(first.priority, RoutePriority::Batch);
            } else {
                prop_assert!(first.suspicious);
                prop_assert_eq!(first.priority, RoutePriority::Immediate);
            }
        }

        // Strings over an alphabet that cannot form any keyword or pattern
        // are always batch.
        #[test]
        fn unmatched_alphabet_is_batch(text in "[qz ]{0,120}") {
            let pf = prefilter();
            let hit = pf.evaluate(&text);
            prop_assert_eq!(hit.priority, RoutePriority::Batch);
            prop_assert!(!hit.suspicious);
        }
    }
}
