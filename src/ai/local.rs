use std::sync::Arc;

use crate::knowledge::{KnowledgeBase, QaEntry};

/// Minimum score an entry needs before it is offered as an answer
pub const MIN_SCORE: u32 = 4;

const KEYWORD_WEIGHT: u32 = 2;
const QUESTION_WEIGHT: u32 = 3;
const ANSWER_WEIGHT: u32 = 1;

/// Best knowledge-base entry for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMatch<'a> {
    pub category: &'a str,
    pub entry: &'a QaEntry,
    pub score: u32,
}

/// Lowercases, drops everything outside `[a-z0-9\s/]` and keeps words longer than one character.
/// Repeated words are kept; each occurrence is scored.
pub fn tokenize(query: &str) -> Vec<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '/')
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| w.len() > 1)
        .map(str::to_string)
        .collect()
}

/// Offline keyword matcher over the knowledge base.
#[derive(Debug, Clone)]
pub struct LocalMatcher {
    knowledge: Arc<KnowledgeBase>,
}

impl LocalMatcher {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn search(&self, query: &str) -> Option<LocalMatch<'_>> {
        search(&self.knowledge, query)
    }
}

/// Scores every entry of every section that shares a keyword with the query.
/// Entries of sections without keyword overlap are never considered, whatever their text.
pub fn search<'a>(knowledge: &'a KnowledgeBase, query: &str) -> Option<LocalMatch<'a>> {
    let words = tokenize(query);
    if words.is_empty() {
        return None;
    }

    let mut best: Option<LocalMatch<'a>> = None;

    for section in knowledge.sections() {
        let section_score = KEYWORD_WEIGHT * keyword_hits(&words, &section.keywords);
        if section_score == 0 {
            continue;
        }

        for entry in &section.qa {
            let q_lower = entry.q.to_lowercase();
            let a_lower = entry.a.to_lowercase();

            let mut score = section_score;
            for word in &words {
                if q_lower.contains(word.as_str()) {
                    score += QUESTION_WEIGHT;
                }
                if a_lower.contains(word.as_str()) {
                    score += ANSWER_WEIGHT;
                }
            }

            // strict: the first entry reaching a score keeps it
            if score > best.map_or(0, |b| b.score) {
                best = Some(LocalMatch {
                    category: &section.category,
                    entry,
                    score,
                });
            }
        }
    }

    best.filter(|b| b.score >= MIN_SCORE)
}

/// Number of (word, keyword) pairs where one contains the other
fn keyword_hits(words: &[String], keywords: &[String]) -> u32 {
    let mut hits = 0;
    for word in words {
        for kw in keywords {
            if kw.contains(word.as_str()) || word.contains(kw.as_str()) {
                hits += 1;
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeSection;

    fn section(category: &str, keywords: &[&str], qa: &[(&str, &str)]) -> KnowledgeSection {
        KnowledgeSection {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            qa: qa
                .iter()
                .map(|(q, a)| QaEntry {
                    q: q.to_string(),
                    a: a.to_string(),
                })
                .collect(),
        }
    }

    fn civil_documents() -> KnowledgeBase {
        KnowledgeBase::new(vec![section(
            "Civil Documents",
            &["birth", "certificate", "registration"],
            &[(
                "How to obtain a birth certificate?",
                "Visit your local Divisional Secretariat...",
            )],
        )])
    }

    #[test]
    fn tokenize_strips_punctuation_and_short_words() {
        assert_eq!(
            tokenize("How do I get a birth-certificate?!"),
            vec!["how", "do", "get", "birthcertificate"]
        );
        assert_eq!(tokenize("A/L results 2024"), vec!["a/l", "results", "2024"]);
        assert_eq!(tokenize("  NIC   nic "), vec!["nic", "nic"]);
        assert!(tokenize("a b c ! ?").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("සිංහල").is_empty());
    }

    #[test]
    fn short_or_empty_query_never_matches() {
        let kb = civil_documents();
        assert!(search(&kb, "").is_none());
        assert!(search(&kb, "   \t ").is_none());
        assert!(search(&kb, "a i ?").is_none());
    }

    #[test]
    fn birth_certificate_question_finds_entry() {
        let kb = civil_documents();
        let hit = search(&kb, "how do I get a birth certificate").unwrap();

        assert_eq!(hit.category, "Civil Documents");
        assert_eq!(hit.entry.q, "How to obtain a birth certificate?");
        // keywords: birth + certificate = 4, question: how + birth + certificate = 9
        assert_eq!(hit.score, 13);
    }

    #[test]
    fn section_without_keyword_overlap_is_unreachable() {
        let kb = KnowledgeBase::new(vec![section(
            "Passports",
            &["passport"],
            &[("Where do I pay the water bill?", "Pay the water bill at NWSDB.")],
        )]);

        assert!(search(&kb, "where do I pay the water bill").is_none());
    }

    #[test]
    fn score_below_threshold_is_rejected() {
        // one keyword hit (2) plus one answer hit (1) = 3
        let kb = KnowledgeBase::new(vec![section(
            "Health",
            &["clinic"],
            &[("Opening hours?", "The clinic opens at 8.")],
        )]);

        assert!(search(&kb, "clinic").is_none());
    }

    #[test]
    fn keyword_containment_works_both_ways() {
        let kb = KnowledgeBase::new(vec![section(
            "Vehicles",
            &["licence"],
            &[("Renewals", "Renew online.")],
        )]);

        // "licences" contains "licence", and "licence" contains "lic"
        let hit = search(&kb, "licences lic").unwrap();
        assert_eq!(hit.score, 4);
    }

    #[test]
    fn first_maximum_wins_ties() {
        let kb = KnowledgeBase::new(vec![
            section("First", &["tax"], &[("tax rates", "-"), ("tax rates", "-")]),
            section("Second", &["tax"], &[("tax rates", "-")]),
        ]);

        let hit = search(&kb, "tax").unwrap();
        assert_eq!(hit.category, "First");
        assert!(std::ptr::eq(hit.entry, &kb.sections()[0].qa[0]));
    }

    #[test]
    fn higher_scoring_later_section_wins() {
        let kb = KnowledgeBase::new(vec![
            section("Water", &["water"], &[("Water cuts", "Call 1939.")]),
            section(
                "Electricity",
                &["power", "outage", "electricity"],
                &[("Who do I contact about a power outage?", "Call 1987.")],
            ),
        ]);

        let hit = search(&kb, "water power outage").unwrap();
        assert_eq!(hit.category, "Electricity");
    }

    #[test]
    fn repeated_words_count_each_time() {
        let kb = KnowledgeBase::new(vec![section("Tax", &["tax"], &[("Rates", "-")])]);

        assert!(search(&kb, "tax").is_none());
        assert_eq!(search(&kb, "tax tax").unwrap().score, 4);
    }

    #[test]
    fn search_is_deterministic() {
        let kb = KnowledgeBase::builtin().unwrap();
        let matcher = LocalMatcher::new(Arc::new(kb));
        for query in ["how do I get a birth certificate", "power outage", "hello there"] {
            assert_eq!(matcher.search(query), matcher.search(query));
        }
    }
}
