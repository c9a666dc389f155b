use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Knowledge base shipped with the binary
const BUILTIN_KNOWLEDGE: &str = include_str!("../data/srilanka_gov_knowledge.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaEntry {
    pub q: String,
    pub a: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSection {
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub qa: Vec<QaEntry>,
}

/// Read-only list of topic sections used for offline answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    sections: Vec<KnowledgeSection>,
}

impl KnowledgeBase {
    pub fn new(sections: Vec<KnowledgeSection>) -> Self {
        Self { sections }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let sections: Vec<KnowledgeSection> =
            serde_json::from_str(json).context("knowledge base is not valid JSON")?;
        Ok(Self::new(sections))
    }

    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_KNOWLEDGE).context("built-in knowledge base is broken")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read knowledge base {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Resolves the knowledge base: explicit path, then the user config dir, then the built-in copy.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let kb = Self::from_file(path)?;
            log::info!("📚 Knowledge base loaded from {} ({} sections)", path.display(), kb.len());
            return Ok(kb);
        }

        if let Some(path) = user_knowledge_path().filter(|p| p.is_file()) {
            let kb = Self::from_file(&path)?;
            log::info!("📚 Knowledge base loaded from {} ({} sections)", path.display(), kb.len());
            return Ok(kb);
        }

        let kb = Self::builtin()?;
        log::info!("📚 Using built-in knowledge base ({} sections)", kb.len());
        Ok(kb)
    }

    pub fn sections(&self) -> &[KnowledgeSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Category names in file order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.category.as_str())
    }

    /// Categories joined for display, e.g. "Civil Documents, Passports"
    pub fn topics(&self) -> String {
        self.categories().collect::<Vec<_>>().join(", ")
    }
}

/// `<config dir>/civiresolve/knowledge.json`
pub fn user_knowledge_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("civiresolve").join("knowledge.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_knowledge_parses() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(!kb.is_empty());
        assert!(kb.categories().any(|c| c == "Civil Documents"));
        for section in kb.sections() {
            assert!(!section.keywords.is_empty(), "{} has no keywords", section.category);
            assert!(!section.qa.is_empty(), "{} has no entries", section.category);
        }
    }

    #[test]
    fn topics_are_joined_in_order() {
        let kb = KnowledgeBase::from_json(
            r#"[{"category":"A","keywords":["a"],"qa":[]},
                {"category":"B","keywords":["b"],"qa":[]}]"#,
        )
        .unwrap();
        assert_eq!(kb.topics(), "A, B");
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let kb = KnowledgeBase::from_json(r#"[{"category":"Bare"}]"#).unwrap();
        assert!(kb.sections()[0].keywords.is_empty());
        assert!(kb.sections()[0].qa.is_empty());
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"category":"Water","keywords":["water"],"qa":[{{"q":"Who?","a":"NWSDB."}}]}}]"#
        )
        .unwrap();

        let kb = KnowledgeBase::load(Some(file.path())).unwrap();
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.sections()[0].qa[0].a, "NWSDB.");
    }

    #[test]
    fn bad_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(KnowledgeBase::from_file(file.path()).is_err());
        assert!(KnowledgeBase::from_file(Path::new("/definitely/missing.json")).is_err());
    }
}
