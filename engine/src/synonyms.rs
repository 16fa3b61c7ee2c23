use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Canonical key -> alias set, with a reverse alias -> canonical map built at
/// construction so resolution is a pair of hash lookups instead of a table
/// scan.
///
/// Keys and aliases are lowercased on construction; `resolve` is
/// case-insensitive and matches whole tokens only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, BTreeSet<String>>")]
#[serde(into = "BTreeMap<String, BTreeSet<String>>")]
pub struct SynonymTable {
    canonical: BTreeMap<String, BTreeSet<String>>,
    reverse: HashMap<String, String>,
}

impl SynonymTable {
    pub fn new(entries: BTreeMap<String, BTreeSet<String>>) -> Self {
        let canonical: BTreeMap<String, BTreeSet<String>> = entries
            .into_iter()
            .map(|(key, aliases)| {
                (
                    key.trim().to_lowercase(),
                    aliases.iter().map(|a| a.trim().to_lowercase()).collect(),
                )
            })
            .collect();
        let mut reverse = HashMap::new();
        for (key, aliases) in &canonical {
            for alias in aliases {
                reverse.insert(alias.clone(), key.clone());
            }
        }
        SynonymTable { canonical, reverse }
    }

    /// Map a token to its canonical key: either the token is a key itself or
    /// it appears in some key's alias set. No partial matching.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        let t = token.trim().to_lowercase();
        if let Some((key, _)) = self.canonical.get_key_value(&t) {
            return Some(key.as_str());
        }
        self.reverse.get(&t).map(String::as_str)
    }

    /// The canonical -> aliases mapping, as serialized to disk.
    pub fn entries(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.canonical
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl PartialEq for SynonymTable {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl From<BTreeMap<String, BTreeSet<String>>> for SynonymTable {
    fn from(entries: BTreeMap<String, BTreeSet<String>>) -> Self {
        SynonymTable::new(entries)
    }
}

impl From<SynonymTable> for BTreeMap<String, BTreeSet<String>> {
    fn from(table: SynonymTable) -> Self {
        table.canonical
    }
}

/// Built-in origin alias table, used when the operator supplies none.
pub fn default_origin_synonyms() -> SynonymTable {
    let entries: &[(&str, &[&str])] = &[
        ("united states", &["usa", "us", "america", "american"]),
        ("united kingdom", &["uk", "britain", "great britain", "british"]),
        ("germany", &["deutschland", "german"]),
        ("france", &["french"]),
        ("italy", &["italian"]),
        ("china", &["prc", "chinese"]),
        ("japan", &["japanese"]),
        ("south korea", &["korea", "korean"]),
    ];
    SynonymTable::new(
        entries
            .iter()
            .map(|(key, aliases)| {
                (
                    key.to_string(),
                    aliases.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_alias_to_canonical() {
        let table = default_origin_synonyms();
        assert_eq!(table.resolve("usa"), Some("united states"));
        assert_eq!(table.resolve("america"), Some("united states"));
    }

    #[test]
    fn resolves_canonical_to_itself() {
        let table = default_origin_synonyms();
        assert_eq!(table.resolve("germany"), Some("germany"));
    }

    #[test]
    fn resolution_is_case_insensitive_and_trimmed() {
        let table = default_origin_synonyms();
        assert_eq!(table.resolve("  USA "), Some("united states"));
        assert_eq!(table.resolve("Britain"), Some("united kingdom"));
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let table = default_origin_synonyms();
        assert_eq!(table.resolve("atlantis"), None);
        // no substring matching
        assert_eq!(table.resolve("us-east"), None);
    }
}
