//! Keyword and family indices backing category suggestions.
//!
//! Both indices are derived data: they are rebuilt in full from the live
//! document after every structural mutation, and are never authoritative.

use std::collections::{
  HashMap,
  HashSet,
};

use crate::{
  document::Document,
  element::base_name,
};

/// Score bonus per existing same-family item in a category.
const FAMILY_MATCH_BONUS: f64 = 5.0;
/// Weight of a whole-base-name keyword hit; individual word tokens weigh 1.
const FULL_NAME_WEIGHT: f64 = 5.0;

/// Inverted keyword index plus family (suffix-token) index.
#[derive(Debug, Default)]
pub struct SuggestionIndex {
  /// lowercase word token -> category keys whose items contain it
  keywords: HashMap<String, HashSet<String>>,
  /// family key -> category key -> occurrence count
  families: HashMap<String, HashMap<String, usize>>,
}

impl SuggestionIndex {
  pub fn build(document: &Document) -> Self {
    let mut index = Self::default();
    for property in document.properties() {
      let key = property.key();
      for item in property.items() {
        for word in words(item) {
          index
            .keywords
            .entry(word)
            .or_default()
            .insert(key.to_string());
        }
        if let Some(family) = family_key(base_name(item)) {
          *index
            .families
            .entry(family.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert(0) += 1;
        }
      }
    }
    index
  }

  pub fn is_empty(&self) -> bool {
    self.keywords.is_empty()
  }

  /// Scores candidate categories for the given new item names.
  ///
  /// Scores are normalized against the maximum so the top category lands on
  /// 1.0; ties break on ascending category key. Empty input or an empty
  /// index yields an empty list.
  pub fn suggest(&self, names: &[String]) -> Vec<(String, f64)> {
    if names.is_empty() || self.keywords.is_empty() {
      return Vec::new();
    }

    let mut scores: HashMap<String, f64> = HashMap::new();
    for name in names {
      let base = base_name(name);

      let mut keywords: HashSet<String> = base
        .replace('_', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect();
      keywords.insert(base.to_string());
      for keyword in &keywords {
        let weight = if keyword == base { FULL_NAME_WEIGHT } else { 1.0 };
        if let Some(categories) = self.keywords.get(keyword) {
          for key in categories {
            *scores.entry(key.clone()).or_insert(0.0) += weight;
          }
        }
      }

      if let Some(family) = base.rsplit('_').next() {
        if let Some(counts) = self.families.get(family) {
          for (key, count) in counts {
            *scores.entry(key.clone()).or_insert(0.0) += *count as f64 * FAMILY_MATCH_BONUS;
          }
        }
      }
    }

    if scores.is_empty() {
      return Vec::new();
    }
    let max = scores.values().fold(0.0_f64, |best, &score| best.max(score));
    let mut suggestions: Vec<(String, f64)> = scores
      .into_iter()
      .map(|(key, score)| {
        let normalized = if max > 0.0 { score / max } else { 0.0 };
        (key, normalized)
      })
      .collect();
    suggestions.sort_by(|a, b| {
      b.1
        .partial_cmp(&a.1)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
    });
    suggestions
  }
}

/// Flat existence sets for O(1) item checks across the whole document.
#[derive(Debug, Default)]
pub struct LookupSets {
  items:      HashSet<String>,
  base_names: HashSet<String>,
}

/// Classification of a would-be new item against the loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
  /// The exact item string is already present somewhere.
  Exists,
  /// Unknown as-is, but its base name is known under another namespace or
  /// state.
  Partial,
  /// Entirely unknown.
  New,
}

impl LookupSets {
  pub fn build(document: &Document) -> Self {
    let mut sets = Self::default();
    for property in document.properties() {
      for item in property.items() {
        sets.items.insert(item.to_string());
        sets.base_names.insert(base_name(item).to_string());
      }
    }
    sets
  }

  pub fn classify(&self, item: &str) -> Existence {
    if self.items.contains(item) {
      return Existence::Exists;
    }
    if self.base_names.contains(base_name(item)) {
      return Existence::Partial;
    }
    Existence::New
  }
}

/// Lowercase word tokens of an item string, split at every non-alphanumeric
/// boundary (underscores included).
fn words(item: &str) -> Vec<String> {
  item
    .to_lowercase()
    .split(|c: char| !c.is_alphanumeric())
    .filter(|word| !word.is_empty())
    .map(str::to_string)
    .collect()
}

/// The family key of a base name: its last underscore token, rejected when
/// numeric or shorter than three characters.
fn family_key(base: &str) -> Option<&str> {
  let family = match base.rsplit('_').next() {
    Some(family) => family,
    None => base,
  };
  (family.len() > 2 && !family.chars().all(|c| c.is_ascii_digit())).then_some(family)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse;

  fn document(text: &str) -> Document {
    Document::new(parse(text))
  }

  #[test]
  fn unique_family_owner_scores_one() {
    let doc = document(
      "block.10=minecraft:birch_stairs minecraft:spruce_stairs\nblock.20=stone dirt\n",
    );
    let index = SuggestionIndex::build(&doc);
    let suggestions = index.suggest(&["oak_stairs".to_string()]);
    assert_eq!(suggestions[0].0, "block.10");
    assert!((suggestions[0].1 - 1.0).abs() < f64::EPSILON);
  }

  #[test]
  fn whole_name_match_outweighs_word_overlap() {
    let doc = document("block.1=stone_wall\nblock.2=wallpaper stone dirt gravel\n");
    let index = SuggestionIndex::build(&doc);
    let suggestions = index.suggest(&["stone_wall".to_string()]);
    assert_eq!(suggestions[0].0, "block.1");
    assert!((suggestions[0].1 - 1.0).abs() < f64::EPSILON);
  }

  #[test]
  fn ties_break_on_ascending_key() {
    let doc = document("block.2=red_sand\nblock.1=red_sand\n");
    let index = SuggestionIndex::build(&doc);
    let suggestions = index.suggest(&["sand".to_string()]);
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].0, "block.1");
    assert_eq!(suggestions[1].0, "block.2");
  }

  #[test]
  fn empty_input_and_empty_index_yield_nothing() {
    let doc = document("block.1=stone\n");
    let index = SuggestionIndex::build(&doc);
    assert!(index.suggest(&[]).is_empty());

    let empty = SuggestionIndex::default();
    assert!(empty.suggest(&["stone".to_string()]).is_empty());
  }

  #[test]
  fn family_keys_reject_numbers_and_short_tokens() {
    assert_eq!(family_key("oak_stairs"), Some("stairs"));
    assert_eq!(family_key("cut_copper_2"), None);
    assert_eq!(family_key("block_of"), None);
    assert_eq!(family_key("ore"), Some("ore"));
  }

  #[test]
  fn existence_classification() {
    let doc = document("block.1=minecraft:oak_stairs mod:stone\n");
    let sets = LookupSets::build(&doc);
    assert_eq!(sets.classify("minecraft:oak_stairs"), Existence::Exists);
    assert_eq!(
      sets.classify("other:oak_stairs[facing=north]"),
      Existence::Partial
    );
    assert_eq!(sets.classify("minecraft:warped_door"), Existence::New);
  }

  #[test]
  fn state_words_index_back_to_their_category() {
    let doc = document("block.7=minecraft:oak_door[half=upper]\n");
    let index = SuggestionIndex::build(&doc);
    let suggestions = index.suggest(&["iron_door".to_string()]);
    assert_eq!(suggestions[0].0, "block.7");
  }
}
