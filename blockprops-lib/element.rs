//! Typed file elements: the building blocks of a properties document.
//!
//! A document is an ordered sequence of [`Element`]s, and that order is the
//! save order. Only [`Property`] carries structured data; every other
//! variant stores its original line verbatim and passes through
//! serialization untouched.
//!
//! # Raw-text preservation
//!
//! A parsed property keeps the exact source text of its value (continuation
//! backslashes and whitespace included) and serializes it back unchanged
//! until the first structural mutation. Adding or reordering items switches
//! the value to canonical reconstruction permanently; the transition is
//! one-directional.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{
  Deserialize,
  Serialize,
};

/// Namespace used for items without an explicit `mod:` prefix, and for the
/// first physical line of every property value.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Column budget for canonically reconstructed value lines.
const MAX_VALUE_WIDTH: usize = 120;

/// One line (or continued line group) of a properties file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
  /// A `#`-prefixed line, stored verbatim. Lines the parser cannot classify
  /// are preserved here as well, wrapped with an `# [UNPARSED]` marker.
  Comment(String),
  /// A blank (whitespace-only) line, stored verbatim.
  EmptyLine(String),
  /// A preprocessor directive (`#ifdef`, `#ifndef`, `#else`, `#endif`,
  /// `#define`), stored verbatim.
  Directive(String),
  /// A `key=value` entry, possibly spanning several continued lines.
  Property(Property),
}

impl Element {
  /// The element's string form for saving, without a trailing newline.
  pub fn to_text(&self) -> String {
    match self {
      Element::Comment(content) => content.clone(),
      Element::EmptyLine(content) => content.clone(),
      Element::Directive(content) => content.clone(),
      Element::Property(property) => property.to_text(),
    }
  }

  pub fn as_property(&self) -> Option<&Property> {
    match self {
      Element::Property(property) => Some(property),
      _ => None,
    }
  }

  pub fn as_property_mut(&mut self) -> Option<&mut Property> {
    match self {
      Element::Property(property) => Some(property),
      _ => None,
    }
  }
}

/// How a property's value serializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum ValueRepr {
  /// The exact text that followed `key=` in the source, embedded
  /// backslash-newline continuations included.
  Verbatim(String),
  /// Regenerate canonically from the item groups.
  Reconstructed,
}

/// A single `key=value` property grouping all items of one category.
///
/// Items are held in namespace groups that preserve the original line
/// grouping of the file: the first physical line is the `minecraft` group,
/// and each continuation line is grouped under the namespace prefix of its
/// first token. The flat item set mirrors the groups and is duplicate-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
  key:    String,
  groups: IndexMap<String, Vec<String>>,
  items:  HashSet<String>,
  repr:   ValueRepr,
}

impl Property {
  /// An empty property serializing as `key=`.
  pub fn empty(key: impl Into<String>) -> Self {
    Self {
      key:    key.into(),
      groups: IndexMap::new(),
      items:  HashSet::new(),
      repr:   ValueRepr::Reconstructed,
    }
  }

  /// Builds a property from a processed (continuation-free) value, keeping
  /// `raw` as the verbatim serialization until the first mutation.
  ///
  /// Duplicate tokens across the whole value are dropped silently.
  pub(crate) fn from_processed(key: String, processed: &str, raw: Option<String>) -> Self {
    let mut property = Self {
      key,
      groups: IndexMap::new(),
      items: HashSet::new(),
      repr: match raw {
        Some(raw) => ValueRepr::Verbatim(raw),
        None => ValueRepr::Reconstructed,
      },
    };

    for (line_no, line) in processed.split('\n').enumerate() {
      let mut tokens = line.split_whitespace().peekable();
      let Some(first) = tokens.peek() else {
        continue;
      };
      // Line 0 is always the default group; later lines follow their first
      // token's namespace prefix.
      let namespace = if line_no == 0 {
        DEFAULT_NAMESPACE.to_string()
      } else {
        namespace_of(first).to_string()
      };
      for token in tokens {
        if !property.insert_item(token, &namespace) {
          log::debug!(
            "duplicate item '{token}' dropped while parsing '{}'",
            property.key
          );
        }
      }
    }

    property
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  /// All items in group order, flattened.
  pub fn items(&self) -> impl Iterator<Item = &str> {
    self.groups.values().flatten().map(String::as_str)
  }

  /// The namespace groups in stored (file) order.
  pub fn groups(&self) -> &IndexMap<String, Vec<String>> {
    &self.groups
  }

  pub fn item_count(&self) -> usize {
    self.items.len()
  }

  pub fn contains(&self, item: &str) -> bool {
    self.items.contains(item)
  }

  /// Whether the property still serializes its original source text.
  pub fn is_verbatim(&self) -> bool {
    matches!(self.repr, ValueRepr::Verbatim(_))
  }

  fn insert_item(&mut self, item: &str, namespace: &str) -> bool {
    if self.items.contains(item) {
      return false;
    }
    self
      .groups
      .entry(namespace.to_string())
      .or_default()
      .push(item.to_string());
    self.items.insert(item.to_string());
    true
  }

  /// Adds `item` to the given namespace group. Adding an already-present
  /// item is a no-op. Any successful add invalidates the verbatim value for
  /// good.
  pub fn add_item(&mut self, item: &str, namespace: &str) -> bool {
    if !self.insert_item(item, namespace) {
      return false;
    }
    self.repr = ValueRepr::Reconstructed;
    true
  }

  /// Sorts every namespace group lexicographically and invalidates the
  /// verbatim value.
  pub fn sort_items(&mut self) {
    for items in self.groups.values_mut() {
      items.sort();
    }
    self.repr = ValueRepr::Reconstructed;
  }

  /// The property's string form for saving.
  ///
  /// Verbatim values come back byte-for-byte as read. Reconstructed values
  /// are space-joined per group, wrapped at the column budget, and joined
  /// with a continuation backslash plus one leading space per follow-up
  /// line.
  pub fn to_text(&self) -> String {
    if let ValueRepr::Verbatim(raw) = &self.repr {
      return format!("{}={}", self.key, raw);
    }

    let lines = self.wrap_groups();
    if lines.is_empty() {
      return format!("{}=", self.key);
    }
    format!("{}={}", self.key, lines.join(" \\\n "))
  }

  fn wrap_groups(&self) -> Vec<String> {
    let mut lines = Vec::new();
    for items in self.groups.values() {
      let mut current = String::new();
      for item in items {
        if !current.is_empty() && current.len() + item.len() + 1 > MAX_VALUE_WIDTH {
          lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
          current.push(' ');
        }
        current.push_str(item);
      }
      if !current.is_empty() {
        lines.push(current);
      }
    }
    lines
  }
}

/// The namespace prefix of an item, or [`DEFAULT_NAMESPACE`] when the item
/// carries none.
pub fn namespace_of(item: &str) -> &str {
  match item.split_once(':') {
    Some((namespace, _)) => namespace,
    None => DEFAULT_NAMESPACE,
  }
}

/// The bare base name of an item: the part after the last namespace colon,
/// with any bracketed state suffix removed.
///
/// `minecraft:oak_stairs[facing=north]` yields `oak_stairs`.
pub fn base_name(item: &str) -> &str {
  let tail = match item.rsplit_once(':') {
    Some((_, tail)) => tail,
    None => item,
  };
  match tail.split_once('[') {
    Some((base, _)) => base,
    None => tail,
  }
}

/// The namespace-qualified base name of an item: bracketed state removed,
/// colon segments taken until one carries a `key=value` blockstate.
///
/// `minecraft:stone:variant=granite` yields `minecraft:stone`. The result
/// is empty when the very first segment is a blockstate.
pub fn qualified_base_name(item: &str) -> String {
  let no_state = match item.split_once('[') {
    Some((head, _)) => head,
    None => item,
  };
  let mut parts = Vec::new();
  for part in no_state.split(':') {
    if part.contains('=') {
      break;
    }
    parts.push(part);
  }
  parts.join(":")
}

/// The template base name used by variant propagation: bracketed state
/// removed, then the first two colon segments (`namespace:basename`).
pub fn template_base_name(item: &str) -> String {
  let no_state = match item.split_once('[') {
    Some((head, _)) => head,
    None => item,
  };
  let mut segments = no_state.splitn(3, ':');
  match (segments.next(), segments.next()) {
    (Some(first), Some(second)) => format!("{first}:{second}"),
    (Some(first), None) => first.to_string(),
    _ => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use quickcheck::quickcheck;

  use super::*;

  #[test]
  fn verbatim_until_first_edit() {
    let mut property = Property::from_processed(
      "block.8".to_string(),
      "grass_block dirt",
      Some("grass_block dirt".to_string()),
    );
    assert!(property.is_verbatim());
    assert_eq!(property.to_text(), "block.8=grass_block dirt");

    // duplicate add keeps the verbatim value
    assert!(!property.add_item("dirt", "minecraft"));
    assert!(property.is_verbatim());

    assert!(property.add_item("mod:mud", "mod"));
    assert!(!property.is_verbatim());
    assert_eq!(property.to_text(), "block.8=grass_block dirt \\\n mod:mud");
  }

  #[test]
  fn parse_groups_by_line_namespace() {
    let property = Property::from_processed(
      "block.10".to_string(),
      "oak_stairs birch_stairs\nbyg:aspen_stairs byg:fir_stairs\nspruce_stairs",
      None,
    );
    let group_names: Vec<&String> = property.groups().keys().collect();
    assert_eq!(group_names, ["minecraft", "byg"]);
    assert_eq!(property.groups()["minecraft"], [
      "oak_stairs",
      "birch_stairs",
      "spruce_stairs"
    ]);
    assert_eq!(property.groups()["byg"], [
      "byg:aspen_stairs",
      "byg:fir_stairs"
    ]);
  }

  #[test]
  fn duplicates_dropped_across_groups() {
    let property = Property::from_processed(
      "block.1".to_string(),
      "stone\nmod:stone stone",
      None,
    );
    assert_eq!(property.item_count(), 2);
    assert_eq!(property.groups()["mod"], ["mod:stone"]);
  }

  #[test]
  fn empty_property_serializes_bare_key() {
    assert_eq!(Property::empty("block.99").to_text(), "block.99=");
  }

  #[test]
  fn sort_is_per_group() {
    let mut property = Property::from_processed(
      "block.2".to_string(),
      "c b a\nmod:z mod:a",
      None,
    );
    property.sort_items();
    assert_eq!(property.groups()["minecraft"], ["a", "b", "c"]);
    assert_eq!(property.groups()["mod"], ["mod:a", "mod:z"]);
  }

  #[test]
  fn long_groups_wrap_at_budget() {
    let mut property = Property::empty("block.3");
    for index in 0..40 {
      property.add_item(&format!("some_rather_long_block_name_{index}"), "minecraft");
    }
    let text = property.to_text();
    let value = text.strip_prefix("block.3=").unwrap();
    for line in value.split(" \\\n ") {
      assert!(line.len() <= MAX_VALUE_WIDTH, "overlong line: {line:?}");
    }
    // nothing lost in the wrap
    assert_eq!(value.split_whitespace().filter(|t| *t != "\\").count(), 40);
  }

  #[test]
  fn name_helpers() {
    assert_eq!(namespace_of("minecraft:stone"), "minecraft");
    assert_eq!(namespace_of("stone"), "minecraft");
    assert_eq!(base_name("minecraft:oak_stairs[facing=north]"), "oak_stairs");
    assert_eq!(base_name("oak_stairs"), "oak_stairs");
    assert_eq!(
      qualified_base_name("minecraft:stone:variant=granite"),
      "minecraft:stone"
    );
    assert_eq!(
      qualified_base_name("minecraft:oak_stairs[facing=north]"),
      "minecraft:oak_stairs"
    );
    assert_eq!(
      template_base_name("minecraft:andesite_wall[north=tall]"),
      "minecraft:andesite_wall"
    );
    assert_eq!(template_base_name("andesite_wall"), "andesite_wall");
  }

  quickcheck! {
    fn wrapped_lines_hold_budget_or_single_item(tokens: Vec<String>) -> bool {
      let mut property = Property::empty("block.1");
      for (index, raw) in tokens.iter().enumerate() {
        let token: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if token.is_empty() {
          continue;
        }
        property.add_item(&format!("mod{}:{token}", index % 3), "minecraft");
      }
      let text = property.to_text();
      let Some(value) = text.strip_prefix("block.1=") else {
        return false;
      };
      value
        .split(" \\\n ")
        .all(|line| line.len() <= MAX_VALUE_WIDTH || !line.contains(' '))
    }
  }
}
