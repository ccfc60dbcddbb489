//! The orchestrator: owns the live document, the undo history, and the
//! derived indices, and exposes every mutation the shell is allowed to
//! perform.
//!
//! # Design
//!
//! - Two documents: `original` is an immutable snapshot from load,
//!   `modified` is the live copy. Undo/redo swaps `modified` wholesale.
//! - Every mutating operation records a snapshot *before* touching state,
//!   and discards it again when nothing actually changed, so history never
//!   carries no-op entries and a failed attempt cannot leave a half-mutated
//!   document behind.
//! - Precondition failures (missing category, duplicate create, empty
//!   history) are no-ops with a logged diagnostic, never errors.
//! - Indices are rebuilt in full after every structural change; they are
//!   derived data and never authoritative.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{
  info,
  warn,
};
use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  automap::MappedItem,
  document::Document,
  element::{
    self,
    Element,
    Property,
  },
  history::History,
  parser,
  suggest::{
    Existence,
    LookupSets,
    SuggestionIndex,
  },
};

/// Result of applying auto-mapped items: what went in, and what fell
/// through with a reason per item.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
  pub applied:  Vec<String>,
  pub unmapped: Vec<(String, String)>,
}

/// The single mutable owner of a document session.
///
/// Not internally synchronized: callers wanting background execution run
/// whole operations on another execution context and marshal results back.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manager {
  original: Option<Document>,
  modified: Option<Document>,
  history:  History,
  #[serde(skip)]
  suggestions: SuggestionIndex,
  #[serde(skip)]
  lookup: LookupSets,
}

impl Manager {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parses `text` and replaces the whole session state: both documents,
  /// history, and indices. Returns false (leaving prior state untouched)
  /// when parsing yields no elements.
  pub fn load_text(&mut self, text: &str) -> bool {
    let elements = parser::parse(text);
    if elements.is_empty() {
      return false;
    }
    let original = Document::new(elements);
    self.modified = Some(original.clone());
    self.original = Some(original);
    self.history.clear();
    self.rebuild_indices();
    true
  }

  pub fn is_loaded(&self) -> bool {
    self.modified.is_some()
  }

  pub fn original(&self) -> Option<&Document> {
    self.original.as_ref()
  }

  pub fn modified(&self) -> Option<&Document> {
    self.modified.as_ref()
  }

  /// Rebuilds every derived index from the modified document. This is the
  /// postcondition of all mutating operations, and must also run after
  /// restoring a session snapshot (indices are not persisted).
  pub fn rebuild_indices(&mut self) {
    match &self.modified {
      Some(document) => {
        self.suggestions = SuggestionIndex::build(document);
        self.lookup = LookupSets::build(document);
      },
      None => {
        self.suggestions = SuggestionIndex::default();
        self.lookup = LookupSets::default();
      },
    }
  }

  fn push_snapshot(&mut self, description: String) {
    if let Some(document) = &self.modified {
      self.history.push(description, document.clone());
    }
  }

  /// Linear scan for the category named `key`.
  pub fn find_category(&self, key: &str) -> Option<&Property> {
    self.modified.as_ref()?.find_property(key)
  }

  /// Adds `items` to the category named `key`, each under its own namespace
  /// group. Returns false, recording no action, when the category is
  /// missing or every item is already present.
  pub fn add_items(&mut self, items: &[String], key: &str) -> bool {
    let Some(document) = &self.modified else {
      warn!("no document loaded, cannot add items");
      return false;
    };
    let Some(target) = document.find_property(key) else {
      warn!("category '{key}' not found, cannot add items");
      return false;
    };
    if items.iter().all(|item| target.contains(item)) {
      return false;
    }

    self.push_snapshot(format!("Added {} items to '{key}'", items.len()));
    if let Some(target) = self
      .modified
      .as_mut()
      .and_then(|document| document.find_property_mut(key))
    {
      for item in items {
        target.add_item(item, element::namespace_of(item));
      }
    }
    self.rebuild_indices();
    true
  }

  /// Replicates every known state variant of `template_item` across the new
  /// base `items`.
  ///
  /// The whole document is scanned for items starting with the template's
  /// base name; each such variation donates its suffix, and the synthesized
  /// item goes into the category the variation came from (skipped when
  /// already present there). One history entry covers the entire
  /// propagation, and is dropped again when nothing was added anywhere.
  /// Returns true on any partial success.
  pub fn add_items_from_template(&mut self, items: &[String], template_item: &str) -> bool {
    let Some(document) = &self.modified else {
      warn!("no document loaded, cannot apply template");
      return false;
    };
    let base = element::template_base_name(template_item);

    // variations of the template per category, in document order
    let mut variations: IndexMap<String, Vec<String>> = IndexMap::new();
    for property in document.properties() {
      for item in property.items() {
        if item.starts_with(&base) {
          variations
            .entry(property.key().to_string())
            .or_default()
            .push(item.to_string());
        }
      }
    }

    self.push_snapshot(format!(
      "Template: applied '{template_item}' to {} items",
      items.len()
    ));

    let mut added = false;
    if let Some(document) = self.modified.as_mut() {
      for (key, variants) in &variations {
        let Some(target) = document.find_property_mut(key) else {
          continue;
        };
        for variant in variants {
          let Some(suffix) = variant.strip_prefix(&base) else {
            continue;
          };
          for new_base in items {
            let full = format!("{new_base}{suffix}");
            if target.add_item(&full, element::namespace_of(new_base)) {
              added = true;
            }
          }
        }
      }
    }

    if !added {
      self.history.discard_last();
      return false;
    }
    self.rebuild_indices();
    true
  }

  /// Scored category suggestions for a list of new item names. See the
  /// suggestion index for the scoring rules.
  pub fn suggest_categories(&self, names: &[String]) -> Vec<(String, f64)> {
    self.suggestions.suggest(names)
  }

  /// Sorts every namespace group of the category lexicographically. A
  /// missing category leaves no trace in the history.
  pub fn sort_category(&mut self, key: &str) {
    self.push_snapshot(format!("Sorted category '{key}'"));
    match self
      .modified
      .as_mut()
      .and_then(|document| document.find_property_mut(key))
    {
      Some(property) => {
        property.sort_items();
        self.rebuild_indices();
      },
      None => {
        self.history.discard_last();
        warn!("category '{key}' not found for sorting");
      },
    }
  }

  /// Creates an empty category, inserted at the position preserving the
  /// ascending numeric order of trailing key suffixes (`block.5` lands
  /// between `block.3` and `block.10`). Keys without a numeric suffix
  /// append at the end. A blank line follows the new entry unless it is
  /// last. Duplicate keys are a no-op with a diagnostic.
  pub fn create_category(&mut self, key: &str) {
    if self.find_category(key).is_some() {
      info!("category '{key}' already exists");
      return;
    }
    let Some(end) = self.modified.as_ref().map(Document::len) else {
      warn!("no document loaded, cannot create category");
      return;
    };

    self.push_snapshot(format!("Created category '{key}'"));
    let position = self.numeric_insert_position(key).unwrap_or(end);
    if let Some(document) = self.modified.as_mut() {
      document.insert(position, Element::Property(Property::empty(key)));
      if position < document.len() - 1 {
        document.insert(position + 1, Element::EmptyLine(String::new()));
      }
    }
    self.rebuild_indices();
  }

  fn numeric_insert_position(&self, key: &str) -> Option<usize> {
    let document = self.modified.as_ref()?;
    let new_id = trailing_number(key)?;
    for (index, element) in document.elements().iter().enumerate() {
      let Some(property) = element.as_property() else {
        continue;
      };
      if let Some(current) = trailing_number(property.key()) {
        if current > new_id {
          return Some(index);
        }
      }
    }
    None
  }

  /// Serialized before/after texts. The after text is the literal save
  /// payload; there is no separate render path.
  pub fn diff_text(&self) -> (String, String) {
    let before = self
      .original
      .as_ref()
      .map(Document::to_text)
      .unwrap_or_default();
    let after = self
      .modified
      .as_ref()
      .map(Document::to_text)
      .unwrap_or_default();
    (before, after)
  }

  /// Restores the previous document state. No-op with a diagnostic when
  /// the undo stack is empty.
  pub fn undo(&mut self) -> bool {
    let Some(document) = self.modified.as_mut() else {
      warn!("undo history is empty");
      return false;
    };
    if !self.history.undo(document) {
      warn!("undo history is empty");
      return false;
    }
    self.rebuild_indices();
    true
  }

  /// Restores an undone document state. No-op with a diagnostic when the
  /// redo stack is empty.
  pub fn redo(&mut self) -> bool {
    let Some(document) = self.modified.as_mut() else {
      warn!("redo history is empty");
      return false;
    };
    if !self.history.redo(document) {
      warn!("redo history is empty");
      return false;
    }
    self.rebuild_indices();
    true
  }

  /// Descriptions of the recorded actions, oldest first.
  pub fn descriptions(&self) -> impl Iterator<Item = &str> {
    self.history.descriptions()
  }

  pub fn undo_depth(&self) -> usize {
    self.history.undo_depth()
  }

  pub fn redo_depth(&self) -> usize {
    self.history.redo_depth()
  }

  pub fn all_category_ids(&self) -> Vec<String> {
    let Some(document) = &self.modified else {
      return Vec::new();
    };
    document
      .properties()
      .map(|property| property.key().to_string())
      .collect()
  }

  /// Flattened items of one category, in group order.
  pub fn items_in_category(&self, key: &str) -> Vec<String> {
    match self.find_category(key) {
      Some(property) => property.items().map(str::to_string).collect(),
      None => Vec::new(),
    }
  }

  /// Sorted unique namespace-qualified base names across the whole
  /// document (`minecraft:oak_stairs` shaped, state suffixes stripped).
  pub fn all_base_item_names(&self) -> Vec<String> {
    let Some(document) = &self.modified else {
      return Vec::new();
    };
    let mut names = BTreeSet::new();
    for property in document.properties() {
      for item in property.items() {
        let base = element::qualified_base_name(item);
        if !base.is_empty() {
          names.insert(base);
        }
      }
    }
    names.into_iter().collect()
  }

  pub fn check_item_existence(&self, item: &str) -> Existence {
    self.lookup.classify(item)
  }

  /// Sorted keys of every category containing any variant of the template
  /// item.
  pub fn target_categories_for_template(&self, template_item: &str) -> Vec<String> {
    let Some(document) = &self.modified else {
      return Vec::new();
    };
    if template_item.is_empty() {
      return Vec::new();
    }
    let base = element::template_base_name(template_item);
    let mut keys: Vec<String> = document
      .properties()
      .filter(|property| property.items().any(|item| item.starts_with(&base)))
      .map(|property| property.key().to_string())
      .collect();
    keys.sort();
    keys
  }

  /// Resolves a short template token to a fully-qualified base item, trying
  /// each strategy in order: exact match, `:short` suffix match, equality
  /// of the name part after the namespace colon, substring containment in
  /// the name part. First hit wins.
  pub fn resolve_template_item(&self, short: &str) -> Option<String> {
    if short.is_empty() {
      return None;
    }
    let candidates = self.all_base_item_names();

    if let Some(found) = candidates.iter().find(|name| name.as_str() == short) {
      return Some(found.clone());
    }
    let suffix = format!(":{short}");
    if let Some(found) = candidates.iter().find(|name| name.ends_with(&suffix)) {
      return Some(found.clone());
    }
    if let Some(found) = candidates.iter().find(|name| {
      name
        .split_once(':')
        .is_some_and(|(_, rest)| rest == short)
    }) {
      return Some(found.clone());
    }
    candidates
      .iter()
      .find(|name| match name.split_once(':') {
        Some((_, rest)) => rest.contains(short),
        None => name.contains(short),
      })
      .cloned()
  }

  /// The best target category for a template short-name: resolve the name
  /// (used directly when already qualified), then take the first of the
  /// sorted categories holding any of its variants.
  pub fn template_target_category(&self, name: &str) -> Option<String> {
    let candidate = if name.contains(':') {
      name.to_string()
    } else {
      self.resolve_template_item(name)?
    };
    self
      .target_categories_for_template(&candidate)
      .into_iter()
      .next()
  }

  /// Applies auto-mapper output through the same template propagation as
  /// the manual path: entries are grouped by template name, each group's
  /// full template is resolved, and template-mode add runs once per group.
  /// Entries whose template cannot be resolved, or whose propagation adds
  /// nothing, come back unmapped with a reason.
  pub fn apply_mapped(&mut self, entries: &[MappedItem]) -> ApplyReport {
    let mut report = ApplyReport::default();
    if entries.is_empty() {
      return report;
    }

    let mut by_template: IndexMap<String, Vec<String>> = IndexMap::new();
    for entry in entries {
      by_template
        .entry(entry.template.clone())
        .or_default()
        .push(entry.item.clone());
    }

    for (template, items) in by_template {
      let Some(full_template) = self.resolve_template_item(&template) else {
        for item in items {
          report
            .unmapped
            .push((item, format!("template '{template}' not found")));
        }
        continue;
      };
      if self.add_items_from_template(&items, &full_template) {
        report.applied.extend(items);
      } else {
        for item in items {
          report
            .unmapped
            .push((item, format!("no new items for template '{template}'")));
        }
      }
    }
    report
  }

  /// Index of the category's element in the modified document; feeds the
  /// shell's diff highlighting together with [`Manager::element_start_line`].
  pub fn element_index_of(&self, key: &str) -> Option<usize> {
    self.modified.as_ref()?.element_index_of(key)
  }

  /// 1-based starting line of the element at `index` in the after text.
  pub fn element_start_line(&self, index: usize) -> Option<usize> {
    self.modified.as_ref()?.start_line(index)
  }
}

fn trailing_number(key: &str) -> Option<i64> {
  key.rsplit('.').next().and_then(|tail| tail.parse().ok())
}
