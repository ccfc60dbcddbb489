//! File-system rim around the core: document load/save, rule files, and
//! session snapshots.
//!
//! Everything here degrades the way the core expects: unreadable documents
//! and absent rule files are empty results with a logged diagnostic, while
//! genuine I/O and encoding failures surface as typed [`LoaderError`]s.

use std::{
  fs,
  io,
  path::Path,
};

use blockprops_lib::{
  automap::{
    Rule,
    parse_rules,
  },
  manager::Manager,
};
use log::warn;
use thiserror::Error;

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

#[derive(Debug, Error)]
pub enum LoaderError {
  #[error("io error: {0}")]
  Io(#[from] io::Error),
  #[error("session encode/decode error: {0}")]
  Session(#[from] serde_json::Error),
  #[error("no document loaded")]
  NothingLoaded,
}

/// Built-in starter rule set, written out on first run.
pub const DEFAULT_RULES: &str = include_str!("default_rules.txt");

/// Reads and parses the file at `path` into the manager.
///
/// An unreadable path or a file that parses to nothing degrades to `false`
/// with a logged diagnostic; the manager's previous state stays intact.
pub fn load_document(manager: &mut Manager, path: impl AsRef<Path>) -> bool {
  let path = path.as_ref();
  let text = match fs::read_to_string(path) {
    Ok(text) => text,
    Err(err) => {
      warn!("failed to read {}: {err}", path.display());
      return false;
    },
  };
  manager.load_text(&text)
}

/// Writes the manager's serialized after-text to `path`. The written bytes
/// are exactly the second half of [`Manager::diff_text`].
pub fn save_document(manager: &Manager, path: impl AsRef<Path>) -> Result<()> {
  if !manager.is_loaded() {
    return Err(LoaderError::NothingLoaded);
  }
  let (_, after) = manager.diff_text();
  fs::write(path.as_ref(), after)?;
  Ok(())
}

/// Loads auto-mapper rules from `path`. An absent or unreadable file is an
/// empty rule set, not an error; malformed lines are dropped by the parser.
pub fn load_rules(path: impl AsRef<Path>) -> Vec<Rule> {
  match fs::read_to_string(path.as_ref()) {
    Ok(text) => parse_rules(&text),
    Err(_) => Vec::new(),
  }
}

/// Writes the built-in starter rule file when `path` does not exist yet.
/// Returns whether a file was created.
pub fn ensure_rules_file(path: impl AsRef<Path>) -> Result<bool> {
  let path = path.as_ref();
  if path.exists() {
    return Ok(false);
  }
  fs::write(path, DEFAULT_RULES)?;
  Ok(true)
}

/// Snapshots the full manager state (documents, history, descriptions) to
/// `path`. The format is opaque; the only contract is that
/// [`load_session`] restores an identical manager.
pub fn save_session(manager: &Manager, path: impl AsRef<Path>) -> Result<()> {
  let encoded = serde_json::to_string(manager)?;
  fs::write(path.as_ref(), encoded)?;
  Ok(())
}

/// Restores a manager from a session snapshot, rebuilding the derived
/// indices that snapshots do not carry.
pub fn load_session(path: impl AsRef<Path>) -> Result<Manager> {
  let encoded = fs::read_to_string(path.as_ref())?;
  let mut manager: Manager = serde_json::from_str(&encoded)?;
  manager.rebuild_indices();
  Ok(manager)
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "\
# mappings
block.3=minecraft:stone
block.10=minecraft:oak_stairs \\
 byg:aspen_stairs
";

  #[test]
  fn document_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("block.properties");
    fs::write(&source, SAMPLE).unwrap();

    let mut manager = Manager::new();
    assert!(load_document(&mut manager, &source));

    let saved = dir.path().join("out.properties");
    save_document(&manager, &saved).unwrap();
    assert_eq!(fs::read_to_string(&saved).unwrap(), SAMPLE);
  }

  #[test]
  fn missing_document_degrades_to_false() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = Manager::new();
    assert!(!load_document(&mut manager, dir.path().join("nope.properties")));
    assert!(!manager.is_loaded());
  }

  #[test]
  fn save_without_load_is_a_typed_error() {
    let dir = tempfile::tempdir().unwrap();
    let manager = Manager::new();
    let result = save_document(&manager, dir.path().join("out.properties"));
    assert!(matches!(result, Err(LoaderError::NothingLoaded)));
  }

  #[test]
  fn absent_rule_file_is_an_empty_rule_set() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_rules(dir.path().join("auto_rules.txt")).is_empty());
  }

  #[test]
  fn ensure_rules_file_writes_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auto_rules.txt");

    assert!(ensure_rules_file(&path).unwrap());
    assert!(!ensure_rules_file(&path).unwrap());

    let rules = load_rules(&path);
    assert!(!rules.is_empty());
    assert!(rules.iter().any(|rule| rule.template() == "oak_stairs"));
  }

  #[test]
  fn session_roundtrip_preserves_history_and_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = Manager::new();
    assert!(manager.load_text(SAMPLE));
    assert!(manager.add_items(&["minecraft:dirt".to_string()], "block.3"));

    let path = dir.path().join("session.json");
    save_session(&manager, &path).unwrap();

    let mut restored = load_session(&path).unwrap();
    assert_eq!(restored.diff_text(), manager.diff_text());
    assert_eq!(restored.undo_depth(), 1);
    let descriptions: Vec<&str> = restored.descriptions().collect();
    assert_eq!(descriptions, ["Added 1 items to 'block.3'"]);

    // restored indices answer queries again
    let suggestions = restored.suggest_categories(&["cobbled_stone".to_string()]);
    assert!(!suggestions.is_empty());

    // and undo still unwinds to the originally loaded text
    assert!(restored.undo());
    let (_, after) = restored.diff_text();
    assert_eq!(after, SAMPLE);
  }
}
