//! Ordered element sequence forming a whole document.

use serde::{
  Deserialize,
  Serialize,
};

use crate::element::{
  Element,
  Property,
};

/// A parsed properties file.
///
/// Element order is the save order. Cloning a document is the deep-copy
/// snapshot operation the undo history relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  elements: Vec<Element>,
}

impl Document {
  pub fn new(elements: Vec<Element>) -> Self {
    Self { elements }
  }

  pub fn len(&self) -> usize {
    self.elements.len()
  }

  pub fn is_empty(&self) -> bool {
    self.elements.is_empty()
  }

  pub fn elements(&self) -> &[Element] {
    &self.elements
  }

  /// All properties in document order.
  pub fn properties(&self) -> impl Iterator<Item = &Property> {
    self.elements.iter().filter_map(Element::as_property)
  }

  pub fn find_property(&self, key: &str) -> Option<&Property> {
    self.properties().find(|property| property.key() == key)
  }

  pub fn find_property_mut(&mut self, key: &str) -> Option<&mut Property> {
    self
      .elements
      .iter_mut()
      .filter_map(Element::as_property_mut)
      .find(|property| property.key() == key)
  }

  /// Index of the property named `key` in the element sequence.
  pub fn element_index_of(&self, key: &str) -> Option<usize> {
    self.elements.iter().position(|element| {
      element
        .as_property()
        .is_some_and(|property| property.key() == key)
    })
  }

  pub fn insert(&mut self, index: usize, element: Element) {
    self.elements.insert(index, element);
  }

  /// Serializes the document: each element's text plus a trailing newline.
  /// This is the literal save payload.
  pub fn to_text(&self) -> String {
    let mut out = String::new();
    for element in &self.elements {
      out.push_str(&element.to_text());
      out.push('\n');
    }
    out
  }

  /// The 1-based line on which the element at `index` starts in the
  /// serialized text. Multi-line properties occupy `newlines + 1` lines.
  pub fn start_line(&self, index: usize) -> Option<usize> {
    if index >= self.elements.len() {
      return None;
    }
    let mut line = 1;
    for element in &self.elements[..index] {
      line += element.to_text().matches('\n').count() + 1;
    }
    Some(line)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse;

  const SAMPLE: &str = "\
# header
block.1=stone
block.2=oak_log \\
 birch_log
block.3=dirt
";

  #[test]
  fn lookup_by_key() {
    let document = Document::new(parse(SAMPLE));
    assert!(document.find_property("block.2").is_some());
    assert!(document.find_property("block.9").is_none());
    assert_eq!(document.element_index_of("block.3"), Some(3));
  }

  #[test]
  fn start_lines_count_continuations() {
    let document = Document::new(parse(SAMPLE));
    assert_eq!(document.start_line(0), Some(1)); // header comment
    assert_eq!(document.start_line(1), Some(2)); // block.1
    assert_eq!(document.start_line(2), Some(3)); // block.2 spans two lines
    assert_eq!(document.start_line(3), Some(5)); // block.3
    assert_eq!(document.start_line(4), None);
  }

  #[test]
  fn insert_keeps_order() {
    let mut document = Document::new(parse(SAMPLE));
    document.insert(1, Element::EmptyLine(String::new()));
    assert_eq!(document.element_index_of("block.1"), Some(2));
  }
}
