//! Line parser for block.properties-shaped text.
//!
//! Parsing is total: every input line maps to exactly one element or is
//! merged into a multi-line property, and unparseable lines are preserved
//! as marked comments. Malformed content never surfaces as an error.

use crate::element::{
  Element,
  Property,
};

/// Lines starting with one of these (after trimming) are directives and
/// pass through verbatim.
const DIRECTIVE_KEYWORDS: [&str; 5] = ["#ifdef", "#ifndef", "#else", "#endif", "#define"];

/// Parses `text` into an ordered element sequence.
///
/// Properties whose value ends with a continuation backslash consume
/// subsequent raw lines until one does not; a continuation truncated by EOF
/// is accepted. The exact raw value text is retained for byte-faithful
/// serialization, and a processed (backslash-stripped) copy is tokenized
/// into namespace groups.
pub fn parse(text: &str) -> Vec<Element> {
  let mut lines: Vec<&str> = text.split('\n').collect();
  if text.ends_with('\n') {
    lines.pop();
  }

  let mut elements = Vec::new();
  let mut index = 0;
  while index < lines.len() {
    let line = lines[index];
    let trimmed = line.trim();

    if trimmed.is_empty() {
      elements.push(Element::EmptyLine(line.to_string()));
      index += 1;
      continue;
    }

    if DIRECTIVE_KEYWORDS
      .iter()
      .any(|keyword| trimmed.starts_with(keyword))
    {
      elements.push(Element::Directive(line.to_string()));
      index += 1;
      continue;
    }

    if trimmed.starts_with('#') {
      elements.push(Element::Comment(line.to_string()));
      index += 1;
      continue;
    }

    if let Some((key, rest)) = line.split_once('=') {
      let mut raw_lines = vec![rest];
      while ends_continued(raw_lines[raw_lines.len() - 1]) {
        index += 1;
        match lines.get(index) {
          Some(next) => raw_lines.push(next),
          // truncated continuation at EOF is accepted
          None => break,
        }
      }

      let raw = raw_lines.join("\n");
      let processed = processed_value(&raw_lines);
      elements.push(Element::Property(Property::from_processed(
        key.trim().to_string(),
        &processed,
        Some(raw),
      )));
      index += 1;
      continue;
    }

    // total coverage: keep anything unrecognized around as a marked comment
    elements.push(Element::Comment(format!("# [UNPARSED] {line}")));
    index += 1;
  }

  elements
}

fn ends_continued(line: &str) -> bool {
  line.trim_end().ends_with('\\')
}

/// Strips each line's trailing continuation backslash (whitespace before
/// the backslash survives), joins with newlines, and left-trims the result.
fn processed_value(raw_lines: &[&str]) -> String {
  let stripped: Vec<&str> = raw_lines
    .iter()
    .map(|line| {
      let trimmed = line.trim_end();
      match trimmed.strip_suffix('\\') {
        Some(head) => head,
        None => line,
      }
    })
    .collect();
  stripped.join("\n").trim_start().to_string()
}
