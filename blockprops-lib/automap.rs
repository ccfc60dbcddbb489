//! Rule-based pre-classification of new items.
//!
//! Rules come from a small external text file, one rule per line:
//!
//! ```text
//! <matcher>:<value> -> template:<name>
//! ```
//!
//! where `<matcher>` is one of `contains`, `prefix`, `suffix`, `exact`, or
//! `regex`. Blank lines and `#` comments are skipped, as are malformed
//! lines. Mapping is a pure dry-run: the first matching rule in file order
//! wins, and actual mutation happens through the manager's apply path.

use log::warn;
use regex::Regex;

/// The five supported matcher kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
  Contains,
  Prefix,
  Suffix,
  Exact,
  Regex,
}

impl MatcherKind {
  fn parse(kind: &str) -> Option<Self> {
    match kind {
      "contains" => Some(Self::Contains),
      "prefix" => Some(Self::Prefix),
      "suffix" => Some(Self::Suffix),
      "exact" => Some(Self::Exact),
      "regex" => Some(Self::Regex),
      _ => None,
    }
  }
}

/// One auto-mapping rule: match an incoming item, name the template to
/// propagate it through.
#[derive(Debug, Clone)]
pub struct Rule {
  matcher:  MatcherKind,
  value:    String,
  // pre-compiled for MatcherKind::Regex; None when the pattern is invalid
  regex:    Option<Regex>,
  template: String,
}

impl Rule {
  pub fn new(matcher: MatcherKind, value: impl Into<String>, template: impl Into<String>) -> Self {
    let value = value.into();
    let regex = match matcher {
      MatcherKind::Regex => match Regex::new(&value) {
        Ok(regex) => Some(regex),
        Err(err) => {
          warn!("invalid regex '{value}' in rule: {err}");
          None
        },
      },
      _ => None,
    };
    Self {
      matcher,
      value,
      regex,
      template: template.into(),
    }
  }

  pub fn matcher(&self) -> MatcherKind {
    self.matcher
  }

  pub fn template(&self) -> &str {
    &self.template
  }

  /// Whether `item` matches this rule. An invalid regex matches nothing.
  pub fn matches(&self, item: &str) -> bool {
    match self.matcher {
      MatcherKind::Contains => item.contains(&self.value),
      MatcherKind::Prefix => item.starts_with(&self.value),
      MatcherKind::Suffix => item.ends_with(&self.value),
      MatcherKind::Exact => item == self.value,
      MatcherKind::Regex => self.regex.as_ref().is_some_and(|regex| regex.is_match(item)),
    }
  }
}

/// Parses one rule line. Blank lines, comments, and malformed shapes
/// (missing `->`, missing `:` on the left, unknown matcher kind, or no
/// `template:` chunk on the right) yield `None`.
pub fn parse_rule_line(line: &str) -> Option<Rule> {
  let line = line.trim();
  if line.is_empty() || line.starts_with('#') {
    return None;
  }

  let (left, right) = line.split_once("->")?;
  let (kind, value) = left.trim().split_once(':')?;
  let matcher = MatcherKind::parse(kind.trim())?;

  // the right side is comma-separated key:value chunks; only `template`
  // matters, and the last occurrence wins
  let template = right
    .split(',')
    .filter_map(|chunk| {
      let (name, value) = chunk.split_once(':')?;
      (name.trim() == "template").then(|| value.trim().to_string())
    })
    .next_back()?;

  Some(Rule::new(matcher, value.trim(), template))
}

/// Parses a whole rule file, skipping everything [`parse_rule_line`] skips.
pub fn parse_rules(text: &str) -> Vec<Rule> {
  text.lines().filter_map(parse_rule_line).collect()
}

/// A dry-run mapping: `item` matched a rule naming `template`, which
/// resolved to the `target` category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedItem {
  pub item:     String,
  pub template: String,
  pub target:   String,
}

/// Classifies `items` against `rules`; the first matching rule in file
/// order wins. Items with no matching rule, or whose template the resolver
/// cannot place, land in the unmapped list with a reason.
///
/// Performs no mutation; apply the result through the manager.
pub fn automap(
  items: &[String],
  rules: &[Rule],
  mut resolve_template: impl FnMut(&str) -> Option<String>,
) -> (Vec<MappedItem>, Vec<(String, String)>) {
  let mut mapped = Vec::new();
  let mut unmapped = Vec::new();

  for item in items {
    let Some(rule) = rules.iter().find(|rule| rule.matches(item)) else {
      unmapped.push((item.clone(), "no rule matched".to_string()));
      continue;
    };
    match resolve_template(rule.template()) {
      Some(target) => mapped.push(MappedItem {
        item:     item.clone(),
        template: rule.template().to_string(),
        target,
      }),
      None => {
        unmapped.push((
          item.clone(),
          format!("template '{}' not found", rule.template()),
        ));
      },
    }
  }

  (mapped, unmapped)
}
