use crate::dom::document::{DomTree, NodeId};
use crate::error::PageError;

// ============================================================================
// CSS selector subset
//
// Supported: tag, `*`, `#id`, `.class`, `[attr]`, `[attr=v]`, `[attr="v"]`,
// `[attr*=v]`, `[attr^=v]`, `[attr$=v]`, `[attr~=v]`, descendant and `>`
// combinators, and comma-separated groups. That covers every selector the
// form markup needs.
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    Contains { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Includes { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Step {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    step: Step,
    // Relation to the part on the left.
    combinator: Option<Combinator>,
}

/// A parsed selector: one or more comma-separated chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Vec<Part>>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, PageError> {
        let mut groups = Vec::new();
        for group in split_groups(selector)? {
            groups.push(parse_chain(&group)?);
        }
        Ok(Selector { groups })
    }

    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        if tree.element(node).is_none() {
            return false;
        }
        self.groups.iter().any(|parts| matches_chain(tree, node, parts))
    }
}

fn matches_chain(tree: &DomTree, node: NodeId, parts: &[Part]) -> bool {
    let Some(last) = parts.last() else {
        return false;
    };
    if !matches_step(tree, node, &last.step) {
        return false;
    }

    let mut current = node;
    for idx in (1..parts.len()).rev() {
        let prev = &parts[idx - 1].step;
        let combinator = parts[idx].combinator.unwrap_or(Combinator::Descendant);

        let matched = match combinator {
            Combinator::Child => tree
                .parent(current)
                .filter(|parent| matches_step(tree, *parent, prev)),
            Combinator::Descendant => {
                let mut cursor = tree.parent(current);
                let mut found = None;
                while let Some(parent) = cursor {
                    if matches_step(tree, parent, prev) {
                        found = Some(parent);
                        break;
                    }
                    cursor = tree.parent(parent);
                }
                found
            }
        };

        let Some(matched) = matched else {
            return false;
        };
        current = matched;
    }

    true
}

fn matches_step(tree: &DomTree, node: NodeId, step: &Step) -> bool {
    let Some(element) = tree.element(node) else {
        return false;
    };

    if let Some(tag) = &step.tag {
        if !element.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }

    if let Some(id) = &step.id {
        if element.attr("id") != Some(id.as_str()) {
            return false;
        }
    }

    if step.classes.iter().any(|class| !element.has_class(class)) {
        return false;
    }

    step.attrs.iter().all(|cond| match cond {
        AttrCondition::Exists { key } => element.attr(key).is_some(),
        AttrCondition::Eq { key, value } => element.attr(key) == Some(value.as_str()),
        AttrCondition::Contains { key, value } => {
            element.attr(key).is_some_and(|attr| attr.contains(value.as_str()))
        }
        AttrCondition::StartsWith { key, value } => {
            element.attr(key).is_some_and(|attr| attr.starts_with(value.as_str()))
        }
        AttrCondition::EndsWith { key, value } => {
            element.attr(key).is_some_and(|attr| attr.ends_with(value.as_str()))
        }
        AttrCondition::Includes { key, value } => element
            .attr(key)
            .is_some_and(|attr| attr.split_whitespace().any(|token| token == value)),
    })
}

// ----------------------------------------------------------------------------
// Parsing
// ----------------------------------------------------------------------------

fn unsupported(selector: &str) -> PageError {
    PageError::UnsupportedSelector(selector.to_string())
}

fn split_groups(selector: &str) -> Result<Vec<String>, PageError> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        match ch {
            '"' | '\'' if bracket_depth > 0 => {
                match quote {
                    Some(open) if open == ch => quote = None,
                    None => quote = Some(ch),
                    _ => {}
                }
                current.push(ch);
            }
            '[' if quote.is_none() => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                if bracket_depth == 0 {
                    return Err(unsupported(selector));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(unsupported(selector));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || quote.is_some() {
        return Err(unsupported(selector));
    }

    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(unsupported(selector));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn tokenize(selector: &str) -> Result<Vec<String>, PageError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        match ch {
            '"' | '\'' if bracket_depth > 0 => {
                match quote {
                    Some(open) if open == ch => quote = None,
                    None => quote = Some(ch),
                    _ => {}
                }
                current.push(ch);
            }
            '[' if quote.is_none() => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                bracket_depth = bracket_depth.saturating_sub(1);
                current.push(ch);
            }
            '>' if bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(">".to_string());
            }
            ch if ch.is_ascii_whitespace() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    Ok(tokens)
}

fn parse_chain(selector: &str) -> Result<Vec<Part>, PageError> {
    let mut parts = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize(selector)? {
        if token == ">" {
            if pending.is_some() || parts.is_empty() {
                return Err(unsupported(selector));
            }
            pending = Some(Combinator::Child);
            continue;
        }

        let step = parse_step(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(Part { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(unsupported(selector));
    }
    Ok(parts)
}

fn parse_step(part: &str) -> Result<Step, PageError> {
    let chars: Vec<char> = part.chars().collect();
    let mut i = 0usize;
    let mut step = Step::default();
    let mut universal = false;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                if universal || step.tag.is_some() {
                    return Err(unsupported(part));
                }
                universal = true;
                i += 1;
            }
            '#' => {
                let (id, next) = parse_ident(&chars, i + 1).ok_or_else(|| unsupported(part))?;
                if step.id.replace(id).is_some() {
                    return Err(unsupported(part));
                }
                i = next;
            }
            '.' => {
                let (class, next) = parse_ident(&chars, i + 1).ok_or_else(|| unsupported(part))?;
                step.classes.push(class);
                i = next;
            }
            '[' => {
                let (cond, next) = parse_attr(&chars, i).ok_or_else(|| unsupported(part))?;
                step.attrs.push(cond);
                i = next;
            }
            _ => {
                if i != 0 {
                    return Err(unsupported(part));
                }
                let (tag, next) = parse_ident(&chars, i).ok_or_else(|| unsupported(part))?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.tag.is_none()
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
        && !universal
    {
        return Err(unsupported(part));
    }
    Ok(step)
}

fn parse_ident(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut end = start;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '-' || chars[end] == '_')
    {
        end += 1;
    }
    if end == start {
        return None;
    }
    Some((chars[start..end].iter().collect(), end))
}

/// Parses `[key]`, `[key=value]`, `[key="value"]` and the `*= ^= $= ~=` forms.
fn parse_attr(chars: &[char], start: usize) -> Option<(AttrCondition, usize)> {
    let (key, mut i) = parse_ident(chars, start + 1)?;

    if chars.get(i) == Some(&']') {
        return Some((AttrCondition::Exists { key }, i + 1));
    }

    let operator = match chars.get(i)? {
        '=' => {
            i += 1;
            '='
        }
        op @ ('*' | '^' | '$' | '~') if chars.get(i + 1) == Some(&'=') => {
            i += 2;
            *op
        }
        _ => return None,
    };

    let value: String;
    match chars.get(i)? {
        quote @ ('"' | '\'') => {
            let quote = *quote;
            let begin = i + 1;
            let mut end = begin;
            while end < chars.len() && chars[end] != quote {
                end += 1;
            }
            if end >= chars.len() {
                return None;
            }
            value = chars[begin..end].iter().collect();
            i = end + 1;
        }
        _ => {
            let begin = i;
            while i < chars.len() && chars[i] != ']' {
                i += 1;
            }
            value = chars[begin..i].iter().collect::<String>().trim().to_string();
        }
    }

    if chars.get(i) != Some(&']') {
        return None;
    }

    let cond = match operator {
        '=' => AttrCondition::Eq { key, value },
        '*' => AttrCondition::Contains { key, value },
        '^' => AttrCondition::StartsWith { key, value },
        '$' => AttrCondition::EndsWith { key, value },
        _ => AttrCondition::Includes { key, value },
    };
    Some((cond, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_attribute_step() {
        let sel = Selector::parse(r#"input[type="text"][aria-labelledby]"#).unwrap();
        assert_eq!(sel.groups.len(), 1);
        let step = &sel.groups[0][0].step;
        assert_eq!(step.tag.as_deref(), Some("input"));
        assert_eq!(step.attrs.len(), 2);
    }

    #[test]
    fn parses_groups_and_descendants() {
        let sel = Selector::parse(r#"input[aria-label="Jam"], [role="heading"] .M7eMe"#).unwrap();
        assert_eq!(sel.groups.len(), 2);
        assert_eq!(sel.groups[1].len(), 2);
        assert_eq!(sel.groups[1][1].combinator, Some(Combinator::Descendant));
    }

    #[test]
    fn comma_inside_quoted_value_is_not_a_group_separator() {
        let sel = Selector::parse(r#"[aria-label="Red, Green"]"#).unwrap();
        assert_eq!(sel.groups.len(), 1);
    }

    #[test]
    fn rejects_pseudo_classes_and_dangling_combinators() {
        assert!(Selector::parse("div:first-child").is_err());
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("[role=\"x\"").is_err());
    }
}
