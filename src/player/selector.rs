//! Target resolution for replayed activations
//!
//! The replay window rarely matches the recorded DOM exactly, so an
//! activation target is resolved through an ordered list of matchers. The
//! first matcher that finds an element wins.
//!
//! Recognized target forms, in priority order:
//!
//! | matcher          | form                                   |
//! |------------------|----------------------------------------|
//! | activation id    | `like-post` (raw `data-activate-id`)   |
//! | test id          | `[data-testid="composer"]`             |
//! | aria             | `[role="tab"][aria-label="Settings"]`  |
//! | anchor href      | `a[href="/settings"]`                  |
//! | button text      | `button:has-text("Save")`              |
//! | input with value | `input[type="radio"][value="monthly"]` |
//! | typed input      | `input[type="search"]`                 |
//! | typed button     | `button[type="submit"]`                |

use crate::dom::{Document, ElementQuery, NodeId, ACTIVATION_ATTRIBUTE};

pub type Matcher = fn(&str, &dyn Document) -> Option<NodeId>;

/// Which matcher resolved a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    ActivationId,
    TestId,
    Aria,
    AnchorHref,
    ButtonText,
    InputWithValue,
    TypedInput,
    TypedButton,
}

#[derive(Clone)]
pub struct SelectorChain {
    matchers: Vec<(MatchKind, Matcher)>,
}

impl std::fmt::Debug for SelectorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

impl Default for SelectorChain {
    fn default() -> Self {
        Self {
            matchers: vec![
                (MatchKind::ActivationId, match_activation_id as Matcher),
                (MatchKind::TestId, match_test_id as Matcher),
                (MatchKind::Aria, match_aria as Matcher),
                (MatchKind::AnchorHref, match_anchor_href as Matcher),
                (MatchKind::ButtonText, match_button_text as Matcher),
                (MatchKind::InputWithValue, match_input_with_value as Matcher),
                (MatchKind::TypedInput, match_typed_input as Matcher),
                (MatchKind::TypedButton, match_typed_button as Matcher),
            ],
        }
    }
}

impl SelectorChain {
    pub fn resolve(&self, selector: &str, document: &dyn Document) -> Option<(MatchKind, NodeId)> {
        self.matchers
            .iter()
            .find_map(|(kind, matcher)| matcher(selector, document).map(|node| (*kind, node)))
    }

    /// Run only the matcher of one kind
    pub fn resolve_with(&self, kind: MatchKind, selector: &str, document: &dyn Document) -> Option<NodeId> {
        self.matchers
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, matcher)| matcher(selector, document))
    }

    pub fn kinds(&self) -> Vec<MatchKind> {
        self.matchers.iter().map(|(kind, _)| *kind).collect()
    }
}

/// Targets that are really locations are navigated to instead
pub fn looks_like_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//")
}

/// `tag[name="value"]...:has-text("text")`
#[derive(Debug, Default, PartialEq)]
struct Compound<'a> {
    tag: Option<&'a str>,
    attributes: Vec<(&'a str, &'a str)>,
    has_text: Option<&'a str>,
}

impl<'a> Compound<'a> {
    fn attr(&self, name: &str) -> Option<&'a str> {
        self.attributes.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    fn attr_names(&self) -> Vec<&'a str> {
        self.attributes.iter().map(|(n, _)| *n).collect()
    }
}

fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = raw.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
            return inner;
        }
    }
    raw
}

fn parse_compound(selector: &str) -> Option<Compound<'_>> {
    let selector = selector.trim();
    let tag_end = selector.find(['[', ':']).unwrap_or(selector.len());
    let tag = &selector[..tag_end];
    if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }

    let mut compound = Compound {
        tag: (!tag.is_empty()).then_some(tag),
        ..Compound::default()
    };

    let mut rest = &selector[tag_end..];
    while let Some(body) = rest.strip_prefix('[') {
        let close = body.find(']')?;
        let (name, value) = body[..close].split_once('=')?;
        compound.attributes.push((name.trim(), unquote(value)));
        rest = &body[close + 1..];
    }

    if let Some(pseudo) = rest.strip_prefix(":has-text(") {
        let text = pseudo.strip_suffix(')')?;
        compound.has_text = Some(unquote(text));
        rest = "";
    }

    rest.is_empty().then_some(compound)
}

/// Activation ids are opaque; any non-empty token is looked up verbatim
fn match_activation_id(selector: &str, document: &dyn Document) -> Option<NodeId> {
    if selector.is_empty() {
        return None;
    }
    document.query(&ElementQuery::attribute(ACTIVATION_ATTRIBUTE, selector))
}

fn match_test_id(selector: &str, document: &dyn Document) -> Option<NodeId> {
    let compound = parse_compound(selector)?;
    if compound.tag.is_some() || compound.attr_names() != ["data-testid"] {
        return None;
    }
    document.query(&ElementQuery::attribute("data-testid", compound.attr("data-testid")?))
}

fn match_aria(selector: &str, document: &dyn Document) -> Option<NodeId> {
    let compound = parse_compound(selector)?;
    if compound.attributes.len() != 2 {
        return None;
    }
    let role = compound.attr("role")?;
    let label = compound.attr("aria-label")?;
    let mut query = ElementQuery::attribute("role", role).with_attribute("aria-label", label);
    query.tag = compound.tag.map(str::to_string);
    document.query(&query)
}

fn match_anchor_href(selector: &str, document: &dyn Document) -> Option<NodeId> {
    let compound = parse_compound(selector)?;
    if compound.tag != Some("a") || compound.attr_names() != ["href"] {
        return None;
    }
    document.query(&ElementQuery::tag("a").with_attribute("href", compound.attr("href")?))
}

fn match_button_text(selector: &str, document: &dyn Document) -> Option<NodeId> {
    let compound = parse_compound(selector)?;
    if compound.tag != Some("button") || !compound.attributes.is_empty() {
        return None;
    }
    document.query(&ElementQuery::tag("button").with_text(compound.has_text?))
}

fn match_input_with_value(selector: &str, document: &dyn Document) -> Option<NodeId> {
    let compound = parse_compound(selector)?;
    if compound.tag != Some("input") {
        return None;
    }
    let query = ElementQuery::tag("input")
        .with_attribute("type", compound.attr("type")?)
        .with_attribute("value", compound.attr("value")?);
    document.query(&query)
}

fn match_typed_input(selector: &str, document: &dyn Document) -> Option<NodeId> {
    let compound = parse_compound(selector)?;
    if compound.tag != Some("input") {
        return None;
    }
    document.query(&ElementQuery::tag("input").with_attribute("type", compound.attr("type")?))
}

fn match_typed_button(selector: &str, document: &dyn Document) -> Option<NodeId> {
    let compound = parse_compound(selector)?;
    if compound.tag != Some("button") || compound.attr_names() != ["type"] {
        return None;
    }
    document.query(&ElementQuery::tag("button").with_attribute("type", compound.attr("type")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::headless::{HeadlessDocument, HeadlessElement};
    use crate::dom::Dimensions;

    fn document() -> (HeadlessDocument, Vec<NodeId>) {
        let doc = HeadlessDocument::new(Dimensions::default());
        let ids = vec![
            doc.append(HeadlessElement::new("button").attr(ACTIVATION_ATTRIBUTE, "like-post")),
            doc.append(HeadlessElement::new("div").attr("data-testid", "composer")),
            doc.append(
                HeadlessElement::new("div")
                    .attr("role", "tab")
                    .attr("aria-label", "Settings"),
            ),
            doc.append(HeadlessElement::new("a").attr("href", "/settings")),
            doc.append(HeadlessElement::new("button").text(" Save ")),
            doc.append(HeadlessElement::new("input").attr("type", "radio").attr("value", "yearly")),
            doc.append(HeadlessElement::new("input").attr("type", "radio").attr("value", "monthly")),
            doc.append(HeadlessElement::new("button").attr("type", "submit").text("Go")),
        ];
        (doc, ids)
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            SelectorChain::default().kinds(),
            vec![
                MatchKind::ActivationId,
                MatchKind::TestId,
                MatchKind::Aria,
                MatchKind::AnchorHref,
                MatchKind::ButtonText,
                MatchKind::InputWithValue,
                MatchKind::TypedInput,
                MatchKind::TypedButton,
            ]
        );
    }

    #[test]
    fn test_each_form_resolves() {
        let (doc, ids) = document();
        let chain = SelectorChain::default();
        let cases = [
            ("like-post", MatchKind::ActivationId, ids[0]),
            ("[data-testid=\"composer\"]", MatchKind::TestId, ids[1]),
            ("[role=\"tab\"][aria-label=\"Settings\"]", MatchKind::Aria, ids[2]),
            ("a[href='/settings']", MatchKind::AnchorHref, ids[3]),
            ("button:has-text(\"Save\")", MatchKind::ButtonText, ids[4]),
            ("input[type=\"radio\"][value=\"monthly\"]", MatchKind::InputWithValue, ids[6]),
            ("input[type=radio]", MatchKind::TypedInput, ids[5]),
            ("button[type=\"submit\"]", MatchKind::TypedButton, ids[7]),
        ];

        for (selector, kind, node) in cases {
            assert_eq!(chain.resolve(selector, &doc), Some((kind, node)), "{selector}");
        }
    }

    #[test]
    fn test_input_value_falls_back_to_type() {
        let (doc, ids) = document();

        let resolved = SelectorChain::default().resolve("input[type=\"radio\"][value=\"weekly\"]", &doc);

        assert_eq!(resolved, Some((MatchKind::TypedInput, ids[5])));
    }

    #[test]
    fn test_unmatched_targets() {
        let (doc, _) = document();
        let chain = SelectorChain::default();

        assert_eq!(chain.resolve("missing-id", &doc), None);
        assert_eq!(chain.resolve("a[href=\"/elsewhere\"]", &doc), None);
        assert_eq!(chain.resolve("button:has-text(\"Delete\")", &doc), None);
        assert_eq!(chain.resolve("div > span", &doc), None);
    }

    #[test]
    fn test_parse_compound_forms() {
        assert_eq!(
            parse_compound("input[type=\"radio\"][value='x']"),
            Some(Compound {
                tag: Some("input"),
                attributes: vec![("type", "radio"), ("value", "x")],
                has_text: None,
            })
        );
        assert_eq!(parse_compound("button[type=submit"), None);
        assert_eq!(parse_compound("div span"), None);
    }

    #[test]
    fn test_activation_id_is_opaque() {
        let doc = HeadlessDocument::new(Dimensions::default());
        let chain = SelectorChain::default();

        for id in ["post:42:like", "nav/home", "/home", "row[3]"] {
            let node = doc.append(HeadlessElement::new("button").attr(ACTIVATION_ATTRIBUTE, id));
            assert_eq!(
                chain.resolve_with(MatchKind::ActivationId, id, &doc),
                Some(node),
                "{id}"
            );
        }
        assert_eq!(chain.resolve_with(MatchKind::ActivationId, "", &doc), None);
    }

    #[test]
    fn test_looks_like_path() {
        assert!(looks_like_path("/settings/profile"));
        assert!(!looks_like_path("//evil.example.com"));
        assert!(!looks_like_path("like-post"));
    }
}
