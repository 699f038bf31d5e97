use super::{AncestorStack, AttributeOperator, Combinator, ElementSnapshot, Selector};
use crate::error::SelectorError;
use crate::rewritable_units::Attribute;

fn parse(input: &str) -> Selector {
    input
        .parse()
        .unwrap_or_else(|err| panic!("selector {input:?} must parse: {err}"))
}

#[test]
fn parses_compounds_and_combinators() {
    let selector = parse("DIV.box#main > p  a[href^='https:' i]");
    assert_eq!(selector.compounds.len(), 3);
    assert_eq!(
        selector.combinators,
        vec![Combinator::Child, Combinator::Descendant]
    );
    let first = &selector.compounds[0];
    assert_eq!(first.tag.as_deref(), Some("div"));
    assert_eq!(first.classes, vec!["box"]);
    assert_eq!(first.ids, vec!["main"]);
    let attr = &selector.compounds[2].attributes[0];
    assert_eq!(attr.name, "href");
    assert_eq!(
        attr.condition,
        Some((AttributeOperator::Prefix, "https:".to_string()))
    );
    assert!(attr.case_insensitive);
}

#[test]
fn universal_and_bare_attribute_selectors() {
    let selector = parse("* > [data-x]");
    assert_eq!(selector.compounds[0].tag, None);
    assert_eq!(selector.compounds[1].attributes[0].name, "data-x");
    assert_eq!(selector.compounds[1].attributes[0].condition, None);
}

#[test]
fn rejects_invalid_selectors() {
    let cases: &[(&str, SelectorError)] = &[
        ("", SelectorError::Empty),
        ("   ", SelectorError::Empty),
        ("div >", SelectorError::DanglingCombinator(3)),
        ("a:hover", SelectorError::Unsupported("pseudo-classes")),
        ("a, b", SelectorError::Unsupported("selector lists")),
        ("a + b", SelectorError::Unsupported("sibling combinators")),
        ("a ~ b", SelectorError::Unsupported("sibling combinators")),
        ("[href", SelectorError::UnterminatedAttribute(0)),
        ("[href='x]", SelectorError::UnterminatedString(6)),
        ("#1a", SelectorError::ExpectedIdentifier(1)),
        (
            "div!",
            SelectorError::UnexpectedCharacter {
                ch: '!',
                offset: 3,
            },
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(
            input.parse::<Selector>().as_ref(),
            Err(expected),
            "input={input:?}"
        );
    }
}

fn element<'a>(name: &'a str, attributes: &'a [Attribute<'a>]) -> ElementSnapshot<'a> {
    ElementSnapshot { name, attributes }
}

fn attrs(pairs: &[(&str, &str)]) -> Vec<Attribute<'static>> {
    pairs
        .iter()
        .map(|(name, value)| Attribute::new(name, value))
        .collect()
}

/// Push `name` and return the selectors it matched.
fn open(stack: &mut AncestorStack<()>, name: &str, attributes: &[Attribute<'_>]) -> Vec<usize> {
    stack.push(
        name.as_bytes().into(),
        Some(&element(name, attributes)),
        (),
    );
    stack.frames().last().map(|f| f.matched.clone()).unwrap_or_default()
}

#[test]
fn child_and_descendant_combinators() {
    let mut stack = AncestorStack::new(vec![parse("div > p"), parse("section > p"), parse("div p")]);
    let none: Vec<Attribute<'static>> = Vec::new();

    assert_eq!(open(&mut stack, "div", &none), Vec::<usize>::new());
    assert_eq!(open(&mut stack, "p", &none), vec![0, 2]);
    stack.pop();
    assert_eq!(open(&mut stack, "section", &none), Vec::<usize>::new());
    assert_eq!(open(&mut stack, "p", &none), vec![1, 2]);
    stack.pop();
    stack.pop();
    stack.pop();
    assert_eq!(open(&mut stack, "p", &none), Vec::<usize>::new());
}

#[test]
fn descendant_states_expire_with_their_element() {
    let mut stack = AncestorStack::new(vec![parse("ul a")]);
    let none: Vec<Attribute<'static>> = Vec::new();
    open(&mut stack, "ul", &none);
    open(&mut stack, "li", &none);
    assert_eq!(open(&mut stack, "a", &none), vec![0]);
    stack.pop();
    stack.pop();
    stack.pop();
    assert_eq!(open(&mut stack, "a", &none), Vec::<usize>::new());
}

#[test]
fn child_state_is_not_visible_to_grandchildren() {
    let mut stack = AncestorStack::new(vec![parse("div > p")]);
    let none: Vec<Attribute<'static>> = Vec::new();
    open(&mut stack, "div", &none);
    open(&mut stack, "span", &none);
    assert_eq!(open(&mut stack, "p", &none), Vec::<usize>::new());
}

#[test]
fn mixed_chain_matches_through_several_paths() {
    let mut stack = AncestorStack::new(vec![parse("div p > b")]);
    let none: Vec<Attribute<'static>> = Vec::new();
    open(&mut stack, "div", &none);
    open(&mut stack, "p", &none);
    open(&mut stack, "p", &none);
    assert_eq!(open(&mut stack, "b", &none), vec![0]);
}

#[test]
fn id_class_and_attribute_operators() {
    let attributes = attrs(&[
        ("id", "main"),
        ("class", "card  wide"),
        ("lang", "en-US"),
        ("href", "https://example.com/x.png"),
        ("rel", "nofollow noopener"),
    ]);
    let snapshot = element("a", &attributes);
    let matches = |input: &str| parse(input).compounds[0].matches(&snapshot);

    assert!(matches("a#main.card.wide"));
    assert!(!matches("a.card.narrow"));
    assert!(!matches("#other"));
    assert!(matches("[lang|=en]"));
    assert!(!matches("[lang|=e]"));
    assert!(matches("[href^=https]"));
    assert!(matches("[href$='.png']"));
    assert!(matches("[href*=example]"));
    assert!(matches("[rel~=noopener]"));
    assert!(!matches("[rel~=noop]"));
    assert!(matches("[ID=main]"));
    assert!(!matches("[id=MAIN]"));
    assert!(matches("[id=MAIN i]"));
    assert!(!matches("[href^='']"));
}

#[test]
fn frames_without_snapshot_only_track_nesting() {
    let mut stack: AncestorStack<u8> = AncestorStack::new(Vec::new());
    assert!(!stack.has_selectors());
    stack.push(b"div".to_vec().into_boxed_slice(), None, 1);
    stack.push(b"p".to_vec().into_boxed_slice(), None, 2);
    assert_eq!(stack.find_open(b"div"), Some(0));
    assert_eq!(stack.find_open(b"table"), None);
    assert_eq!(stack.pop().map(|frame| frame.data), Some(2));
}

#[test]
fn nested_matches_share_one_descendant_state() {
    let mut stack = AncestorStack::new(vec![parse("div p"), parse("div span b")]);
    let none: Vec<Attribute<'static>> = Vec::new();
    for _ in 0..1000 {
        open(&mut stack, "div", &none);
    }
    assert_eq!(stack.descendant_state_count(), 4);
    assert_eq!(open(&mut stack, "span", &none), Vec::<usize>::new());
    assert_eq!(stack.descendant_state_count(), 5);
    assert_eq!(open(&mut stack, "b", &none), vec![1]);
    assert_eq!(open(&mut stack, "p", &none), vec![0]);

    stack.pop();
    stack.pop();
    stack.pop();
    assert_eq!(stack.descendant_state_count(), 4);
    for _ in 0..999 {
        stack.pop();
    }
    // The outermost div still carries both `div` states.
    assert_eq!(stack.descendant_state_count(), 4);
    stack.pop();
    assert_eq!(stack.descendant_state_count(), 2);
    assert_eq!(open(&mut stack, "p", &none), Vec::<usize>::new());
}
