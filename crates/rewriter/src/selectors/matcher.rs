//! Streaming selector matching over the stack of open elements.
//!
//! Selectors are matched left to right. A pending state `(selector, next)`
//! records that `compounds[..next]` matched on an open ancestor, and the
//! element that produced it decides where the state is visible:
//! - descendant states live on a shared stack and stay valid until the
//!   producing element closes;
//! - child states are stored on the producing frame and are only offered to
//!   its immediate children.
//!
//! A new element is therefore tested only against the compound each visible
//! state points at.

use super::{Combinator, Selector, SelectorId};
use crate::rewritable_units::Attribute;

/// Start tag view used for matching.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ElementSnapshot<'a> {
    /// Lowercase tag name.
    pub(crate) name: &'a str,
    pub(crate) attributes: &'a [Attribute<'a>],
}

impl<'a> ElementSnapshot<'a> {
    /// `name` must be lowercase.
    pub(crate) fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|attr| attr.name() == name)
            .map(Attribute::value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PendingState {
    selector: SelectorId,
    next: usize,
}

/// An open element.
#[derive(Debug)]
pub(crate) struct Frame<T> {
    /// Lowercase tag name bytes.
    pub(crate) name: Box<[u8]>,
    /// Selectors matched on this element, ascending.
    pub(crate) matched: Vec<SelectorId>,
    child_states: Vec<PendingState>,
    descendant_mark: usize,
    pub(crate) data: T,
}

pub(crate) struct AncestorStack<T> {
    selectors: Vec<Selector>,
    frames: Vec<Frame<T>>,
    descendant_states: Vec<PendingState>,
    /// Index of `(selector, 0)` in `visible`; states of one selector are
    /// contiguous.
    state_base: Vec<usize>,
    /// Whether a state is already on `descendant_states`. Keeps at most one
    /// copy of each state alive however deep the stack gets.
    visible: Vec<bool>,
    candidates: Vec<PendingState>,
}

impl<T> AncestorStack<T> {
    pub(crate) fn new(selectors: Vec<Selector>) -> Self {
        let descendant_states = (0..selectors.len())
            .map(|selector| PendingState { selector, next: 0 })
            .collect();
        let mut state_base = Vec::with_capacity(selectors.len());
        let mut total = 0usize;
        for selector in &selectors {
            state_base.push(total);
            total += selector.compounds.len();
        }
        let mut visible = vec![false; total];
        for &base in &state_base {
            visible[base] = true;
        }
        Self {
            selectors,
            frames: Vec::new(),
            descendant_states,
            state_base,
            visible,
            candidates: Vec::new(),
        }
    }

    fn state_index(&self, state: PendingState) -> usize {
        self.state_base[state.selector] + state.next
    }

    pub(crate) fn has_selectors(&self) -> bool {
        !self.selectors.is_empty()
    }

    /// Whether any selector inspects attributes (including id and class).
    pub(crate) fn needs_attributes(&self) -> bool {
        self.selectors.iter().any(Selector::uses_attributes)
    }

    pub(crate) fn frames(&self) -> &[Frame<T>] {
        &self.frames
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Frame<T>> {
        self.frames.last_mut()
    }

    /// Open an element. `element` is `None` when nothing needs matching;
    /// the frame still tracks nesting.
    pub(crate) fn push(&mut self, name: Box<[u8]>, element: Option<&ElementSnapshot<'_>>, data: T) {
        let descendant_mark = self.descendant_states.len();
        let mut matched = Vec::new();
        let mut child_states = Vec::new();

        if let Some(element) = element {
            self.candidates.clear();
            self.candidates.extend_from_slice(&self.descendant_states);
            if let Some(parent) = self.frames.last() {
                self.candidates.extend_from_slice(&parent.child_states);
            }
            self.candidates.sort_unstable();
            self.candidates.dedup();

            for &state in &self.candidates {
                let selector = &self.selectors[state.selector];
                if !selector.compounds[state.next].matches(element) {
                    continue;
                }
                let next = state.next + 1;
                if next == selector.compounds.len() {
                    matched.push(state.selector);
                    continue;
                }
                let pending = PendingState {
                    selector: state.selector,
                    next,
                };
                match selector.combinators[state.next] {
                    Combinator::Descendant => {
                        let index = self.state_index(pending);
                        if !self.visible[index] {
                            self.visible[index] = true;
                            self.descendant_states.push(pending);
                        }
                    }
                    Combinator::Child => child_states.push(pending),
                }
            }
            matched.sort_unstable();
            matched.dedup();
        }

        self.frames.push(Frame {
            name,
            matched,
            child_states,
            descendant_mark,
            data,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<Frame<T>> {
        let frame = self.frames.pop()?;
        for i in frame.descendant_mark..self.descendant_states.len() {
            let index = self.state_index(self.descendant_states[i]);
            self.visible[index] = false;
        }
        self.descendant_states.truncate(frame.descendant_mark);
        Some(frame)
    }

    #[cfg(test)]
    pub(crate) fn descendant_state_count(&self) -> usize {
        self.descendant_states.len()
    }

    /// Index of the innermost open element named `name` (lowercase).
    pub(crate) fn find_open(&self, name: &[u8]) -> Option<usize> {
        self.frames.iter().rposition(|frame| &*frame.name == name)
    }
}
