use std::collections::{HashMap, LinkedList};
use std::fmt::{Debug, Formatter};

use crate::common::utils::{rcrc, RcRc};
use crate::interpreter::uwu_value::ValueRef;

/// Identifier to slot mapping that remembers insertion order, so namespaces print the way they
/// were written.
#[derive(Default)]
pub struct Bindings {
    slots: HashMap<String, ValueRef>,
    order: Vec<String>,
}

pub type Frame = RcRc<Bindings>;

impl Bindings {
    pub fn new() -> Self { Bindings::default() }

    pub fn get(&self, key: &str) -> Option<ValueRef> {
        self.slots.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Binds `key` to `value`, replacing the slot (not its contents) if the key already exists.
    pub fn define(&mut self, key: String, value: ValueRef) {
        if !self.slots.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.slots.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item=(&String, &ValueRef)> {
        self.order.iter().filter_map(move |k| self.slots.get(k).map(|v| (k, v)))
    }

    pub fn names(&self) -> Vec<String> { self.order.clone() }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }
}

impl Debug for Bindings {
    // Slots may (indirectly) contain their own frame, so only the names are printed.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.order.iter()).finish()
    }
}

/// A scope chain: `values` is the innermost frame, `parents` the enclosing ones, nearest first.
/// Cloning an environment shares its frames, which is how closures capture their scope.
#[derive(Clone)]
pub struct Environment {
    parents: LinkedList<Frame>,
    values: Frame,
}

impl Environment {
    pub fn new(values: Frame) -> Self {
        Environment { parents: LinkedList::new(), values }
    }

    pub fn new_nested(&self) -> Environment {
        self.nested_with(rcrc(Bindings::new()))
    }

    pub fn nested_with(&self, frame: Frame) -> Environment {
        let mut parents = self.parents.clone();
        parents.push_front(self.values.clone());
        Environment { values: frame, parents }
    }

    pub fn get(&self, key: &str) -> Option<ValueRef> {
        self.values.borrow().get(key)
            .or_else(|| self.parents.iter().find_map(|p| p.borrow().get(key)))
    }

    pub fn define(&self, key: String, value: ValueRef) {
        self.values.borrow_mut().define(key, value);
    }

    pub fn frame(&self) -> &Frame { &self.values }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let frames: Vec<String> = std::iter::once(&self.values)
            .chain(self.parents.iter())
            .map(|frame| frame.borrow().names().join(","))
            .collect();
        write!(f, "{}", frames.join(";;"))
    }
}
