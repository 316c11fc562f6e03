//! Marking registry: which class fields are observable.
//!
//! Marks are recorded per declaring class and merged through the lineage at
//! lookup time, ancestor fields first. The registry lives for the whole
//! thread; classes are never unregistered.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::class::{Class, ClassId};
use crate::object::ObjectRef;
use crate::tracked::Tracked;
use crate::value::Value;

thread_local! {
    static MARKS: RefCell<HashMap<ClassId, IndexSet<Arc<str>>>> = RefCell::new(HashMap::new());
}

/// Anything whose class can be looked up for marking queries.
pub trait Markable {
    /// Returns the class this value is an instance of (or is).
    fn class_of(&self) -> Option<Class>;
}

impl Markable for Class {
    fn class_of(&self) -> Option<Class> {
        Some(self.clone())
    }
}

impl Markable for ObjectRef {
    fn class_of(&self) -> Option<Class> {
        self.class()
    }
}

impl Markable for Tracked {
    fn class_of(&self) -> Option<Class> {
        self.target().class()
    }
}

impl Markable for Value {
    fn class_of(&self) -> Option<Class> {
        self.target().and_then(ObjectRef::class)
    }
}

/// Registers `field` as observable on `class` and all its subclasses.
///
/// Marking the same field twice has no additional effect.
pub fn mark(class: &Class, field: &str) {
    MARKS.with(|marks| {
        marks
            .borrow_mut()
            .entry(class.id())
            .or_default()
            .insert(Arc::from(field));
    });
}

/// Returns the observable fields of a class lineage, ancestor fields first.
///
/// Non-instances have no marked fields.
#[must_use]
pub fn get_marked(target: &impl Markable) -> IndexSet<Arc<str>> {
    let Some(class) = target.class_of() else {
        return IndexSet::new();
    };
    MARKS.with(|marks| {
        let marks = marks.borrow();
        let mut merged = IndexSet::new();
        for ancestor in class.lineage() {
            if let Some(own) = marks.get(&ancestor.id()) {
                merged.extend(own.iter().cloned());
            }
        }
        merged
    })
}

/// Returns true if `field` is marked, or with `None`, if any field is.
#[must_use]
pub fn is_marked(target: &impl Markable, field: Option<&str>) -> bool {
    let Some(class) = target.class_of() else {
        return false;
    };
    MARKS.with(|marks| {
        let marks = marks.borrow();
        class.lineage().iter().any(|ancestor| {
            marks.get(&ancestor.id()).is_some_and(|own| match field {
                Some(name) => own.contains(name),
                None => !own.is_empty(),
            })
        })
    })
}
