//! Classes: named field layouts with single inheritance.
//!
//! A class declares fields with default values and may extend one parent.
//! Instantiating a class lays out every field of its lineage, ancestor
//! fields first; a subtype that redeclares an ancestor field overrides its
//! default without moving it.
//!
//! Fields come in three flavours: plain fields, observable fields (marked,
//! see [`marking`](crate::marking)), and origin fields, whose values are
//! handed out unwrapped even through a tracking wrapper.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::marking;
use crate::object::{Instance, ObjectData, ObjectRef};
use crate::value::Value;

/// Unique identifier for a class within the current thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        thread_local! {
            static NEXT: Cell<u64> = const { Cell::new(0) };
        }
        NEXT.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> u64 {
        self.0
    }
}

struct ClassDef {
    id: ClassId,
    name: Arc<str>,
    parent: Option<Class>,
    fields: Vec<(Arc<str>, Value)>,
    origin_fields: Vec<Arc<str>>,
}

/// Handle to a class definition. Cloning shares the definition.
#[derive(Clone)]
pub struct Class(Rc<ClassDef>);

impl Class {
    /// Starts declaring a class.
    #[must_use]
    pub fn builder(name: impl Into<Arc<str>>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Returns the class identifier.
    #[must_use]
    pub fn id(&self) -> ClassId {
        self.0.id
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the direct parent class.
    #[must_use]
    pub fn parent(&self) -> Option<&Class> {
        self.0.parent.as_ref()
    }

    /// Returns the fields this class itself declares.
    #[must_use]
    pub fn own_fields(&self) -> impl Iterator<Item = &str> {
        self.0.fields.iter().map(|(name, _)| name.as_ref())
    }

    /// Returns this class and its ancestors, most distant ancestor first.
    #[must_use]
    pub fn lineage(&self) -> Vec<Class> {
        let mut chain = Vec::new();
        let mut current = Some(self.clone());
        while let Some(class) = current {
            current = class.parent().cloned();
            chain.push(class);
        }
        chain.reverse();
        chain
    }

    /// Returns true if `name` was declared with [`ClassBuilder::origin`] by
    /// this class or an ancestor.
    #[must_use]
    pub fn keeps_origin(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.0.origin_fields.iter().any(|f| &**f == name) {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// Returns true if `self` is `other` or descends from it.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.ptr_eq(other) {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// Returns true if both handles refer to the same definition.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Creates a new instance with every lineage field at its default.
    ///
    /// Mutable container defaults are copied (shallowly) into each instance,
    /// so instances never share them. Frozen defaults are shared. Containers
    /// in observable fields relay their changes to the new instance.
    #[must_use]
    pub fn instantiate(&self) -> ObjectRef {
        let mut fields = IndexMap::new();
        for class in self.lineage() {
            for (name, default) in &class.0.fields {
                fields.insert(Arc::clone(name), fresh(default));
            }
        }
        let instance = ObjectRef::new(ObjectData::Instance(Instance {
            class: self.clone(),
            fields,
        }));
        for name in instance.field_names() {
            if let Some(value) = instance.field(&name) {
                instance.link_child(&name, &value);
            }
        }
        instance
    }

    /// Creates a new instance and applies the given field values.
    #[must_use]
    pub fn instantiate_with<I, K, V>(&self, values: I) -> ObjectRef
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arc<str>>,
        V: Into<Value>,
    {
        let instance = self.instantiate();
        instance.with_fields(values);
        instance
    }
}

fn fresh(default: &Value) -> Value {
    match default {
        Value::Object(obj) if !obj.is_frozen() => {
            Value::Object(ObjectRef::new(obj.with_data(Clone::clone)))
        }
        other => other.origin(),
    }
}

impl ObjectRef {
    // Fresh instances are never frozen, so these writes cannot fail.
    fn with_fields<I, K, V>(&self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arc<str>>,
        V: Into<Value>,
    {
        for (name, value) in values {
            let name: Arc<str> = name.into();
            let _ = self.write_field(&name, value.into(), false);
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.0.name)
            .field("parent", &self.parent().map(Class::name))
            .field("fields", &self.own_fields().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// Declares a class.
///
/// ```
/// use vigil_observable::{Class, Value};
///
/// let base = Class::builder("Base").field("id", 0).build();
/// let user = Class::builder("User")
///     .extends(&base)
///     .observable("name", "anon")
///     .build();
///
/// let alice = user.instantiate();
/// assert_eq!(alice.field("id"), Some(Value::Int(0)));
/// assert_eq!(alice.field("name"), Some(Value::from("anon")));
/// ```
#[must_use]
pub struct ClassBuilder {
    name: Arc<str>,
    parent: Option<Class>,
    fields: Vec<(Arc<str>, Value)>,
    marked: Vec<Arc<str>>,
    origin_fields: Vec<Arc<str>>,
}

impl ClassBuilder {
    /// Starts declaring a class with the given name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            marked: Vec::new(),
            origin_fields: Vec::new(),
        }
    }

    /// Sets the parent class.
    pub fn extends(mut self, parent: &Class) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declares a plain field.
    pub fn field(mut self, name: impl Into<Arc<str>>, default: impl Into<Value>) -> Self {
        let name = name.into();
        let default: Value = default.into();
        let default = default.origin();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = default,
            None => self.fields.push((name, default)),
        }
        self
    }

    /// Declares a field and marks it observable.
    pub fn observable(self, name: impl Into<Arc<str>>, default: impl Into<Value>) -> Self {
        let name = name.into();
        let mut this = self.field(Arc::clone(&name), default);
        if !this.marked.contains(&name) {
            this.marked.push(name);
        }
        this
    }

    /// Declares a field whose value tracked reads return as stored: never
    /// wrapped and never recorded as a dependency.
    pub fn origin(self, name: impl Into<Arc<str>>, default: impl Into<Value>) -> Self {
        let name = name.into();
        let mut this = self.field(Arc::clone(&name), default);
        if !this.origin_fields.contains(&name) {
            this.origin_fields.push(name);
        }
        this
    }

    /// Finishes the declaration, registering any observable fields.
    pub fn build(self) -> Class {
        let class = Class(Rc::new(ClassDef {
            id: ClassId::next(),
            name: self.name,
            parent: self.parent,
            fields: self.fields,
            origin_fields: self.origin_fields,
        }));
        for field in &self.marked {
            marking::mark(&class, field);
        }
        class
    }
}
