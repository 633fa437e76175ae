//! Minimal object model: prototype chains, data and accessor properties,
//! dense arrays, and native functions.

use crate::error::Exception;
use crate::heap::HeapRef;
use crate::runtime::Runtime;
use crate::shell::CollectionShell;
use crate::value::Value;
use core::fmt;
use hashbrown::HashMap;
use std::rc::Rc;

/// `f(runtime, this, args)`.
pub type NativeFn = Rc<dyn Fn(&mut Runtime, Value, &[Value]) -> Result<Value, Exception>>;

/// `f(runtime, args, new_target)`.
pub type ConstructFn = Rc<dyn Fn(&mut Runtime, &[Value], Value) -> Result<Value, Exception>>;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum PropertyKey {
    Index(u32),
    Name(Rc<str>),
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        PropertyKey::Index(i)
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::Name(Rc::from(s))
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Index(i) => write!(f, "{}", i),
            PropertyKey::Name(n) => f.write_str(n),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Property {
    Data(Value),
    /// Getter is a function value invoked with the property holder's
    /// original receiver as `this`.
    Accessor { getter: Value },
}

#[derive(Clone)]
pub struct FunctionData {
    name: Rc<str>,
    call: Option<NativeFn>,
    construct: Option<ConstructFn>,
}

impl FunctionData {
    pub fn new(name: &str, call: Option<NativeFn>, construct: Option<ConstructFn>) -> Self {
        Self {
            name: Rc::from(name),
            call,
            construct,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call_fn(&self) -> Option<&NativeFn> {
        self.call.as_ref()
    }

    pub fn construct_fn(&self) -> Option<&ConstructFn> {
        self.construct.as_ref()
    }
}

impl fmt::Debug for FunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionData")
            .field("name", &self.name)
            .field("callable", &self.call.is_some())
            .field("constructor", &self.construct.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub enum ObjectClass {
    Ordinary,
    Array(Vec<Value>),
    Function(FunctionData),
    Collection(CollectionShell),
}

#[derive(Debug)]
pub struct JsObject {
    class: ObjectClass,
    prototype: Option<HeapRef>,
    properties: HashMap<PropertyKey, Property>,
}

impl JsObject {
    pub fn new(class: ObjectClass, prototype: Option<HeapRef>) -> Self {
        Self {
            class,
            prototype,
            properties: HashMap::new(),
        }
    }

    pub fn class(&self) -> &ObjectClass {
        &self.class
    }

    pub fn prototype(&self) -> Option<HeapRef> {
        self.prototype
    }

    /// Own property, including array elements and `length`.
    pub fn own_property(&self, key: &PropertyKey) -> Option<Property> {
        if let ObjectClass::Array(elements) = &self.class {
            match key {
                PropertyKey::Index(i) => {
                    if let Some(v) = elements.get(*i as usize) {
                        return Some(Property::Data(*v));
                    }
                }
                PropertyKey::Name(n) if &**n == "length" => {
                    return Some(Property::Data(Value::Smi(elements.len() as i32)));
                }
                PropertyKey::Name(_) => {}
            }
        }
        self.properties.get(key).copied()
    }

    /// Defines or overwrites an own property.
    ///
    /// An array index inside the dense elements, or one past their end,
    /// writes an element. Indices further out are kept as ordinary
    /// properties and join the elements once the gap before them fills.
    pub fn define(&mut self, key: PropertyKey, property: Property) {
        if let (ObjectClass::Array(elements), PropertyKey::Index(i), Property::Data(v)) =
            (&mut self.class, &key, property)
        {
            let i = *i as usize;
            if i < elements.len() {
                elements[i] = v;
                return;
            }
            if i == elements.len() {
                elements.push(v);
                self.properties.remove(&key);
                while let Some(next) = u32::try_from(elements.len())
                    .ok()
                    .map(PropertyKey::Index)
                {
                    let merged = match self.properties.get(&next) {
                        Some(Property::Data(v)) => *v,
                        _ => break,
                    };
                    elements.push(merged);
                    self.properties.remove(&next);
                }
                return;
            }
        }
        self.properties.insert(key, property);
    }

    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.class {
            ObjectClass::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_shell(&self) -> Option<&CollectionShell> {
        match &self.class {
            ObjectClass::Collection(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_shell_mut(&mut self) -> Option<&mut CollectionShell> {
        match &mut self.class {
            ObjectClass::Collection(s) => Some(s),
            _ => None,
        }
    }
}
