use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use nonempty::NonEmpty;

use crate::ast::Node;
use crate::common::utils::{arglist_string, rcrc, RcRc};
use crate::interpreter::builtins::Builtin;
use crate::interpreter::environment::{Environment, Frame};
use crate::interpreter::result::RuntimeErrorKind;

pub type ValueRef = RcRc<Value>;
pub type MethodTable = HashMap<String, Rc<UwuFunction>>;

/// The name a method or constructor body uses to reach the receiver's own members.
pub const WATASHI: &str = "watashi";

// Functions and methods keep their body node and the chain they were defined in; every call
// nests a fresh frame on top of `closure`.
#[derive(Debug)]
pub struct UwuFunction {
    pub params: Vec<String>,
    pub body: Rc<Node>,
    pub closure: Environment,
}

#[derive(Debug)]
pub struct Constructor {
    pub params: Vec<String>,
    pub body: Rc<Node>,
}

#[derive(Debug)]
pub struct UwuClass {
    pub statics: Frame,
    pub methods: Rc<MethodTable>,
    pub constructor: Option<Rc<Constructor>>,
    pub closure: Environment,
}

#[derive(Debug)]
pub struct UwuInstance {
    pub members: Frame,
    /// Consulted front to back: the class's own methods first, then the extended ancestors.
    pub methods: NonEmpty<Rc<MethodTable>>,
}

impl UwuInstance {
    pub fn find_method(&self, name: &str) -> Option<Rc<UwuFunction>> {
        self.methods.iter().find_map(|table| table.get(name).cloned())
    }
}

#[derive(Debug)]
pub struct BoundMethod {
    pub func: Rc<UwuFunction>,
    pub receiver: Frame,
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Function(Rc<UwuFunction>),
    Method(Rc<BoundMethod>),
    Builtin(&'static Builtin),
    Class(Rc<UwuClass>),
    Instance(Rc<UwuInstance>),
    Scope(Frame),
}

impl Value {
    pub fn function(params: Vec<String>, body: Rc<Node>, closure: Environment) -> Self {
        Value::Function(Rc::new(UwuFunction { params, body, closure }))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "nwull",
            Value::Boolean(_) => "bwoolean",
            Value::Number(_) => "numbwer",
            Value::String(_) => "stwing",
            Value::Function(_) => "fwunction",
            Value::Method(_) => "mwethod",
            Value::Builtin(_) => "buiwtin fwunction",
            Value::Class(_) => "cwassu",
            Value::Instance(_) => "cwassu instance",
            Value::Scope(_) => "scope",
        }
    }

    /// Everything except `nwull` and `fawse` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Resolves `self's name`. Reading a missing member yields a fresh null; with `create` the
    /// member is added to the underlying mapping so the returned slot can be written through.
    pub fn possessive(&self, name: &str, create: bool) -> Result<ValueRef, RuntimeErrorKind> {
        match self {
            Value::Null if !create => Ok(rcrc(Value::Null)),
            Value::Class(class) => Ok(frame_member(&class.statics, name, create)),
            Value::Scope(frame) => Ok(frame_member(frame, name, create)),
            Value::Instance(instance) => {
                let member = instance.members.borrow().get(name);
                if let Some(slot) = member {
                    return Ok(slot);
                }
                if !create {
                    if let Some(func) = instance.find_method(name) {
                        let bound = BoundMethod { func, receiver: instance.members.clone() };
                        return Ok(rcrc(Value::Method(Rc::new(bound))));
                    }
                }
                Ok(frame_member(&instance.members, name, create))
            }
            other => Err(RuntimeErrorKind::NoMembers(other.type_name())),
        }
    }

    /// Structural equality: kinds must match, callables and objects compare by identity.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) =>
                Rc::ptr_eq(&a.func, &b.func) && Rc::ptr_eq(&a.receiver, &b.receiver),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Scope(a), Value::Scope(b)) => Rc::ptr_eq(a, b) || same_slots(a, b),
            _ => false,
        }
    }

    // Containers inside containers are not expanded.
    fn shallow(&self) -> String {
        match self {
            Value::Class(_) | Value::Instance(_) => "cwassu".to_owned(),
            Value::Scope(_) => "{ ... }".to_owned(),
            other => other.to_string(),
        }
    }
}

fn frame_member(frame: &Frame, name: &str, create: bool) -> ValueRef {
    let existing = frame.borrow().get(name);
    match existing {
        Some(slot) => slot,
        None if create => {
            let slot = rcrc(Value::Null);
            frame.borrow_mut().define(name.to_owned(), slot.clone());
            slot
        }
        None => rcrc(Value::Null),
    }
}

fn same_slots(a: &Frame, b: &Frame) -> bool {
    let (a, b) = (a.borrow(), b.borrow());
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).map(|o| Rc::ptr_eq(v, &o)).unwrap_or(false))
}

fn entries(frame: &Frame) -> String {
    let items: Vec<String> = frame.borrow()
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v.borrow().shallow()))
        .collect();
    if items.is_empty() {
        "{ }".to_owned()
    } else {
        format!("{{ {} }}", items.join(", "))
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_owned()
    } else if n.is_infinite() {
        (if n > 0.0 { "inf" } else { "-inf" }).to_owned()
    } else if n == 0.0 {
        "0".to_owned()
    } else if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "nwull"),
            Value::Boolean(b) => write!(f, "{}", if *b { "twue" } else { "fawse" }),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => write!(f, "fwunction {}", arglist_string(&func.params)),
            Value::Method(method) => write!(f, "mwethod {}", arglist_string(&method.func.params)),
            Value::Builtin(builtin) => write!(f, "buiwtin {}", builtin.name),
            Value::Class(class) => write!(f, "cwassu {}", entries(&class.statics)),
            Value::Instance(instance) => write!(f, "{}", entries(&instance.members)),
            Value::Scope(frame) => write!(f, "{}", entries(frame)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}
