use std::io;

use crate::common::utils::rcrc;
use crate::interpreter::console::Console;
use crate::interpreter::environment::{Bindings, Frame};
use crate::interpreter::result::RuntimeErrorKind;
use crate::interpreter::uwu_value::{Value, ValueRef};

type BuiltinResult = Result<ValueRef, RuntimeErrorKind>;
pub type BuiltinFn = fn(&[ValueRef], &mut dyn Console) -> BuiltinResult;

// Natives don't close over anything, so a plain function pointer is enough.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub min_arity: usize,
    pub max_arity: Option<usize>,
    func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, args: &[ValueRef], console: &mut dyn Console) -> BuiltinResult {
        if args.len() < self.min_arity {
            return Err(RuntimeErrorKind::Arity { expected: self.min_arity, actual: args.len() });
        }
        if let Some(max) = self.max_arity.filter(|max| args.len() > *max) {
            return Err(RuntimeErrorKind::Arity { expected: max, actual: args.len() });
        }
        tracing::trace!(builtin = self.name, args = args.len(), "calling builtin");
        (self.func)(args, console)
    }
}

const fn native(name: &'static str, min_arity: usize, max_arity: Option<usize>, func: BuiltinFn) -> Builtin {
    Builtin { name, min_arity, max_arity, func }
}

const UNARY: Option<usize> = Some(1);
const BINARY: Option<usize> = Some(2);
const VARIADIC: Option<usize> = None;

pub static CATALOGUE: &[Builtin] = &[
    native("pwint", 0, VARIADIC, pwint),
    native("nani", 0, VARIADIC, nani),
    native("moshi moshi", 0, VARIADIC, moshi_moshi),
    native("conneko", 1, VARIADIC, conneko),
    native("nwumber", 1, UNARY, nwumber),
    native("stwing", 1, UNARY, stwing),
    native("sum", 0, VARIADIC, sum),
    native("pwoduct", 0, VARIADIC, pwoduct),
    native("diffwence", 2, BINARY, diffwence),
    native("diwision", 2, BINARY, diwision),
    native("wemainder", 2, BINARY, wemainder),
    native("negative", 1, UNARY, negative),
    native("absowute", 1, UNARY, absowute),
    native("fwoor", 1, UNARY, fwoor),
    native("wound", 1, UNARY, wound),
    native("ceiwing", 1, UNARY, ceiwing),
    native("sqware woot", 1, UNARY, sqware_woot),
    native("is bwiger", 2, BINARY, is_bwiger),
    native("is smowwer", 2, BINARY, is_smowwer),
    native("as bwig as", 2, BINARY, as_bwig_as),
    native("as smol as", 2, BINARY, as_smol_as),
    native("same", 2, VARIADIC, same),
    native("not same", 2, VARIADIC, not_same),
    native("both", 2, BINARY, both),
    native("either", 2, BINARY, either),
    native("neither", 2, BINARY, neither),
    native("index", 2, BINARY, index),
    native("update index", 3, Some(3), update_index),
];

/// A frame holding a fresh slot for every builtin.
pub fn prelude() -> Frame {
    let mut bindings = Bindings::new();
    for builtin in CATALOGUE {
        bindings.define(builtin.name.to_owned(), rcrc(Value::Builtin(builtin)));
    }
    rcrc(bindings)
}

fn null() -> BuiltinResult { Ok(rcrc(Value::Null)) }

fn number(n: f64) -> BuiltinResult { Ok(rcrc(Value::Number(n))) }

fn boolean(b: bool) -> BuiltinResult { Ok(rcrc(Value::Boolean(b))) }

fn console_error(e: io::Error) -> RuntimeErrorKind {
    RuntimeErrorKind::Console(e.to_string())
}

fn joined(args: &[ValueRef], separator: &str) -> String {
    args.iter().map(|e| e.borrow().to_string()).collect::<Vec<_>>().join(separator)
}

// None as soon as one argument is not a number.
fn numbers(args: &[ValueRef]) -> Option<Vec<f64>> {
    args.iter().map(|e| e.borrow().as_number()).collect()
}

fn numeric(args: &[ValueRef], f: impl FnOnce(&[f64]) -> Option<f64>) -> BuiltinResult {
    match numbers(args).and_then(|ns| f(&ns)) {
        Some(n) => number(n),
        None => null(),
    }
}

fn comparison(args: &[ValueRef], f: impl FnOnce(f64, f64) -> bool) -> BuiltinResult {
    match numbers(args).as_deref() {
        Some(&[a, b]) => boolean(f(a, b)),
        _ => null(),
    }
}

fn truths(args: &[ValueRef]) -> (bool, bool) {
    (args[0].borrow().is_truthy(), args[1].borrow().is_truthy())
}

fn pwint(args: &[ValueRef], console: &mut dyn Console) -> BuiltinResult {
    console.write_line(&joined(args, " ")).map_err(console_error)?;
    null()
}

fn nani(args: &[ValueRef], console: &mut dyn Console) -> BuiltinResult {
    let line = console.read_line(&joined(args, " ")).map_err(console_error)?;
    Ok(rcrc(Value::String(line)))
}

fn moshi_moshi(args: &[ValueRef], console: &mut dyn Console) -> BuiltinResult {
    let line = console.read_line(&joined(args, " ")).map_err(console_error)?;
    match line.trim().parse::<f64>() {
        Ok(n) => number(n),
        Err(_) => null(),
    }
}

fn conneko(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    Ok(rcrc(Value::String(joined(args, ""))))
}

fn nwumber(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    match &*args[0].borrow() {
        Value::Number(n) => number(*n),
        Value::String(s) => s.trim().parse::<f64>().map_or_else(|_| null(), number),
        _ => null(),
    }
}

fn stwing(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    Ok(rcrc(Value::String(args[0].borrow().to_string())))
}

fn sum(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some(ns.iter().sum()))
}

fn pwoduct(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some(ns.iter().product()))
}

fn diffwence(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some(ns[0] - ns[1]))
}

fn diwision(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| {
        let (a, b) = (ns[0], ns[1]);
        Some(if b != 0.0 {
            a / b
        } else if a > 0.0 {
            f64::INFINITY
        } else if a < 0.0 {
            f64::NEG_INFINITY
        } else {
            0.0
        })
    })
}

// Floored modulo: the result takes the sign of the divisor.
fn wemainder(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| {
        let (a, b) = (ns[0], ns[1]);
        if b == 0.0 {
            None
        } else {
            let r = a % b;
            Some(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r })
        }
    })
}

fn negative(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some(-ns[0]))
}

fn absowute(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some(ns[0].abs()))
}

fn fwoor(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some(ns[0].floor()))
}

fn wound(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some((ns[0] + 0.5).floor()))
}

fn ceiwing(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some(ns[0].ceil()))
}

fn sqware_woot(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    numeric(args, |ns| Some(ns[0]).filter(|n| *n >= 0.0).map(f64::sqrt))
}

fn is_bwiger(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    comparison(args, |a, b| a > b)
}

fn is_smowwer(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    comparison(args, |a, b| a < b)
}

fn as_bwig_as(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    comparison(args, |a, b| a >= b)
}

fn as_smol_as(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    comparison(args, |a, b| a <= b)
}

fn all_same(args: &[ValueRef]) -> bool {
    let first = args[0].borrow();
    args[1..].iter().all(|e| first.same(&e.borrow()))
}

fn same(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    boolean(all_same(args))
}

fn not_same(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    boolean(!all_same(args))
}

fn both(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    let (a, b) = truths(args);
    boolean(a && b)
}

fn either(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    let (a, b) = truths(args);
    boolean(a || b)
}

fn neither(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    let (a, b) = truths(args);
    boolean(!(a || b))
}

fn index(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    let (table, key) = (args[0].borrow(), args[1].borrow());
    if matches!(*table, Value::Null) || matches!(*key, Value::Null) {
        return null();
    }
    let name = key.to_string();
    table.possessive(&name, false)
}

fn update_index(args: &[ValueRef], _: &mut dyn Console) -> BuiltinResult {
    let value = args[2].borrow().clone();
    let slot = {
        let (table, key) = (args[0].borrow(), args[1].borrow());
        if matches!(*table, Value::Null) || matches!(*key, Value::Null) {
            return null();
        }
        table.possessive(&key.to_string(), true)?
    };
    *slot.borrow_mut() = value;
    null()
}
