use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use nonempty::NonEmpty;

use crate::ast::{Node, NodeKind};
use crate::common::utils::rcrc;
use crate::config::Config;
use crate::interpreter::builtins::prelude;
use crate::interpreter::console::SharedConsole;
use crate::interpreter::environment::{Bindings, Environment, Frame};
use crate::interpreter::result::{Control, InterpretResult, RuntimeError, RuntimeErrorKind};
use crate::interpreter::uwu_value::{Constructor, MethodTable, UwuClass, UwuFunction, UwuInstance, Value, ValueRef, WATASHI};

pub mod builtins;
pub mod console;
pub mod environment;
pub mod loader;
pub mod result;
pub mod uwu_value;

// Stack headroom for one more level of evaluation, and how much to grow by when it runs out.
const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

type InProgress = HashSet<*const UwuClass>;

pub struct Interpreter {
    env: Environment,
    builtins: Frame,
    globals: Frame,
    base_dir: PathBuf,
    config: Rc<Config>,
    console: SharedConsole,
    depth: usize,
}

impl Interpreter {
    pub fn new(config: Rc<Config>, console: SharedConsole) -> Self {
        Interpreter::with_globals(config, console, rcrc(Bindings::new()))
    }

    /// Runs against an existing global frame, e.g. the one a previous prompt input left behind.
    pub fn with_globals(config: Rc<Config>, console: SharedConsole, globals: Frame) -> Self {
        let builtins = prelude();
        let env = Environment::new(builtins.clone()).nested_with(globals.clone());
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Interpreter { env, builtins, globals, base_dir, config, console, depth: 0 }
    }

    /// Directory relative `woad` paths are resolved against.
    pub fn with_base_dir<P: Into<PathBuf>>(mut self, base_dir: P) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn globals(&self) -> Frame { self.globals.clone() }

    /// Executes a program root. Returns the value of a top-level `give`, if one ran.
    pub fn run(&mut self, root: &Node) -> InterpretResult<Option<ValueRef>> {
        let env = self.env.clone();
        Ok(match self.execute_all(&root.children, &env)? {
            Some(Control::Give(value)) => Some(value),
            Some(Control::Break(_)) | None => None,
        })
    }

    fn execute_all(&mut self, statements: &[Node], env: &Environment) -> InterpretResult<Option<Control>> {
        for statement in statements {
            if let Some(control) = self.execute(statement, env)? {
                return Ok(Some(control));
            }
        }
        Ok(None)
    }

    fn execute(&mut self, node: &Node, env: &Environment) -> InterpretResult<Option<Control>> {
        match &node.kind {
            NodeKind::Set => {
                let (path, expression) = two_children(node)?;
                let value = self.evaluate(expression, env)?.borrow().clone();
                let slot = self.resolve_path(path, env, true)?;
                *slot.borrow_mut() = value;
                Ok(None)
            }
            NodeKind::Call => {
                let (path, arguments) = two_children(node)?;
                let callee = self.resolve_path(path, env, false)?;
                if matches!(*callee.borrow(), Value::Null) {
                    return Err(RuntimeError::new(
                        node.line,
                        RuntimeErrorKind::MissingCallee(path.path_string()),
                    ));
                }
                let args = self.evaluate_list(arguments, env)?;
                self.call(&callee, args, path)?;
                Ok(None)
            }
            NodeKind::Give => {
                let expression = node.children.first().ok_or_else(|| malformed(node))?;
                Ok(Some(Control::Give(self.evaluate(expression, env)?)))
            }
            NodeKind::Repeat => loop {
                match self.execute_all(&node.children, env)? {
                    None => continue,
                    Some(Control::Break(1)) => return Ok(None),
                    Some(Control::Break(levels)) => return Ok(Some(Control::Break(levels - 1))),
                    Some(give) => return Ok(Some(give)),
                }
            },
            NodeKind::Break(levels) => Ok(Some(Control::Break(*levels))),
            NodeKind::If => {
                for branch in &node.children {
                    match branch.kind {
                        NodeKind::Condition => {
                            let (condition, block) = two_children(branch)?;
                            if self.evaluate(condition, env)?.borrow().is_truthy() {
                                return self.execute_all(&block.children, env);
                            }
                        }
                        _ => return self.execute_all(&branch.children, env),
                    }
                }
                Ok(None)
            }
            NodeKind::Load => self.load(node, env).map(|_| None),
            NodeKind::Block | NodeKind::File => self.execute_all(&node.children, env),
            _ => Err(malformed(node)),
        }
    }

    fn evaluate(&mut self, node: &Node, env: &Environment) -> InterpretResult<ValueRef> {
        let first = node.children.first().ok_or_else(|| malformed(node))?;
        let value = match &first.kind {
            NodeKind::Number(n) => Value::Number(*n),
            NodeKind::String(s) => Value::String(s.clone()),
            NodeKind::Boolean(b) => Value::Boolean(*b),
            NodeKind::Null => Value::Null,
            NodeKind::IdentifierPath => {
                let target = self.resolve_path(first, env, false)?;
                return match node.children.get(1) {
                    Some(call) if call.kind == NodeKind::CallArguments => {
                        let arguments = call.children.first().ok_or_else(|| malformed(call))?;
                        let args = self.evaluate_list(arguments, env)?;
                        self.call(&target, args, first)
                    }
                    _ => Ok(target),
                };
            }
            NodeKind::ArgList => {
                let body = node.children.get(1).ok_or_else(|| malformed(node))?;
                Value::function(first.identifier_names(), Rc::new(body.clone()), env.clone())
            }
            NodeKind::ClassDef => self.define_class(first, env)?,
            _ => return Err(malformed(first)),
        };
        Ok(rcrc(value))
    }

    fn evaluate_list(&mut self, list: &Node, env: &Environment) -> InterpretResult<Vec<ValueRef>> {
        list.children.iter().map(|e| self.evaluate(e, env)).collect()
    }

    /// Walks `a's b's c` to its slot. With `create`, missing names are added to the innermost
    /// frame or the owning object so the slot can be assigned.
    fn resolve_path(&mut self, path: &Node, env: &Environment, create: bool) -> InterpretResult<ValueRef> {
        let (first, rest) = path.children.split_first().ok_or_else(|| malformed(path))?;
        let name = first.identifier_name().ok_or_else(|| malformed(first))?;
        if create && path.children.last().and_then(Node::identifier_name) == Some(WATASHI) {
            return Err(RuntimeError::new(path.line, RuntimeErrorKind::AssignWatashi));
        }
        // Assigning a builtin's name shadows it in the innermost frame; the prelude stays intact.
        let found = env.get(name).filter(|slot| !(create && rest.is_empty() && self.is_builtin_slot(name, slot)));
        let mut current = match found {
            Some(slot) => slot,
            None if create => {
                let slot = rcrc(Value::Null);
                env.define(name.to_owned(), slot.clone());
                slot
            }
            None => {
                return Err(RuntimeError::new(first.line, RuntimeErrorKind::UnknownIdentifier(name.to_owned())));
            }
        };
        for member in rest {
            let name = member.identifier_name().ok_or_else(|| malformed(member))?;
            let next = current.borrow()
                .possessive(name, create)
                .map_err(|kind| RuntimeError::new(member.line, kind))?;
            current = next;
        }
        Ok(current)
    }

    fn is_builtin_slot(&self, name: &str, slot: &ValueRef) -> bool {
        self.builtins.borrow().get(name).map_or(false, |builtin| Rc::ptr_eq(&builtin, slot))
    }

    fn call(&mut self, callee: &ValueRef, args: Vec<ValueRef>, site: &Node) -> InterpretResult<ValueRef> {
        let callee = callee.borrow().clone();
        tracing::trace!(callee = %site.path_string(), kind = callee.type_name(), line = site.line, "call");
        let result = match callee {
            Value::Builtin(builtin) => {
                let mut console = self.console.borrow_mut();
                return builtin.call(&args, &mut *console).map_err(|kind| RuntimeError::new(site.line, kind));
            }
            Value::Function(func) => self.nested(site.line, |this| this.call_function(&func, None, args)),
            Value::Method(method) => {
                let receiver = method.receiver.clone();
                self.nested(site.line, |this| this.call_function(&method.func, Some(receiver), args))
            }
            Value::Class(class) => self
                .instantiate(&class, args, &mut InProgress::new(), site.line)
                .map(|instance| rcrc(Value::Instance(instance))),
            other => Err(RuntimeError::new(site.line, RuntimeErrorKind::NotCallable(other.type_name()))),
        };
        result.map_err(|e| e.called_at(site.path_string(), site.line))
    }

    fn call_function(&mut self, func: &UwuFunction, receiver: Option<Frame>, args: Vec<ValueRef>) -> InterpretResult<ValueRef> {
        let mut frame = bind_params(&func.params, args);
        if let Some(members) = receiver {
            frame.define(WATASHI.to_owned(), rcrc(Value::Scope(members)));
        }
        let env = func.closure.nested_with(rcrc(frame));
        match self.execute_all(&func.body.children, &env)? {
            Some(Control::Give(value)) => Ok(value),
            Some(Control::Break(_)) | None => Ok(rcrc(Value::Null)),
        }
    }

    /// Runs `f` one call level deeper, failing instead of overflowing once the limit is hit.
    fn nested<A>(&mut self, line: usize, f: impl FnOnce(&mut Self) -> InterpretResult<A>) -> InterpretResult<A> {
        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeError::new(line, RuntimeErrorKind::CallDepth(self.config.max_call_depth)));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || f(self));
        self.depth -= 1;
        result
    }

    fn define_class(&mut self, node: &Node, env: &Environment) -> InterpretResult<Value> {
        let statics = env.new_nested();
        let mut methods = MethodTable::new();
        let mut constructor = None;
        for child in &node.children {
            match child.kind {
                NodeKind::Method => {
                    let (name, params, body) = match child.children.as_slice() {
                        [name, params, body] => (name, params, body),
                        _ => return Err(malformed(child)),
                    };
                    let name = name.identifier_name().ok_or_else(|| malformed(name))?;
                    methods.insert(name.to_owned(), Rc::new(UwuFunction {
                        params: params.identifier_names(),
                        body: Rc::new(body.clone()),
                        closure: env.clone(),
                    }));
                }
                NodeKind::New => {
                    let (params, body) = two_children(child)?;
                    constructor = Some(Rc::new(Constructor {
                        params: params.identifier_names(),
                        body: Rc::new(body.clone()),
                    }));
                }
                // Control flow out of a class body has nowhere to go.
                _ => {
                    self.execute(child, &statics)?;
                }
            }
        }
        Ok(Value::Class(Rc::new(UwuClass {
            statics: statics.frame().clone(),
            methods: Rc::new(methods),
            constructor,
            closure: env.clone(),
        })))
    }

    fn instantiate(
        &mut self,
        class: &Rc<UwuClass>,
        args: Vec<ValueRef>,
        in_progress: &mut InProgress,
        line: usize,
    ) -> InterpretResult<Rc<UwuInstance>> {
        let identity = Rc::as_ptr(class);
        if !in_progress.insert(identity) {
            return Err(RuntimeError::new(line, RuntimeErrorKind::CircularInheritance));
        }
        let result = self.nested(line, |this| this.construct(class, args, in_progress));
        in_progress.remove(&identity);
        result
    }

    fn construct(&mut self, class: &UwuClass, args: Vec<ValueRef>, in_progress: &mut InProgress) -> InterpretResult<Rc<UwuInstance>> {
        let members = rcrc(Bindings::new());
        let mut inherited: Vec<Rc<MethodTable>> = Vec::new();
        if let Some(constructor) = &class.constructor {
            let mut frame = bind_params(&constructor.params, args);
            frame.define(WATASHI.to_owned(), rcrc(Value::Scope(members.clone())));
            let env = class.closure.nested_with(rcrc(frame));
            for statement in &constructor.body.children {
                if statement.kind != NodeKind::Extends {
                    if self.execute(statement, &env)?.is_some() {
                        break;
                    }
                    continue;
                }
                let (path, arguments) = two_children(statement)?;
                let parent = match &*self.resolve_path(path, &env, false)?.borrow() {
                    Value::Class(parent) => parent.clone(),
                    other => {
                        return Err(RuntimeError::new(
                            statement.line,
                            RuntimeErrorKind::ExtendNonClass(other.type_name()),
                        ));
                    }
                };
                let parent_args = self.evaluate_list(arguments, &env)?;
                let parent = self
                    .instantiate(&parent, parent_args, in_progress, statement.line)
                    .map_err(|e| e.called_at(format!("extend {}", path.path_string()), statement.line))?;
                for (name, slot) in parent.members.borrow().iter() {
                    let copy = slot.borrow().clone();
                    members.borrow_mut().define(name.clone(), rcrc(copy));
                }
                // The latest extend takes precedence over earlier ones.
                let mut stack: Vec<Rc<MethodTable>> = parent.methods.iter().cloned().collect();
                stack.append(&mut inherited);
                inherited = stack;
            }
        }
        Ok(Rc::new(UwuInstance {
            members,
            methods: NonEmpty::from((class.methods.clone(), inherited)),
        }))
    }

    fn load(&mut self, node: &Node, env: &Environment) -> InterpretResult<()> {
        let (expression, target) = two_children(node)?;
        let path = self.evaluate(expression, env)?.borrow().to_string();
        let file = loader::resolve(&path, &self.config.stdlib_dir, &self.base_dir);
        tracing::debug!(module = %path, file = %file.display(), "loading module");
        let root = loader::parse_file(&file).map_err(|kind| RuntimeError::new(node.line, kind))?;
        let base_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut module = Interpreter::new(self.config.clone(), self.console.clone()).with_base_dir(base_dir);
        let given = self
            .nested(node.line, |this| {
                module.depth = this.depth;
                module.run(&root)
            })
            .map_err(|e| e.called_at(format!("woad {}", path), node.line))?;
        let value = match given {
            Some(value) => value.borrow().clone(),
            None => Value::Scope(module.globals()),
        };
        let slot = self.resolve_path(target, env, true)?;
        *slot.borrow_mut() = value;
        Ok(())
    }
}

fn bind_params(params: &[String], args: Vec<ValueRef>) -> Bindings {
    let mut frame = Bindings::new();
    let mut args = args.into_iter();
    for param in params {
        frame.define(param.clone(), args.next().unwrap_or_else(|| rcrc(Value::Null)));
    }
    frame
}

fn two_children(node: &Node) -> InterpretResult<(&Node, &Node)> {
    match node.children.as_slice() {
        [a, b, ..] => Ok((a, b)),
        _ => Err(malformed(node)),
    }
}

fn malformed(node: &Node) -> RuntimeError {
    RuntimeError::new(node.line, RuntimeErrorKind::MalformedTree(format!("unexpected {}", node.kind)))
}
