use std::cell::RefCell;
use std::io;
use std::io::{BufRead, Write};
use std::rc::Rc;

use crate::common::error::{Error, UwuResult};
use crate::common::utils::rcrc;
use crate::config::Config;
use crate::interpreter::console::{SharedConsole, StdConsole};
use crate::interpreter::environment::{Bindings, Frame};
use crate::interpreter::uwu_value::ValueRef;
use crate::interpreter::Interpreter;
use crate::line_source::BufferSource;
use crate::parser::parse;

const PROMPT: &str = "ଘ(੭ ˘ ᵕ˘)━☆ﾟ.*･｡ﾟᵕ꒳ᵕ~ ";
const CONTINUATION_PROMPT: &str = "ଘ(੭ ˘ ᵕ˘)━☆ﾟ.*･｡ﾟᵕ꒳ᵕ~ ~> ";

#[derive(Debug)]
pub enum Status {
    /// The buffered input ends mid-statement.
    Incomplete,
    Ran(Option<ValueRef>),
}

/// Interactive state: the lines of the statement being typed and the globals every input
/// runs against.
pub struct Session {
    buffer: BufferSource,
    globals: Frame,
    config: Rc<Config>,
    console: SharedConsole,
}

impl Session {
    pub fn new(config: Rc<Config>, console: SharedConsole) -> Self {
        Session { buffer: BufferSource::default(), globals: rcrc(Bindings::new()), config, console }
    }

    pub fn is_continuing(&self) -> bool { !self.buffer.is_empty() }

    /// Adds a line and re-parses everything buffered so far; runs it once it parses.
    pub fn feed<S: Into<String>>(&mut self, line: S) -> UwuResult<Status> {
        self.buffer.push_line(line);
        let root = match parse(self.buffer.clone()) {
            Err(e) if e.is_unexpected_eof() => return Ok(Status::Incomplete),
            result => {
                self.buffer.clear();
                result?
            }
        };
        let mut interpreter = Interpreter::with_globals(
            self.config.clone(),
            self.console.clone(),
            self.globals.clone(),
        );
        Ok(Status::Ran(interpreter.run(&root)?))
    }
}

pub fn describe(error: &Error) -> String {
    match error {
        Error::Syntax(e) => format!("{} (≧д≦ヾ)", e),
        Error::Runtime(e) => format!("Oh nyo! Wuntime exception: {} (≧д≦ヾ)", e),
    }
}

pub fn run_prompt(config: Config) -> io::Result<()> {
    let console: SharedConsole = Rc::new(RefCell::new(StdConsole));
    let mut session = Session::new(Rc::new(config), console.clone());
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("Quit with Ctrl+D");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{}", if session.is_continuing() { CONTINUATION_PROMPT } else { PROMPT });
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        if let Err(e) = session.feed(line.as_str()) {
            tracing::debug!(error = ?e, "input failed");
            console.borrow_mut().write_line(&describe(&e))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::console::BufferConsole;
    use crate::interpreter::result::RuntimeErrorKind;

    use super::*;

    fn session() -> (Session, Rc<RefCell<BufferConsole>>) {
        let console = Rc::new(RefCell::new(BufferConsole::default()));
        (Session::new(Rc::new(Config::default()), console.clone()), console)
    }

    #[test]
    fn bindings_persist_between_inputs() {
        let (mut session, console) = session();
        session.feed("pwease set x twoo 2").unwrap();
        session.feed("pwease cawl pwint wif pwoduct wif x and 21 UwU").unwrap();
        assert_eq!(console.borrow().output(), &["42".to_owned()]);
    }

    #[test]
    fn rebound_builtin_names_persist_between_inputs() {
        let (mut session, console) = session();
        session.feed("pwease set sum twoo 5").unwrap();
        session.feed("pwease cawl pwint wif sum UwU").unwrap();
        assert_eq!(console.borrow().output(), &["5".to_owned()]);
    }

    #[test]
    fn incomplete_input_waits_for_more_lines() {
        let (mut session, console) = session();
        assert!(matches!(session.feed("pwease set f twoo fwunction").unwrap(), Status::Incomplete));
        assert!(session.is_continuing());
        assert!(matches!(session.feed("  pwease give 3").unwrap(), Status::Incomplete));
        assert!(matches!(session.feed("onegaishimasu").unwrap(), Status::Ran(None)));
        assert!(!session.is_continuing());
        session.feed("pwease cawl pwint wif f OwO UwU").unwrap();
        assert_eq!(console.borrow().output(), &["3".to_owned()]);
    }

    #[test]
    fn errors_reset_the_buffer() {
        let (mut session, _) = session();
        let error = session.feed("pwease set x *oops").unwrap_err();
        assert!(describe(&error).ends_with("(≧д≦ヾ)"));
        assert!(!session.is_continuing());
        match session.feed("pwease cawl nope OwO").unwrap_err() {
            Error::Runtime(e) => assert_eq!(e.kind, RuntimeErrorKind::UnknownIdentifier("nope".into())),
            e => panic!("expected a runtime error, got {:?}", e),
        }
        assert!(matches!(session.feed("pwease give 1").unwrap(), Status::Ran(Some(_))));
    }
}
