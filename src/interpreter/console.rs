use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::io::{BufRead, Write};
use std::rc::Rc;

/// Where `pwint` writes and `nani` reads.
pub trait Console {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
    /// Shows `prompt` and reads one line without its terminator; empty at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

pub type SharedConsole = Rc<RefCell<dyn Console>>;

pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{}", line)
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_owned())
    }
}

/// Scripted input and captured output.
#[derive(Debug, Default)]
pub struct BufferConsole {
    input: VecDeque<String>,
    output: Vec<String>,
    prompts: Vec<String>,
}

impl BufferConsole {
    pub fn new<S: Into<String>>(input: Vec<S>) -> Self {
        BufferConsole { input: input.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    pub fn output(&self) -> &[String] { &self.output }

    pub fn prompts(&self) -> &[String] { &self.prompts }
}

impl Console for BufferConsole {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.output.push(line.to_owned());
        Ok(())
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_owned());
        Ok(self.input.pop_front().unwrap_or_default())
    }
}
