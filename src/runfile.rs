use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::ast::Node;
use crate::common::error::{SyntaxCause, SyntaxError, UwuResult};
use crate::config::Config;
use crate::interpreter::console::{SharedConsole, StdConsole};
use crate::interpreter::uwu_value::ValueRef;
use crate::interpreter::Interpreter;
use crate::line_source::FileSource;
use crate::parser::parse;

pub fn run_file(file: &Path, config: Config) -> UwuResult<Option<ValueRef>> {
    let console: SharedConsole = Rc::new(RefCell::new(StdConsole));
    run_file_with(file, Rc::new(config), console)
}

/// Parses and runs one script; relative `woad`s resolve next to it.
pub fn run_file_with(file: &Path, config: Rc<Config>, console: SharedConsole) -> UwuResult<Option<ValueRef>> {
    let root = parse_script(file)?;
    tracing::debug!(file = %file.display(), statements = root.children.len(), "running file");
    let base_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut interpreter = Interpreter::new(config, console).with_base_dir(base_dir);
    Ok(interpreter.run(&root)?)
}

/// The script's syntax tree, drawn with box connectors.
pub fn file_tree(file: &Path) -> UwuResult<String> {
    Ok(parse_script(file)?.pretty_print())
}

fn parse_script(file: &Path) -> Result<Node, SyntaxError> {
    let source = FileSource::open(file)
        .map_err(|e| SyntaxError { line: 0, cause: SyntaxCause::Io(format!("{}: {}", file.display(), e)) })?;
    parse(source)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::common::error::Error;
    use crate::interpreter::console::BufferConsole;

    use super::*;

    #[test]
    fn runs_a_script_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hewwo.uwu");
        fs::write(&file, "nuzzles gweets\nthe wowld teehee\npwease cawl pwint wif *hewwo wowld* UwU\n").unwrap();
        let console = Rc::new(RefCell::new(BufferConsole::default()));
        run_file_with(&file, Rc::new(Config::default()), console.clone()).unwrap();
        assert_eq!(console.borrow().output(), &["hewwo wowld".to_owned()]);
    }

    #[test]
    fn draws_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tree.uwu");
        fs::write(&file, "pwease give 5\n").unwrap();
        assert_eq!(
            file_tree(&file).unwrap(),
            "FILE\n└─GIVE\n  └─EXPWESSION\n    └─CONST_NUMBWER: 5",
        );
    }

    #[test]
    fn missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let console = Rc::new(RefCell::new(BufferConsole::default()));
        match run_file_with(&dir.path().join("nope.uwu"), Rc::new(Config::default()), console) {
            Err(Error::Syntax(SyntaxError { cause: SyntaxCause::Io(_), .. })) => {}
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }
}
