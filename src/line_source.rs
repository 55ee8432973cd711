use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Pull-based supplier of source lines. Lines keep their terminator; the lexer trims.
pub trait LineSource {
    fn has_more(&self) -> bool;
    /// Returns the next line, or an empty string once the source is exhausted.
    fn next_line(&mut self) -> io::Result<String>;
    fn close(&mut self);
}

pub struct FileSource {
    reader: Option<BufReader<File>>,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(FileSource { reader: Some(BufReader::new(File::open(path)?)) })
    }
}

impl LineSource for FileSource {
    fn has_more(&self) -> bool { self.reader.is_some() }

    fn next_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if let Some(reader) = self.reader.as_mut() {
            if reader.read_line(&mut line)? == 0 {
                self.close();
            }
        }
        Ok(line)
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

/// In-memory lines. Cloning snapshots the read position, so a clone can re-lex the buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferSource {
    lines: Vec<String>,
    current: usize,
}

impl BufferSource {
    pub fn new(lines: Vec<String>) -> Self { BufferSource { lines, current: 0 } }

    pub fn from_text(text: &str) -> Self {
        BufferSource::new(text.lines().map(|e| format!("{}\n", e)).collect())
    }

    pub fn push_line<S: Into<String>>(&mut self, line: S) {
        self.lines.push(line.into());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.current = 0;
    }

    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
}

impl LineSource for BufferSource {
    fn has_more(&self) -> bool { self.current < self.lines.len() }

    fn next_line(&mut self) -> io::Result<String> {
        Ok(match self.lines.get(self.current) {
            Some(line) => {
                self.current += 1;
                line.clone()
            }
            None => String::new(),
        })
    }

    fn close(&mut self) {
        self.current = self.lines.len();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn buffer_is_exhausted_after_all_lines() {
        let mut source = BufferSource::from_text("a\nb");
        assert_eq!(source.next_line().unwrap(), "a\n");
        assert!(source.has_more());
        assert_eq!(source.next_line().unwrap(), "b\n");
        assert!(!source.has_more());
        assert_eq!(source.next_line().unwrap(), "");
        source.clear();
        source.push_line("c\n");
        assert!(source.has_more());
        assert_eq!(source.next_line().unwrap(), "c\n");
    }

    #[test]
    fn file_closes_itself_on_end_of_input() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "pwease\n").unwrap();
        let mut source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.next_line().unwrap(), "pwease\n");
        assert!(source.has_more());
        assert_eq!(source.next_line().unwrap(), "");
        assert!(!source.has_more());
    }
}
