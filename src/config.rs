use std::path::PathBuf;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where `woad *#name*` looks for `name.uwu`.
    pub stdlib_dir: PathBuf,
    /// Nesting limit for function, method, constructor and module calls.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stdlib_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("stdlib"),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
