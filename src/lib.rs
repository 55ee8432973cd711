use std::sync::Once;

pub mod ast;
pub mod common;
pub mod config;
pub mod interpreter;
pub mod lexer;
pub mod line_source;
pub mod parser;
pub mod prompt;
pub mod runfile;

static TRACING_INIT: Once = Once::new();

/// Installs a stderr subscriber, but only when `RUST_LOG` is set, e.g. `RUST_LOG=rsuwu=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
