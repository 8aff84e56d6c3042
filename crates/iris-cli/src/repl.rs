mod engine;

pub use engine::Repl;
