pub mod builtins;
pub mod config;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod value;
