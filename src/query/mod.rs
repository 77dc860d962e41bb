pub mod ast;
pub mod cache;
pub mod expander;
pub mod parser;
pub mod validator;
