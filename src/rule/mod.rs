//! Rule tree data model and operator catalog
//!
//! A permission rule is a tree of AND/OR/NOT groups whose leaves are column
//! conditions and correlated `_exists` clauses. This module also compiles
//! trees to boolean expressions and parses existing expressions back.

mod ast;
pub mod compile;
pub mod operator;
pub mod parser;


pub use ast::*;
pub use compile::compile;
pub use operator::*;
pub use parser::parse;
