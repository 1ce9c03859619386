//! Fortran syntax engine
//!
//! This module provides the lexing and folding machinery:
//! - Byte classification and keyword lists
//! - The style cursor and the tokenizer built on it
//! - The fold analyzer and its comment-run window
//! - An incremental driver over an in-memory document

pub mod charclass;
pub mod comments;
pub mod context;
pub mod document;
pub mod fold;
pub mod lexer;
pub mod manager;
pub mod style;
pub mod tokens;
pub mod wordlist;

pub use document::{Accessor, Document};
pub use fold::{FoldFlags, FoldLevel};
pub use lexer::tokenize;
pub use manager::{FortranLexer, SourceFormat, SyntaxManager};
pub use style::{Color, Span, Style};
pub use tokens::StyleCode;
pub use wordlist::{KeywordSets, WordList};
