//! fortfold - incremental Fortran styling and code folding
//!
//! Classifies every byte of Fortran source (fixed or free layout) into a
//! style code and assigns each line a fold level, restarting cheaply after
//! edits.

pub mod config;
pub mod error;
pub mod render;
pub mod syntax;

pub use config::Config;
pub use error::{FortfoldError, Result};
pub use syntax::{
    Accessor, Document, FoldFlags, FoldLevel, FortranLexer, KeywordSets, SourceFormat, StyleCode,
    SyntaxManager,
};
