//! Static checker for a small language with classes, unions, generics,
//! patterns and closures.
//!
//! Build a [`Program`] (by hand with [`ProgramBuilder`] or from a parser of
//! your own), then run [`type_check`]. User mistakes come back as
//! [`Diagnostic`]s on the [`CheckedProgram`]; a [`CompileError`] means the
//! tree itself was inconsistent or the options could not be loaded.
//!
//! ```rust
//! use reef::ast::builder::ProgramBuilder;
//! use reef::{type_check, CheckerOptions};
//!
//! let mut b = ProgramBuilder::new();
//! let one = b.int(1);
//! let x = b.declare("x", one);
//! b.push(x);
//! let program = b.finish();
//!
//! let checked = type_check(&program, &CheckerOptions::default()).unwrap();
//! assert!(checked.is_ok());
//! assert_eq!(checked.declared_variable(x).map(|v| v.name.as_str()), Some("x"));
//! ```

pub mod span;
pub mod diagnostics;
pub mod manifest;
pub mod ast;
pub mod visit;
pub mod typeck;

pub use ast::builder::ProgramBuilder;
pub use ast::Program;
pub use diagnostics::{CompileError, Diagnostic, ErrorCategory, TypeError};
pub use manifest::CheckerOptions;
pub use typeck::{type_check, type_check_with, CheckedProgram};
