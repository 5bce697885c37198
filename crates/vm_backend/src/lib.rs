#![cfg_attr(
    not(test),
    deny(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing,
        clippy::string_slice,
        clippy::panicking_unwrap,
        clippy::out_of_bounds_indexing,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
    )
)]
#![cfg_attr(not(test), warn(clippy::missing_panics_doc))]

//! Translator from the stack machine language to Hack assembly.
//!
//! The stack lives in RAM starting at `SP`. `LCL`, `ARG`, `THIS` and `THAT`
//! hold the bases of the current function's segments. A call lays down a
//! frame of five words under the callee's locals:
//!
//! `
//!     ARG -> arg 0 .. arg n-1
//!            return address
//!            saved LCL, ARG, THIS, THAT
//!     LCL -> local 0 .. local k-1
//!     SP  -> next free slot
//! `

pub mod code_writer;
pub mod command;
pub mod parser;
pub mod translator;

pub use command::{ArithmeticOp, Command, CommandKind, Segment};
pub use translator::{Bootstrap, BuildError, TranslateError, Translator, TranslatorOptions, build, translate};
