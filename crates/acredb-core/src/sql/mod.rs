//! SQL primitives: identifier grammar, bound values, and the positional
//! fragment builder. This is the injection boundary of the engine — caller
//! input only ever leaves this module as a bound parameter, and identifiers
//! only enter query text after passing the grammar in [`ident`].

pub mod fragment;
pub mod ident;
pub mod value;

pub use fragment::{FragmentBuilder, Statement};
pub use value::SqlValue;
