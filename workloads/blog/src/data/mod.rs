//! Content models and the source they are read from.

mod article;
mod source;

pub use article::*;
pub use source::*;
