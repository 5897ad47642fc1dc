pub mod js;
mod source;

pub use source::{LiveDocument, launch};
