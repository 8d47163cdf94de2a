//! Staging log output
//!
//! Follows the legacy buildpack log conventions: step headers prefixed
//! with an arrow, detail lines indented beneath them. Colour is applied
//! by `console` only when writing to a terminal.

mod output;

pub use output::{detail, failure, section, warning};
