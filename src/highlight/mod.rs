pub mod normalize;
pub mod tokens;
pub mod pattern;
pub mod scan;
pub mod annotate;
pub mod style;

pub use normalize::*;
pub use tokens::*;
pub use pattern::*;
pub use scan::*;
pub use annotate::*;
pub use style::*;

#[cfg(test)]
mod tests;
