pub mod draw;
pub mod spec;

pub use draw::*;
pub use spec::*;
