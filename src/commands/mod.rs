pub mod annotate;
pub mod mark;
pub mod probe;
pub mod scan;
