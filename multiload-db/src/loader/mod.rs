pub mod multi_load;

pub use multi_load::*;
