pub mod cluster;
pub mod convert;
pub mod file_io;

pub use cluster::*;
pub use convert::*;
pub use file_io::*;
