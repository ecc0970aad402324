pub mod data_structs;
pub mod exports;
pub mod io;
pub mod ops;
pub mod tools;
pub mod utils;
