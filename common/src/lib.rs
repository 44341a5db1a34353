pub mod descriptor;
pub mod error;
pub mod instruction;
pub mod jtype;
pub mod utils;
