mod codegen;
mod instruction;
mod label;
mod method;

pub use codegen::Codegen;
pub use instruction::{Field, Instruction, MethodRef};
pub use label::Label;
pub use method::{Method, ENTRY_POINT};
