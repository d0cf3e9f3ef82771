pub mod inputs;
pub mod table;
