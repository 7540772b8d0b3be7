pub mod layout;
pub mod output;
