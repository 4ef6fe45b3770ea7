pub mod composing;
pub mod dict;
pub mod letter;
pub mod search;
pub mod settings;
pub mod word;
