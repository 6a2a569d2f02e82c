pub mod catalog;
pub mod cli;
pub mod configs;
pub mod console;
pub mod item;
