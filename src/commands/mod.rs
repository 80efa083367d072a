/// Interactive chat loop.
pub mod chat;
/// `config check` subcommand.
pub mod config;
