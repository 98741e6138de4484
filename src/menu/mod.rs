pub mod command;
pub mod dispatcher;
pub mod input;
pub mod output;

pub use dispatcher::Dispatcher;
