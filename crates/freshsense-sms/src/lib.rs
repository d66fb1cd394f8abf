mod dispatcher;

pub use dispatcher::{TextBeeConfig, TextBeeDispatcher};
