mod ws_channel;

pub use ws_channel::*;
