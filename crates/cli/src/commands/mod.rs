pub mod ask;
pub mod config_cmd;
pub mod memory;
pub mod onboard;
