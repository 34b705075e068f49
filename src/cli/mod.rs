pub mod config_cmd;
pub mod export;
pub mod output;
pub mod renderer;
pub mod report_cmd;
