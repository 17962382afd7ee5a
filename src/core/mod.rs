pub mod constants;
pub mod network_config;
pub mod settings;
pub mod wallet;
pub mod chain;
pub mod rpc_base;
pub mod time_window;
pub mod storage;
pub mod uploader;
pub mod payload;
pub mod navigation;
pub mod guard;
pub mod orchestrator;

#[cfg(test)]
pub mod test_support;
