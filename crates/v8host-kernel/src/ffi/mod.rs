//! C ABI for host loaders

pub mod bridge;

pub use bridge::v8host_init_module;
