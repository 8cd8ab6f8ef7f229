pub mod config;
pub mod mach;
