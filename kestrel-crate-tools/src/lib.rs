//! Kestrel 工具集
//!
//! 提供日志初始化等各 crate 共享的通用工具。

pub mod init_log;
