//! 拓扑构建
//!
//! 生成运行参数中的网络描述（无向边列表），供测试和命令行实验使用。

pub mod line;
pub mod ring;
