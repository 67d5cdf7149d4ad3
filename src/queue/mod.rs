//! 资源队列
//!
//! 链路的传输介质和节点的处理槽都是容量为 1 的独占资源：同一时刻只有一个占用者，
//! 其余请求按到达顺序（FIFO）排队。

mod slot;

pub use slot::Slot;
