//! 容量为 1 的 FIFO 资源

use std::collections::VecDeque;

#[derive(Debug)]
pub struct Slot<T> {
    current: Option<T>,
    waiting: VecDeque<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            current: None,
            waiting: VecDeque::new(),
        }
    }
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求占用：空闲时立即成为占用者并返回 true，否则排队并返回 false。
    pub fn request(&mut self, item: T) -> bool {
        if self.current.is_none() {
            self.current = Some(item);
            true
        } else {
            self.waiting.push_back(item);
            false
        }
    }

    /// 释放当前占用者并返回它；队首的等待者（若有）随即成为新的占用者。
    pub fn release(&mut self) -> Option<T> {
        let done = self.current.take();
        self.current = self.waiting.pop_front();
        done
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// 排队等待的请求数（不含占用者）
    pub fn queued(&self) -> usize {
        self.waiting.len()
    }
}
