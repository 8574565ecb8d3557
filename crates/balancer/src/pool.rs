use std::collections::HashSet;

use ridehail_core::{DispatchError, DispatchResult};

/// 后端服务器池
///
/// 地址顺序在启动时固定。`cursor` 决定乘客路由的起始服务器，
/// `driver_counts` 与 `addresses` 一一对应。
#[derive(Debug, Clone)]
pub struct ServerPool {
    addresses: Vec<String>,
    cursor: usize,
    driver_counts: Vec<usize>,
}

impl ServerPool {
    pub fn new(addresses: Vec<String>) -> DispatchResult<Self> {
        if addresses.is_empty() {
            return Err(DispatchError::EmptyServerPool);
        }

        let mut seen = HashSet::new();
        for address in &addresses {
            if !seen.insert(address.as_str()) {
                return Err(DispatchError::Configuration(format!(
                    "服务器地址重复: {address}"
                )));
            }
        }

        let driver_counts = vec![0; addresses.len()];
        Ok(Self {
            addresses,
            cursor: 0,
            driver_counts,
        })
    }

    /// 从游标位置开始的完整地址列表，游标前进一位
    pub fn rotate(&mut self) -> Vec<String> {
        let mut ordered = Vec::with_capacity(self.addresses.len());
        ordered.extend_from_slice(&self.addresses[self.cursor..]);
        ordered.extend_from_slice(&self.addresses[..self.cursor]);
        self.cursor = (self.cursor + 1) % self.addresses.len();
        ordered
    }

    /// 选出司机数最少的服务器并立即计数，平局取列表中靠前的地址
    ///
    /// 返回地址和分配后的司机数。
    pub fn assign_least_loaded(&mut self) -> (String, usize) {
        let mut index = 0;
        for (i, count) in self.driver_counts.iter().enumerate() {
            if *count < self.driver_counts[index] {
                index = i;
            }
        }

        self.driver_counts[index] += 1;
        (self.addresses[index].clone(), self.driver_counts[index])
    }

    /// 释放一个司机名额，计数不会小于零
    pub fn release(&mut self, address: &str) -> DispatchResult<usize> {
        let index = self.position(address)?;
        let count = &mut self.driver_counts[index];
        *count = count.saturating_sub(1);
        Ok(*count)
    }

    pub fn driver_count(&self, address: &str) -> DispatchResult<usize> {
        Ok(self.driver_counts[self.position(address)?])
    }

    fn position(&self, address: &str) -> DispatchResult<usize> {
        self.addresses
            .iter()
            .position(|a| a == address)
            .ok_or_else(|| DispatchError::UnknownServer {
                address: address.to_string(),
            })
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// 各服务器当前司机数，按地址顺序
    pub fn loads(&self) -> Vec<(String, usize)> {
        self.addresses
            .iter()
            .cloned()
            .zip(self.driver_counts.iter().copied())
            .collect()
    }
}
