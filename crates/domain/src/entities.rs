use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 行程状态
///
/// `Requested` 只在创建行程的同一临界区内存在，外部永远观察不到。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Requested,
    WaitingForAcceptance,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::WaitingForAcceptance => "waiting_for_acceptance",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    /// 终态行程不会再发生任何状态变化
    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// 司机在该状态下占用此行程
    pub fn holds_driver(&self) -> bool {
        matches!(
            self,
            RideStatus::WaitingForAcceptance | RideStatus::InProgress
        )
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(RideStatus::Requested),
            "waiting_for_acceptance" => Ok(RideStatus::WaitingForAcceptance),
            "in_progress" => Ok(RideStatus::InProgress),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" => Ok(RideStatus::Cancelled),
            _ => Err(format!("Invalid ride status: {s}")),
        }
    }
}

/// 司机状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Available,
    Busy,
}

/// 行程记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: String,
    pub rider_id: String,
    pub pickup_location: String,
    pub destination: String,
    pub assigned_driver: Option<String>,
    pub status: RideStatus,
    /// 拒绝或超时未响应的司机，永远不会再被指派此行程
    pub rejected_drivers: HashSet<String>,
    pub requested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// 创建新的行程，分配唯一ID
    pub fn new(rider_id: String, pickup_location: String, destination: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            rider_id,
            pickup_location,
            destination,
            assigned_driver: None,
            status: RideStatus::Requested,
            rejected_drivers: HashSet::new(),
            requested_at: now,
            updated_at: now,
        }
    }

    pub fn is_assigned_to(&self, driver_id: &str) -> bool {
        self.assigned_driver.as_deref() == Some(driver_id)
    }

    pub fn has_rejected(&self, driver_id: &str) -> bool {
        self.rejected_drivers.contains(driver_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
