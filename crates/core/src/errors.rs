use thiserror::Error;

/// 派单系统错误类型定义
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("行程未找到: {ride_id}")]
    RideNotFound { ride_id: String },

    #[error("司机 {driver_id} 不是行程 {ride_id} 的指派司机")]
    WrongDriver { ride_id: String, driver_id: String },

    #[error("行程 {ride_id} 当前状态 {status} 不允许该操作")]
    InvalidRideState { ride_id: String, status: String },

    #[error("行程 {ride_id} 的接单时限已到期")]
    AcceptanceExpired { ride_id: String },

    #[error("没有可用的司机")]
    NoDriversAvailable,

    #[error("服务器池为空")]
    EmptyServerPool,

    #[error("未知的服务器地址: {address}")]
    UnknownServer { address: String },

    #[error("锁已损坏: {0}")]
    LockPoisoned(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误分类，对应调用方可以观察到的失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    StateConflict,
    ResourceExhausted,
    Timeout,
    Internal,
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::RideNotFound { .. } | DispatchError::UnknownServer { .. } => {
                ErrorKind::NotFound
            }
            DispatchError::WrongDriver { .. } | DispatchError::InvalidRideState { .. } => {
                ErrorKind::StateConflict
            }
            DispatchError::NoDriversAvailable | DispatchError::EmptyServerPool => {
                ErrorKind::ResourceExhausted
            }
            DispatchError::AcceptanceExpired { .. } => ErrorKind::Timeout,
            DispatchError::LockPoisoned(_)
            | DispatchError::Configuration(_)
            | DispatchError::Network(_)
            | DispatchError::Serialization(_)
            | DispatchError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 是否为行程状态机层面的拒绝（而不是系统故障）
    pub fn is_rejection(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }

    pub fn lock_poisoned(what: &str) -> Self {
        DispatchError::LockPoisoned(what.to_string())
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        DispatchError::Serialization(e.to_string())
    }
}

/// 统一的Result类型
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
