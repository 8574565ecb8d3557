use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use ridehail_core::CallAuditor;

/// 默认审计日志文件
pub const DEFAULT_AUDIT_LOG: &str = "log.txt";

/// 追加写入文件的调用审计日志
///
/// 每行格式：
/// `[<时间>] <角色> calling method: <方法>` 和
/// `[<时间>] <角色> received response from method: <方法> - Response: <响应>`
pub struct FileAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, line: String) {
        let _guard = self.write_lock.lock().await;
        let result = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!(path = %self.path.display(), "写入审计日志失败: {}", e);
        }
    }
}

impl Default for FileAuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_LOG)
    }
}

/// 首字母大写，其余小写
fn display_role(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl CallAuditor for FileAuditLog {
    async fn before_call(&self, role: &str, method: &str, _request: &str) {
        let line = format!(
            "[{}] {} calling method: {}\n",
            Utc::now().to_rfc3339(),
            display_role(role),
            method
        );
        self.append(line).await;
    }

    async fn after_call(&self, role: &str, method: &str, response: &str) {
        let line = format!(
            "[{}] {} received response from method: {} - Response: {}\n",
            Utc::now().to_rfc3339(),
            display_role(role),
            method,
            response
        );
        self.append(line).await;
    }
}
