//! 推荐 cabinet 展示层
//!
//! 在已拉取的 profile 之上提供复制、分享、二维码导出等操作，
//! 以及返回给客户端的 JSON 视图。所有操作只产生提示，不向调用方抛错。

pub mod clipboard;
pub mod qr;
pub mod share;
pub mod view;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::referral::ReferralToken;

pub use clipboard::{Clipboard, MemoryClipboard};
#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
pub use share::{SharePayload, ShareTarget, UnavailableShare};
pub use view::{CabinetView, LINK_NOT_FOUND_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Failure,
}

/// 面向用户的临时提示
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            detail: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}

pub struct CabinetPresenter {
    token: ReferralToken,
    link: String,
    title: String,
    clipboard: Arc<dyn Clipboard>,
    share: Arc<dyn ShareTarget>,
}

impl CabinetPresenter {
    /// `link` 应为已规范化的绝对链接
    pub fn new(
        token: ReferralToken,
        link: impl Into<String>,
        title: impl Into<String>,
        clipboard: Arc<dyn Clipboard>,
        share: Arc<dyn ShareTarget>,
    ) -> Self {
        Self {
            token,
            link: link.into(),
            title: title.into(),
            clipboard,
            share,
        }
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn copy_link(&self) -> Notice {
        match self.clipboard.set_text(&self.link) {
            Ok(()) => {
                debug!("Referral link for {} copied ({})", self.token, self.clipboard.name());
                Notice::success("Link copied")
            }
            Err(e) => {
                warn!("Copying referral link for {} failed: {}", self.token, e);
                Notice::failure("Could not copy the link").with_detail(e.message())
            }
        }
    }

    /// 原生分享；不可用或失败时回退到复制
    pub async fn share_link(&self) -> Notice {
        if self.share.is_available() {
            let payload = SharePayload {
                title: self.title.clone(),
                url: self.link.clone(),
            };
            match self.share.share(&payload).await {
                Ok(()) => return Notice::success("Link shared"),
                Err(e) => {
                    debug!("Native share for {} failed, falling back to copy: {}", self.token, e);
                }
            }
        }
        self.copy_link()
    }

    /// 导出二维码到目录
    pub async fn export_qr(&self, dir: &Path) -> Notice {
        match qr::export_qr_file(&self.link, &self.token, dir).await {
            Ok(path) => {
                debug!("QR code for {} written to {}", self.token, path.display());
                Notice::success("QR code saved").with_detail(path.display().to_string())
            }
            Err(e) => {
                warn!("Exporting QR code for {} failed: {}", self.token, e);
                Notice::failure("Could not save the QR code").with_detail(e.message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ReferralError, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct FailingClipboard;

    impl Clipboard for FailingClipboard {
        fn set_text(&self, _text: &str) -> Result<()> {
            Err(ReferralError::clipboard("no display"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[derive(Default)]
    struct RecordingShare {
        fail: bool,
        shared: Mutex<Vec<SharePayload>>,
    }

    #[async_trait]
    impl ShareTarget for RecordingShare {
        fn is_available(&self) -> bool {
            true
        }

        async fn share(&self, payload: &SharePayload) -> Result<()> {
            if self.fail {
                return Err(ReferralError::share("user cancelled"));
            }
            self.shared.lock().push(payload.clone());
            Ok(())
        }
    }

    fn presenter(clipboard: Arc<dyn Clipboard>, share: Arc<dyn ShareTarget>) -> CabinetPresenter {
        CabinetPresenter::new(
            ReferralToken::parse("anna").unwrap(),
            "https://salon.example/ref/anna",
            "Spring",
            clipboard,
            share,
        )
    }

    #[test]
    fn test_copy_link() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let notice = presenter(clipboard.clone(), Arc::new(UnavailableShare)).copy_link();
        assert!(notice.is_success());
        assert_eq!(clipboard.content().as_deref(), Some("https://salon.example/ref/anna"));
    }

    #[test]
    fn test_copy_failure_is_notice() {
        let notice = presenter(Arc::new(FailingClipboard), Arc::new(UnavailableShare)).copy_link();
        assert_eq!(notice.kind, NoticeKind::Failure);
        assert_eq!(notice.detail.as_deref(), Some("no display"));
    }

    #[tokio::test]
    async fn test_share_uses_native_target() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let share = Arc::new(RecordingShare::default());
        let notice = presenter(clipboard.clone(), share.clone()).share_link().await;
        assert_eq!(notice, Notice::success("Link shared"));
        assert_eq!(share.shared.lock()[0].title, "Spring");
        assert!(clipboard.content().is_none());
    }

    #[tokio::test]
    async fn test_share_falls_back_to_copy() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let notice = presenter(clipboard.clone(), Arc::new(UnavailableShare))
            .share_link()
            .await;
        assert_eq!(notice, Notice::success("Link copied"));
        assert!(clipboard.content().is_some());

        let clipboard = Arc::new(MemoryClipboard::new());
        let share = Arc::new(RecordingShare {
            fail: true,
            ..Default::default()
        });
        let notice = presenter(clipboard.clone(), share).share_link().await;
        assert_eq!(notice, Notice::success("Link copied"));
    }

    #[tokio::test]
    async fn test_share_fallback_copy_failure() {
        let notice = presenter(Arc::new(FailingClipboard), Arc::new(UnavailableShare))
            .share_link()
            .await;
        assert_eq!(notice.kind, NoticeKind::Failure);
    }

    #[tokio::test]
    async fn test_export_qr() {
        let dir = tempfile::tempdir().unwrap();
        let notice = presenter(Arc::new(MemoryClipboard::new()), Arc::new(UnavailableShare))
            .export_qr(dir.path())
            .await;
        assert!(notice.is_success());
        let written = dir.path().join("referral-anna.svg");
        assert!(std::fs::read_to_string(written).unwrap().contains("<svg"));
    }

    #[tokio::test]
    async fn test_export_qr_failure_is_notice() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        // 目标目录是一个普通文件
        let notice = presenter(Arc::new(MemoryClipboard::new()), Arc::new(UnavailableShare))
            .export_qr(&blocker.join("sub"))
            .await;
        assert_eq!(notice.kind, NoticeKind::Failure);
    }
}
