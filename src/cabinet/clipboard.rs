use parking_lot::Mutex;

use crate::errors::Result;

/// 剪贴板抽象
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// 进程内剪贴板，记录最后一次写入
#[derive(Default)]
pub struct MemoryClipboard {
    content: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<String> {
        self.content.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        *self.content.lock() = Some(text.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// 系统剪贴板（arboard）
#[cfg(feature = "clipboard")]
pub struct SystemClipboard;

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        use crate::errors::ReferralError;

        // arboard::Clipboard 不是 Sync，每次写入时打开
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ReferralError::clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ReferralError::clipboard(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "system"
    }
}
