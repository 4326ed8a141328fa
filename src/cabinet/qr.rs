use std::path::{Path, PathBuf};

use qrcode::QrCode;
use qrcode::render::svg;

use crate::errors::{ReferralError, Result};
use crate::referral::ReferralToken;

const QR_MIN_DIMENSION: u32 = 256;

/// 把链接渲染为 SVG 二维码
pub fn render_qr_svg(link: &str) -> Result<String> {
    let code = QrCode::new(link.as_bytes()).map_err(|e| ReferralError::qr_code(e.to_string()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .quiet_zone(true)
        .build())
}

/// 导出文件名：`referral-{token}.svg`，token 经百分号编码，不同 token 不会映射到同一文件
pub fn qr_file_name(token: &ReferralToken) -> String {
    format!("referral-{}.svg", urlencoding::encode(token.as_str()))
}

/// 写入二维码文件，返回文件路径
pub async fn export_qr_file(link: &str, token: &ReferralToken, dir: &Path) -> Result<PathBuf> {
    let svg = render_qr_svg(link)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(qr_file_name(token));
    tokio::fs::write(&path, svg).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_svg() {
        let svg = render_qr_svg("https://salon.example/ref/anna").unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let token = ReferralToken::parse("a/b c").unwrap();
        assert_eq!(qr_file_name(&token), "referral-a%2Fb%20c.svg");

        let slash = qr_file_name(&ReferralToken::parse("a/b").unwrap());
        let underscore = qr_file_name(&ReferralToken::parse("a_b").unwrap());
        assert_eq!(underscore, "referral-a_b.svg");
        assert_ne!(slash, underscore);
    }
}
