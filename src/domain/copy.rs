// ==========================================
// FitLoop - 导购文案领域模型
// ==========================================
// 红线: size_guidance <= 300 字符, care_tip <= 200 字符
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const SIZE_GUIDANCE_MAX_CHARS: usize = 300;
pub const CARE_TIP_MAX_CHARS: usize = 200;

// ==========================================
// AdvisoryCopy - 尺码建议 / 护理提示
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryCopy {
    pub product_id: String,
    pub size_guidance: String, // 尺码建议
    pub care_tip: String,      // 护理提示
    pub generated_at: NaiveDateTime,
}

impl AdvisoryCopy {
    /// 构造文案,并按字符数截断到上限
    pub fn new(
        product_id: &str,
        size_guidance: &str,
        care_tip: &str,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            product_id: product_id.to_string(),
            size_guidance: truncate_chars(size_guidance, SIZE_GUIDANCE_MAX_CHARS),
            care_tip: truncate_chars(care_tip, CARE_TIP_MAX_CHARS),
            generated_at,
        }
    }

    /// 空文案 (无相关问题)
    pub fn empty(product_id: &str, generated_at: NaiveDateTime) -> Self {
        Self::new(product_id, "", "", generated_at)
    }

    pub fn is_empty(&self) -> bool {
        self.size_guidance.is_empty() && self.care_tip.is_empty()
    }
}

/// 按字符(而非字节)截断,避免切断多字节字符
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
