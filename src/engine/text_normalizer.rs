// ==========================================
// FitLoop - 文本规范化
// ==========================================
// 职责: 小写化 / 去除特殊字符 / 空白折叠
// 红线: 纯函数,永不失败 (空输入返回空串)
// ==========================================

/// 除字母数字、下划线、空白外额外保留的标点
const KEPT_PUNCTUATION: &[char] = &['-', '.', ',', '!', '?'];

// ==========================================
// TextNormalizer - 反馈文本规范化器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 规范化单条反馈文本
    ///
    /// # 规则
    /// 1. 小写化
    /// 2. 去除除 [字母数字 _ 空白 - . , ! ?] 以外的所有字符 (含 emoji)
    /// 3. 连续空白折叠为单个空格,去掉首尾空白
    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let lowered = text.to_lowercase();
        let kept: String = lowered
            .chars()
            .filter(|c| is_kept_char(*c))
            .collect();

        kept.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// 规范化可能缺失的文本 (None -> 空串)
    pub fn normalize_opt(&self, text: Option<&str>) -> String {
        text.map(|t| self.normalize(t)).unwrap_or_default()
    }
}

fn is_kept_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || KEPT_PUNCTUATION.contains(&c)
}
