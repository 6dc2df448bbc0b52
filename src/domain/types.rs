// ==========================================
// FitLoop - 领域类型定义
// ==========================================
// 红线: 问题类别是封闭枚举,不接受任意字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 问题类别 (Issue Category)
// ==========================================
// 序列化格式: lowercase (与数据库/生成式输出一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Fit,  // 版型/尺码
    Care, // 洗护
}

impl IssueCategory {
    /// 从字符串解析（大小写不敏感）
    ///
    /// 未知类别返回 None,由调用方决定丢弃
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fit" => Some(IssueCategory::Fit),
            "care" => Some(IssueCategory::Care),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            IssueCategory::Fit => "fit",
            IssueCategory::Care => "care",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_category_from_str() {
        assert_eq!(IssueCategory::from_str("fit"), Some(IssueCategory::Fit));
        assert_eq!(IssueCategory::from_str(" CARE "), Some(IssueCategory::Care));
        assert_eq!(IssueCategory::from_str("quality"), None);
    }

    #[test]
    fn test_issue_category_serde_lowercase() {
        let json = serde_json::to_string(&IssueCategory::Fit).unwrap();
        assert_eq!(json, "\"fit\"");
        let parsed: IssueCategory = serde_json::from_str("\"care\"").unwrap();
        assert_eq!(parsed, IssueCategory::Care);
        assert!(serde_json::from_str::<IssueCategory>("\"Fit\"").is_err());
    }
}
