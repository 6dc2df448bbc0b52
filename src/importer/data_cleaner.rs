// ==========================================
// FitLoop - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 安全整数解析
// ==========================================

use crate::importer::file_parser::RawRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct DataCleaner;

impl DataCleaner {
    /// 去除首尾空白
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 空白串视为 None
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 安全整数解析;缺失或非法时返回默认值
    pub fn safe_int(&self, value: Option<&str>, default: i32) -> i32 {
        value
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(default)
    }

    /// 读取文本字段 (缺失视为空串)
    pub fn text_field(&self, record: &RawRecord, field: &str) -> String {
        record
            .get(field)
            .map(|v| self.clean_text(v))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_int() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.safe_int(Some(" 4 "), 3), 4);
        assert_eq!(cleaner.safe_int(Some("4.5"), 3), 3);
        assert_eq!(cleaner.safe_int(Some(""), 3), 3);
        assert_eq!(cleaner.safe_int(None, 3), 3);
    }

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("  ")), None);
        assert_eq!(cleaner.normalize_null(Some(" x ")), Some("x".to_string()));
        assert_eq!(cleaner.normalize_null(None), None);
    }

    #[test]
    fn test_text_field_missing() {
        let cleaner = DataCleaner;
        let mut record = RawRecord::new();
        record.insert("review_text".to_string(), " ok ".to_string());
        assert_eq!(cleaner.text_field(&record, "review_text"), "ok");
        assert_eq!(cleaner.text_field(&record, "date"), "");
    }
}
