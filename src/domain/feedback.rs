// ==========================================
// FitLoop - 反馈数据领域模型
// ==========================================
// 职责: 评价记录 / 退货记录,以及按商品分组的反馈文本
// 红线: 核心只读反馈文本,不修改
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 评分解析失败时的默认值
pub const DEFAULT_RATING: i32 = 3;

// ==========================================
// ReviewRecord - 评价记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub product_id: String,
    pub review_text: String,
    pub rating: i32,
    pub date: String,
}

// ==========================================
// ReturnRecord - 退货记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub product_id: String,
    pub return_reason_text: String,
    pub condition_flag: String,
    pub date: String,
}

/// 按商品分组的反馈文本 (product_id -> texts)
///
/// BTreeMap 保证批处理顺序稳定
pub type FeedbackByProduct = BTreeMap<String, Vec<String>>;

/// 合并评价与退货文本: 每个商品先评价后退货,保持插入顺序
pub fn group_feedback(reviews: &[ReviewRecord], returns: &[ReturnRecord]) -> FeedbackByProduct {
    let mut grouped: FeedbackByProduct = BTreeMap::new();

    for review in reviews {
        grouped
            .entry(review.product_id.clone())
            .or_default()
            .push(review.review_text.clone());
    }

    for ret in returns {
        grouped
            .entry(ret.product_id.clone())
            .or_default()
            .push(ret.return_reason_text.clone());
    }

    grouped
}
