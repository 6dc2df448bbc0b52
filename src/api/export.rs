// ==========================================
// FitLoop - Markdown 导出
// ==========================================

use crate::api::dto::{ProductDetailView, DISPLAY_TIME_FORMAT};
use chrono::NaiveDateTime;
use std::fmt::Write;

const NO_GUIDANCE: &str = "No guidance available";
const NO_CARE_TIP: &str = "No care tips available";

/// 导出文件名
pub fn export_file_name(product_id: &str) -> String {
    format!("product_{}_analysis.md", product_id)
}

/// 渲染商品详情为 Markdown
pub fn render_markdown(detail: &ProductDetailView, generated_at: NaiveDateTime) -> String {
    let size_guidance = non_empty_or(&detail.generated_copy.size_guidance, NO_GUIDANCE);
    let care_tip = non_empty_or(&detail.generated_copy.care_tip, NO_CARE_TIP);

    let mut out = String::new();
    // String 写入不会失败
    let _ = writeln!(out, "# Product {}", detail.product_id);
    let _ = writeln!(out);
    let _ = writeln!(out, "**Risk Score:** {}", detail.risk_score);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Size Guidance");
    let _ = writeln!(out, "{}", size_guidance);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Care Tip");
    let _ = writeln!(out, "{}", care_tip);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Issues Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Descriptor | Category | Body Area | Frequency % | Severity |");
    let _ = writeln!(out, "|------------|----------|-----------|-------------|----------|");

    for issue in &detail.issues {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1}% | {:.2} |",
            issue.descriptor,
            issue.issue_category,
            issue.body_area,
            issue.frequency_pct,
            issue.severity
        );
    }

    if detail.issues.is_empty() {
        let _ = writeln!(out, "| No issues found | - | - | - | - |");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = write!(
        out,
        "*Generated at: {}*",
        generated_at.format(DISPLAY_TIME_FORMAT)
    );

    out
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
