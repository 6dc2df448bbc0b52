// ==========================================
// FitLoop - 自由文本中的 JSON 片段定位
// ==========================================
// 职责: 在模型输出中定位第一个可解码的 JSON 数组/对象
// 红线: 扫描整段响应,不按行锚定;字符串字面量内的括号不计数
// 红线: 配平但无法解码的片段 (如正文里的 "[4 texts]") 跳过,继续尝试后续片段
// ==========================================

use serde::de::DeserializeOwned;

/// 按起点顺序列出所有配平的 `[ ... ]` 片段
pub fn json_array_candidates(text: &str) -> impl Iterator<Item = &str> {
    balanced_spans(text, '[', ']')
}

/// 按起点顺序列出所有配平的 `{ ... }` 片段
pub fn json_object_candidates(text: &str) -> impl Iterator<Item = &str> {
    balanced_spans(text, '{', '}')
}

/// 解码第一个可解码为 `T` 的 JSON 数组
///
/// # 返回
/// - None: 响应中没有配平的数组片段
/// - Some(Ok(T)): 第一个解码成功的片段
/// - Some(Err(e)): 所有片段都解码失败,e 为第一个片段的错误
pub fn decode_first_array<T: DeserializeOwned>(text: &str) -> Option<Result<T, serde_json::Error>> {
    decode_first(json_array_candidates(text))
}

/// 解码第一个可解码为 `T` 的 JSON 对象,返回约定同 decode_first_array
pub fn decode_first_object<T: DeserializeOwned>(
    text: &str,
) -> Option<Result<T, serde_json::Error>> {
    decode_first(json_object_candidates(text))
}

fn decode_first<'a, T: DeserializeOwned>(
    candidates: impl Iterator<Item = &'a str>,
) -> Option<Result<T, serde_json::Error>> {
    let mut first_err = None;
    for span in candidates {
        match serde_json::from_str::<T>(span) {
            Ok(value) => return Some(Ok(value)),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    first_err.map(Err)
}

/// 从每个 `open` 起点尝试配平,依次产出成功的片段
///
/// 起点处配平失败 (括号未闭合) 时继续尝试下一个起点
fn balanced_spans(text: &str, open: char, close: char) -> impl Iterator<Item = &str> {
    let mut search_from = 0;
    std::iter::from_fn(move || {
        while let Some(offset) = text[search_from..].find(open) {
            let start = search_from + offset;
            search_from = start + open.len_utf8();
            if let Some(end) = balanced_end(text, start, open, close) {
                return Some(&text[start..end]);
            }
        }
        None
    })
}

/// 返回配平片段的结束字节位置 (不含)
fn balanced_end(text: &str, start: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn first_array(text: &str) -> Option<&str> {
        json_array_candidates(text).next()
    }

    #[test]
    fn test_find_array_in_prose() {
        let text = "Here you go:\n```json\n[{\"a\": 1}, {\"b\": [2, 3]}]\n```\nDone.";
        assert_eq!(first_array(text), Some("[{\"a\": 1}, {\"b\": [2, 3]}]"));
    }

    #[test]
    fn test_brackets_inside_strings_ignored() {
        let text = r#"[{"note": "size ] chart [x"}] trailing ]"#;
        assert_eq!(first_array(text), Some(r#"[{"note": "size ] chart [x"}]"#));
    }

    #[test]
    fn test_unbalanced_start_skipped() {
        let text = "note [unclosed then [1, 2]";
        // 第一个 '[' 从未闭合到 depth 0 -> 尝试下一个起点
        assert_eq!(first_array(text), Some("[1, 2]"));
    }

    #[test]
    fn test_multiline_array() {
        let text = "[\n  {\"x\": 1},\n  {\"y\": 2}\n]";
        assert_eq!(first_array(text), Some(text));
    }

    #[test]
    fn test_no_json() {
        assert_eq!(first_array("no json here"), None);
        assert_eq!(json_object_candidates("still none ]").next(), None);
        assert!(decode_first_array::<Vec<Value>>("no json here").is_none());
    }

    #[test]
    fn test_candidates_in_start_order() {
        let text = "see [4 texts] then [[1], [2]]";
        let spans: Vec<&str> = json_array_candidates(text).collect();
        assert_eq!(spans, vec!["[4 texts]", "[[1], [2]]", "[1]", "[2]"]);
    }

    #[test]
    fn test_decode_skips_prose_brackets() {
        let text = "Based on the feedback [4 texts], here are the issues:\n[{\"a\": 1}]";
        let decoded: Vec<Value> = decode_first_array(text).unwrap().unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0]["a"], 1);
    }

    #[test]
    fn test_decode_reports_error_when_nothing_decodes() {
        let result = decode_first_array::<Vec<Value>>("only [prose] and [more prose]");
        assert!(matches!(result, Some(Err(_))));
    }

    #[test]
    fn test_find_object() {
        let text = "Sure! {\"size_guidance\": \"Size up {if between}\", \"care_tip\": \"\"} thanks";
        assert_eq!(
            json_object_candidates(text).next(),
            Some("{\"size_guidance\": \"Size up {if between}\", \"care_tip\": \"\"}")
        );
    }

    #[test]
    fn test_decode_object_skips_prose_braces() {
        let text = "Guidance for {product P1}: {\"size_guidance\": \"Size up.\"}";
        let decoded: Value = decode_first_object(text).unwrap().unwrap();
        assert_eq!(decoded["size_guidance"], "Size up.");
    }

    #[test]
    fn test_multibyte_prefix() {
        let text = "结果：[1]";
        assert_eq!(first_array(text), Some("[1]"));
    }
}
