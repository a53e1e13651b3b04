// ==========================================
// GMAO 维护数据核心 - 模型响应解析
// ==========================================
// 顺序: 直接解析 JSON 数组 → 截取第一个 '[' 到最后一个 ']' → ResponseParse
// ==========================================

use crate::analysis::error::{AnalysisError, AnalysisResult};
use serde_json::Value;
use tracing::debug;

/// 从模型原始输出中取出 JSON 数组（可被代码块或说明文字包裹）
pub fn parse_llm_response(raw: &str) -> AnalysisResult<Vec<Value>> {
    if let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(raw.trim()) {
        return Ok(entries);
    }

    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if start < end {
            if let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(&raw[start..=end]) {
                debug!(entries = entries.len(), "从包裹文本中截取到 JSON 数组");
                return Ok(entries);
            }
        }
    }

    Err(AnalysisError::response_parse(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_array() {
        let entries = parse_llm_response(r#"[{"component":"Roulements"}]"#).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_fenced_block() {
        let raw = "Voici l'analyse :\n```json\n[{\"component\":\"Courroie\"},{\"component\":\"Moteur\"}]\n```\nBonne journée";
        let entries = parse_llm_response(raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["component"], "Moteur");
    }

    #[test]
    fn test_object_is_not_an_array() {
        let err = parse_llm_response(r#"{"component":"Roulements"}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::ResponseParse { .. }));
    }

    #[test]
    fn test_garbage_carries_sample() {
        let raw = format!("Je ne peux pas répondre. {}", "x".repeat(400));
        match parse_llm_response(&raw).unwrap_err() {
            AnalysisError::ResponseParse { sample } => {
                assert!(sample.starts_with("Je ne peux pas"));
                assert_eq!(sample.chars().count(), 200);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
