// ==========================================
// GMAO 维护数据核心 - AMDEC 分析提示词
// ==========================================

use crate::analysis::aggregates::FailureAggregate;
use crate::analysis::error::{AnalysisError, AnalysisResult};

/// 系统提示词（固定评分规则）
pub const SYSTEM_PROMPT: &str = "Tu es un expert en fiabilité industrielle et en analyse AMDEC. \
Pour chaque couple (composant, type de panne) fourni, attribue trois notes entières de 1 à 5 : \
F (fréquence : 5 = plus de 50 occurrences, 4 = 30 à 49, 3 = 15 à 29, 2 = 5 à 14, 1 = moins de 5), \
G (gravité : selon le coût et l'arrêt de production, 5 = impact majeur), \
D (détectabilité : 1 = panne évidente, 5 = panne indétectable avant défaillance), \
et propose une action de maintenance concrète. \
N'invente aucun composant : utilise exactement les valeurs « component » et « failureType » reçues. \
Réponds uniquement par un tableau JSON d'objets \
{\"component\", \"failureType\", \"frequency\", \"gravity\", \"detectability\", \"action\"}, sans autre texte.";

/// 用户提示词: 聚合列表的 JSON 序列化
pub fn build_user_prompt(aggregates: &[FailureAggregate]) -> AnalysisResult<String> {
    let payload = serde_json::to_string_pretty(aggregates)
        .map_err(|e| AnalysisError::Llm(format!("sérialisation des agrégats impossible : {}", e)))?;
    Ok(format!(
        "Historique des pannes agrégé ({} couples composant / type de panne) :\n{}",
        aggregates.len(),
        payload
    ))
}
