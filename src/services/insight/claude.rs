//! Anthropic Messages API 洞察
//!
//! 将行情与韩国影响分析整理为提示词，请求模型返回 JSON 格式的洞察

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::rules::{RuleBasedInsight, MAX_ACTION_ITEMS, MAX_KEY_POINTS};
use super::InsightGenerator;
use crate::config::InsightConfig;
use crate::models::{InsightResult, KoreaImpactResult, MarketSnapshot};

const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "당신은 20년 경력의 글로벌 투자 애널리스트입니다.

전문 분야:
- 미국 및 한국 증시 분석
- 섹터 로테이션 및 상관관계 분석
- 한국 개인투자자 관점의 실용적 조언

분석 원칙:
1. 간결하고 실용적인 요약
2. 과장 없는 객관적 분석
3. 리스크와 기회 균형있게 제시

금지사항:
- 특정 종목 매수/매도 권유
- 수익률 보장 또는 예측";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// 模型返回的洞察结构
#[derive(Debug, Deserialize)]
struct ModelInsight {
    insight: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    risk_note: String,
    #[serde(default)]
    action_items: Vec<String>,
}

/// 模型洞察生成器
pub struct ClaudeInsight {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
    max_tokens: u32,
    fallback: RuleBasedInsight,
}

impl ClaudeInsight {
    pub fn new(config: &InsightConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("创建 HTTP 客户端失败")?;

        Ok(Self {
            client,
            api_key: config.anthropic_api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            fallback: RuleBasedInsight::new(),
        })
    }

    async fn request(&self, prompt: String) -> Result<InsightResult> {
        let url = format!("{}/v1/messages", self.api_base);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("模型接口返回错误: {} {}", status, detail));
        }

        let data: MessagesResponse = response.json().await.context("解析模型响应失败")?;
        let text: String = data
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        parse_model_insight(&text)
    }
}

#[async_trait]
impl InsightGenerator for ClaudeInsight {
    async fn generate(
        &self,
        snapshot: &MarketSnapshot,
        korea: &KoreaImpactResult,
    ) -> InsightResult {
        match self.request(build_prompt(snapshot, korea)).await {
            Ok(insight) => insight,
            Err(e) => {
                log::warn!("模型洞察生成失败，回退到规则引擎: {:#}", e);
                self.fallback.build(snapshot, korea)
            }
        }
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}

/// 构造分析提示词
pub(crate) fn build_prompt(snapshot: &MarketSnapshot, korea: &KoreaImpactResult) -> String {
    let mut prompt = String::from("다음 시장 데이터를 분석해주세요:\n\n【미국 시장】\n");
    for quote in snapshot.available() {
        prompt.push_str(&format!("- {}: {:+.2}%\n", quote.name, quote.change_pct));
    }

    let trigger = korea
        .trigger_index
        .map(|index| index.display_name())
        .unwrap_or("N/A");
    prompt.push_str(&format!(
        "\n【한국 영향 분석】\n- 주요 섹터: {}\n- 심리: {}\n- 트리거: {} {:+.2}%\n\n주목 종목:\n",
        korea.primary_sector.as_deref().unwrap_or("N/A"),
        korea.sentiment.label(),
        trigger,
        korea.trigger_change_pct
    ));
    for stock in korea.top_stocks.iter().take(3) {
        prompt.push_str(&format!("- {} ({})\n", stock.name, stock.sector));
    }

    prompt.push_str(
        "\n다음 키를 가진 JSON 객체 하나만 출력해주세요:\n\
         {\"insight\": 핵심 인사이트 2-3문장, \"key_points\": 주요 포인트 3개, \
         \"risk_note\": 주의사항 1문장, \"action_items\": 투자 시사점 2개}\n",
    );
    prompt
}

/// 从模型输出中提取 JSON 并套用条数上限
pub(crate) fn parse_model_insight(text: &str) -> Result<InsightResult> {
    let start = text.find('{').ok_or_else(|| anyhow!("模型输出中没有 JSON"))?;
    let end = text.rfind('}').ok_or_else(|| anyhow!("模型输出中没有 JSON"))?;
    if end < start {
        return Err(anyhow!("模型输出 JSON 边界无效"));
    }

    let parsed: ModelInsight =
        serde_json::from_str(&text[start..=end]).context("模型输出 JSON 格式错误")?;
    if parsed.insight.trim().is_empty() {
        return Err(anyhow!("模型未返回核心观点"));
    }

    let mut key_points = parsed.key_points;
    key_points.truncate(MAX_KEY_POINTS);
    let mut action_items = parsed.action_items;
    action_items.truncate(MAX_ACTION_ITEMS);

    Ok(InsightResult {
        insight: parsed.insight,
        key_points,
        risk_note: parsed.risk_note,
        action_items,
    })
}
