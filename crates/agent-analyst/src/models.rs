//! Records produced by the analyst stages
//!
//! Each record doubles as a structured-output tool: its JSON schema is what
//! the model is asked to fill in. Parsing goes through [`parse_validated`],
//! so a record that exists in memory always satisfies its constraints.

use crate::error::{AnalystError, Result};
use agent_llm::StructuredOutput;
use agent_llm::tools::schema;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Constraint checks beyond what the type system expresses
pub trait Validate {
    /// Check every field constraint
    fn validate(&self) -> Result<()>;
}

/// Deserialize a record from model output and validate it
///
/// Missing or mistyped fields surface as `AnalystError::Validation` naming
/// the record, never as a partially filled value.
pub fn parse_validated<T>(value: Value) -> Result<T>
where
    T: StructuredOutput + Validate + DeserializeOwned,
{
    let record: T = serde_json::from_value(value)
        .map_err(|e| AnalystError::validation(T::NAME, e.to_string()))?;
    record.validate()?;
    Ok(record)
}

fn require_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AnalystError::validation(field, format!("{value} is not a finite number")))
    }
}

fn require_optional_finite(field: &str, value: Option<f64>) -> Result<()> {
    value.map_or(Ok(()), |v| require_finite(field, v))
}

fn require_in_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    require_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(AnalystError::validation(
            field,
            format!("{value} is outside [{min}, {max}]"),
        ))
    }
}

/// Whole-number count that may arrive as `48200000` or `4.82e7`
#[allow(clippy::float_cmp)]
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(count) = number.as_u64() {
        return Ok(Some(count));
    }
    match number.as_f64() {
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Ok(Some(v as u64))
        }
        _ => Err(de::Error::custom(format!(
            "expected a non-negative whole number, got {number}"
        ))),
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AnalystError::validation(field, "must not be empty"))
    } else {
        Ok(())
    }
}

// =========== Quantitative ===========

/// Price-derived metrics and commentary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeAnalysis {
    pub current_price: f64,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub week_high_52: Option<f64>,
    #[serde(default)]
    pub week_low_52: Option<f64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub volume: Option<u64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    pub trend_analysis: String,
    pub key_metrics_summary: String,
}

impl Validate for QuantitativeAnalysis {
    fn validate(&self) -> Result<()> {
        require_finite("current_price", self.current_price)?;
        if self.current_price < 0.0 {
            return Err(AnalystError::validation(
                "current_price",
                format!("{} is negative", self.current_price),
            ));
        }
        require_optional_finite("price_change_24h", self.price_change_24h)?;
        require_optional_finite("price_change_percentage_24h", self.price_change_percentage_24h)?;
        require_optional_finite("week_high_52", self.week_high_52)?;
        require_optional_finite("week_low_52", self.week_low_52)?;
        require_optional_finite("market_cap", self.market_cap)?;
        require_optional_finite("pe_ratio", self.pe_ratio)?;
        require_text("trend_analysis", &self.trend_analysis)?;
        require_text("key_metrics_summary", &self.key_metrics_summary)
    }
}

impl StructuredOutput for QuantitativeAnalysis {
    const NAME: &'static str = "quantitative_analysis";
    const DESCRIPTION: &'static str =
        "Record the quantitative analysis of the stock's price data. Leave a metric null when the data does not contain it.";

    fn schema() -> Value {
        schema::object(
            json!({
                "current_price": schema::number("Current stock price"),
                "price_change_24h": schema::nullable(schema::number("Price change in the last 24 hours")),
                "price_change_percentage_24h": schema::nullable(schema::number("Price change percentage in the last 24 hours")),
                "week_high_52": schema::nullable(schema::number("52-week high price")),
                "week_low_52": schema::nullable(schema::number("52-week low price")),
                "volume": schema::nullable(schema::integer("Trading volume")),
                "market_cap": schema::nullable(schema::number("Market capitalization")),
                "pe_ratio": schema::nullable(schema::number("Price-to-earnings ratio")),
                "trend_analysis": schema::string("Analysis of recent price trends"),
                "key_metrics_summary": schema::string("Summary of key financial metrics"),
            }),
            &["current_price", "trend_analysis", "key_metrics_summary"],
        )
    }
}

// =========== Qualitative ===========

/// Overall tone of the news flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Wire names, in schema order
    pub const VALUES: [&'static str; 3] = ["positive", "negative", "neutral"];
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        })
    }
}

/// News-derived sentiment, risks and opportunities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeAnalysis {
    pub overall_sentiment: Sentiment,
    /// In [-1, 1]; -1 very negative, 1 very positive
    pub sentiment_score: f64,
    pub key_risks: Vec<String>,
    pub key_opportunities: Vec<String>,
    pub news_summary: String,
    pub market_perception: String,
}

impl Validate for QualitativeAnalysis {
    fn validate(&self) -> Result<()> {
        require_in_range("sentiment_score", self.sentiment_score, -1.0, 1.0)?;
        require_text("news_summary", &self.news_summary)?;
        require_text("market_perception", &self.market_perception)
    }
}

impl StructuredOutput for QualitativeAnalysis {
    const NAME: &'static str = "qualitative_analysis";
    const DESCRIPTION: &'static str =
        "Record the qualitative analysis of the company's recent news: sentiment, risks and opportunities.";

    fn schema() -> Value {
        schema::object(
            json!({
                "overall_sentiment": schema::enumeration("Overall sentiment from news analysis", &Sentiment::VALUES),
                "sentiment_score": schema::bounded_number("Sentiment score between -1 (very negative) and 1 (very positive)", -1.0, 1.0),
                "key_risks": schema::array("Key risk factors identified", schema::string("Risk factor")),
                "key_opportunities": schema::array("Key opportunities identified", schema::string("Opportunity")),
                "news_summary": schema::string("Summary of recent news articles"),
                "market_perception": schema::string("Overall market perception and narrative"),
            }),
            &[
                "overall_sentiment",
                "sentiment_score",
                "key_risks",
                "key_opportunities",
                "news_summary",
                "market_perception",
            ],
        )
    }
}

// =========== Report ===========

/// Final investment call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    #[serde(rename = "Buy")]
    Buy,
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "Sell")]
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl Recommendation {
    /// Wire names, strongest buy first
    pub const VALUES: [&'static str; 5] = ["Strong Buy", "Buy", "Hold", "Sell", "Strong Sell"];
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Sell",
            Recommendation::StrongSell => "Strong Sell",
        })
    }
}

/// The synthesized report returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentReport {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub stock_symbol: String,
    pub executive_summary: String,
    pub quantitative_summary: String,
    pub qualitative_summary: String,
    pub investment_recommendation: Recommendation,
    pub recommendation_rationale: String,
    pub risk_assessment: String,
    /// In [0, 100]
    pub confidence_level: f64,
    #[serde(default)]
    pub report_date: String,
    #[serde(default)]
    pub analysis_period: String,
}

impl Validate for InvestmentReport {
    fn validate(&self) -> Result<()> {
        require_in_range("confidence_level", self.confidence_level, 0.0, 100.0)?;
        require_text("company_name", &self.company_name)?;
        require_text("stock_symbol", &self.stock_symbol)?;
        require_text("executive_summary", &self.executive_summary)?;
        require_text("recommendation_rationale", &self.recommendation_rationale)
    }
}

impl StructuredOutput for InvestmentReport {
    const NAME: &'static str = "investment_report";
    const DESCRIPTION: &'static str =
        "Record the final investment report synthesizing the quantitative and qualitative analyses.";

    fn schema() -> Value {
        schema::object(
            json!({
                "company_name": schema::string("Name of the company"),
                "stock_symbol": schema::string("Stock symbol"),
                "executive_summary": schema::string("Executive summary of the analysis"),
                "quantitative_summary": schema::string("Summary of quantitative findings"),
                "qualitative_summary": schema::string("Summary of qualitative findings"),
                "investment_recommendation": schema::enumeration("Final investment recommendation", &Recommendation::VALUES),
                "recommendation_rationale": schema::string("Detailed rationale for the recommendation"),
                "risk_assessment": schema::string("Overall risk assessment"),
                "confidence_level": schema::bounded_number("Confidence level in the recommendation", 0.0, 100.0),
                "report_date": schema::string("Date the report was generated, YYYY-MM-DD"),
                "analysis_period": schema::string("Time period covered by the analysis"),
            }),
            &[
                "executive_summary",
                "quantitative_summary",
                "qualitative_summary",
                "investment_recommendation",
                "recommendation_rationale",
                "risk_assessment",
                "confidence_level",
            ],
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn quant() -> QuantitativeAnalysis {
        QuantitativeAnalysis {
            current_price: 182.5,
            price_change_24h: Some(-1.25),
            price_change_percentage_24h: Some(-0.68),
            week_high_52: Some(199.6),
            week_low_52: Some(124.2),
            volume: Some(48_200_000),
            market_cap: None,
            pe_ratio: None,
            trend_analysis: "Uptrend since spring, consolidating below the high".to_string(),
            key_metrics_summary: "Trading above its 50-day average with neutral RSI".to_string(),
        }
    }

    pub fn qual() -> QualitativeAnalysis {
        QualitativeAnalysis {
            overall_sentiment: Sentiment::Positive,
            sentiment_score: 0.4,
            key_risks: vec!["Supply constraints".to_string()],
            key_opportunities: vec!["New product line".to_string()],
            news_summary: "Launch coverage dominated the week".to_string(),
            market_perception: "Cautiously optimistic".to_string(),
        }
    }

    pub fn report() -> InvestmentReport {
        InvestmentReport {
            company_name: "Acme Corp".to_string(),
            stock_symbol: "ACME".to_string(),
            executive_summary: "Solid momentum".to_string(),
            quantitative_summary: "Near highs".to_string(),
            qualitative_summary: "Positive coverage".to_string(),
            investment_recommendation: Recommendation::Buy,
            recommendation_rationale: "Momentum plus catalysts".to_string(),
            risk_assessment: "Moderate".to_string(),
            confidence_level: 72.0,
            report_date: "2026-10-18".to_string(),
            analysis_period: "Trailing 12 months".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quant_optional_fields_absent_not_zero() {
        let parsed: QuantitativeAnalysis = parse_validated(json!({
            "current_price": 10.0,
            "trend_analysis": "flat",
            "key_metrics_summary": "thin data",
            "pe_ratio": null
        }))
        .unwrap();

        assert_eq!(parsed.volume, None);
        assert_eq!(parsed.pe_ratio, None);
        assert_eq!(parsed.market_cap, None);
    }

    #[test]
    fn test_quant_volume_accepts_whole_floats() {
        for volume in [json!(48_200_000), json!(48_200_000.0), json!(4.82e7)] {
            let parsed: QuantitativeAnalysis = parse_validated(json!({
                "current_price": 10.0,
                "volume": volume,
                "trend_analysis": "flat",
                "key_metrics_summary": "thin data"
            }))
            .unwrap();
            assert_eq!(parsed.volume, Some(48_200_000));
        }
    }

    #[test]
    fn test_quant_volume_rejects_fractional_or_negative() {
        for volume in [json!(1.5), json!(-3.0), json!(-3)] {
            let err = parse_validated::<QuantitativeAnalysis>(json!({
                "current_price": 10.0,
                "volume": volume,
                "trend_analysis": "flat",
                "key_metrics_summary": "thin data"
            }))
            .unwrap_err();
            assert!(matches!(
                err,
                AnalystError::Validation { ref field, .. } if field == "quantitative_analysis"
            ));
        }
    }

    #[test]
    fn test_quant_negative_price_rejected() {
        let mut quant = fixtures::quant();
        quant.current_price = -0.5;
        assert!(matches!(
            quant.validate(),
            Err(AnalystError::Validation { ref field, .. }) if field == "current_price"
        ));
    }

    #[test]
    fn test_qual_blank_narrative_rejected() {
        let mut qual = fixtures::qual();
        qual.news_summary = String::new();
        assert!(matches!(
            qual.validate(),
            Err(AnalystError::Validation { ref field, .. }) if field == "news_summary"
        ));
    }

    #[test]
    fn test_quant_missing_required_field() {
        let err = parse_validated::<QuantitativeAnalysis>(json!({
            "trend_analysis": "flat",
            "key_metrics_summary": "thin data"
        }))
        .unwrap_err();

        assert!(matches!(
            err,
            AnalystError::Validation { ref field, ref reason }
                if field == "quantitative_analysis" && reason.contains("current_price")
        ));
    }

    #[test]
    fn test_quant_blank_summary_rejected() {
        let mut quant = fixtures::quant();
        quant.key_metrics_summary = "  ".to_string();
        assert!(matches!(
            quant.validate(),
            Err(AnalystError::Validation { ref field, .. }) if field == "key_metrics_summary"
        ));
    }

    #[test]
    fn test_sentiment_score_bounds() {
        let mut qual = fixtures::qual();
        for ok in [-1.0, 0.0, 1.0] {
            qual.sentiment_score = ok;
            assert!(qual.validate().is_ok(), "{ok} should be accepted");
        }
        for bad in [-1.01, 1.5, f64::NAN] {
            qual.sentiment_score = bad;
            assert!(qual.validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_sentiment_must_be_enumerated() {
        let mut value = serde_json::to_value(fixtures::qual()).unwrap();
        value["overall_sentiment"] = json!("bullish");
        assert!(parse_validated::<QualitativeAnalysis>(value).is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        let mut report = fixtures::report();
        report.confidence_level = 100.0;
        assert!(report.validate().is_ok());
        report.confidence_level = 100.5;
        assert!(matches!(
            report.validate(),
            Err(AnalystError::Validation { ref field, .. }) if field == "confidence_level"
        ));
    }

    #[test]
    fn test_recommendation_wire_names() {
        let value = serde_json::to_value(fixtures::report()).unwrap();
        assert_eq!(value["investment_recommendation"], "Buy");

        let strong: Recommendation = serde_json::from_value(json!("Strong Sell")).unwrap();
        assert_eq!(strong, Recommendation::StrongSell);
        assert_eq!(strong.to_string(), "Strong Sell");
        assert!(serde_json::from_value::<Recommendation>(json!("Accumulate")).is_err());
    }

    #[test]
    fn test_schemas_require_core_fields() {
        let schema = QualitativeAnalysis::schema();
        assert_eq!(schema["properties"]["sentiment_score"]["minimum"], -1.0);
        assert_eq!(
            schema["properties"]["overall_sentiment"]["enum"],
            json!(["positive", "negative", "neutral"])
        );
        assert_eq!(InvestmentReport::tool_definition().name, "investment_report");
    }
}
