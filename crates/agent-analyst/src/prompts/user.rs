//! Human message templates for the analyst stages

pub(super) const QUANTITATIVE: &str = r"Here is the stock price data for the company:

{{ stock_data }}

Please provide a quantitative analysis with:
- Current price (as a number)
- Price change in the last 24 hours (if available)
- Price change percentage in the last 24 hours (if available)
- 52-week high (if available)
- 52-week low (if available)
- Trading volume (if available)
- Market capitalization (if available)
- P/E ratio (if available)
- Trend analysis (brief description of recent price movements)
- Key metrics summary (overall assessment of financial health)";

pub(super) const QUALITATIVE: &str = r"Here are the recent news articles for the company:

{{ news_data }}

Please provide a qualitative analysis with:
- Overall sentiment (positive/negative/neutral)
- Sentiment score (between -1 and 1, where -1 is very negative, 0 is neutral, and 1 is very positive)
- Key risks (significant risk factors mentioned)
- Key opportunities (significant opportunities mentioned)
- News summary (concise summary of recent news)
- Market perception (overall narrative and market perception)";

pub(super) const REPORT_WRITER: &str = r#"Please compile a final investment report based on the following analyses.

Quantitative Analysis:
- Current Price: ${{ quant.current_price }}
- 24h Change: {{ quant.price_change_24h | signed if quant.price_change_24h is not none else "n/a" }}
- Trend Analysis: {{ quant.trend_analysis }}
- Key Metrics Summary: {{ quant.key_metrics_summary }}
- 52W High: {{ quant.week_high_52 if quant.week_high_52 is not none else "n/a" }}
- 52W Low: {{ quant.week_low_52 if quant.week_low_52 is not none else "n/a" }}
- P/E Ratio: {{ quant.pe_ratio if quant.pe_ratio is not none else "n/a" }}
- Market Cap: {{ quant.market_cap if quant.market_cap is not none else "n/a" }}

Qualitative Analysis:
- Overall Sentiment: {{ qual.overall_sentiment }}
- Sentiment Score: {{ qual.sentiment_score }}
- Key Risks:
{%- for risk in qual.key_risks %}
  - {{ risk }}
{%- else %} none identified
{%- endfor %}
- Key Opportunities:
{%- for opportunity in qual.key_opportunities %}
  - {{ opportunity }}
{%- else %} none identified
{%- endfor %}
- News Summary: {{ qual.news_summary }}
- Market Perception: {{ qual.market_perception }}

Based on all this information, create a comprehensive investment report with:
1. Executive summary
2. Quantitative findings summary
3. Qualitative findings summary
4. Investment recommendation (Strong Buy, Buy, Hold, Sell, Strong Sell)
5. Recommendation rationale
6. Risk assessment
7. Confidence level (0-100)

Company: {{ company_name }}
Symbol: {{ symbol }}"#;
