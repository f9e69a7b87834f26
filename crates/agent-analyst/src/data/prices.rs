//! Yahoo Finance price history and derived indicators

use super::PriceDataSource;
use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use ta::Next;
use ta::indicators::{RelativeStrengthIndex, SimpleMovingAverage};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;
const RSI_PERIOD: usize = 14;
const TRADING_DAYS_PER_YEAR: usize = 252;
const RECENT_CLOSES: usize = 10;

/// One daily bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Summary of a symbol's recent trading
///
/// Fields that need more history than was available are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub as_of: DateTime<Utc>,
    pub current_price: f64,
    pub previous_close: Option<f64>,
    pub change_24h: Option<f64>,
    pub change_percent_24h: Option<f64>,
    pub high_52w: f64,
    pub low_52w: f64,
    pub volume: u64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub rsi_14: Option<f64>,
    pub recent_closes: Vec<(String, f64)>,
}

impl PriceSnapshot {
    /// Derive the snapshot from bars in chronological order
    pub fn from_bars(symbol: &str, bars: &[PriceBar]) -> Result<Self> {
        let last = bars.last().ok_or_else(|| AnalystError::DataUnavailable {
            subject: symbol.to_string(),
            reason: "No price history returned".to_string(),
        })?;

        let previous_close = bars.len().checked_sub(2).map(|i| bars[i].close);
        let change_24h = previous_close.map(|prev| last.close - prev);
        let change_percent_24h = previous_close
            .filter(|prev| *prev != 0.0)
            .map(|prev| (last.close - prev) / prev * 100.0);

        let year = &bars[bars.len().saturating_sub(TRADING_DAYS_PER_YEAR)..];
        let high_52w = year.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low_52w = year.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let recent_closes = bars[bars.len().saturating_sub(RECENT_CLOSES)..]
            .iter()
            .map(|b| (b.timestamp.format("%Y-%m-%d").to_string(), b.close))
            .collect();

        Ok(Self {
            symbol: symbol.to_string(),
            as_of: last.timestamp,
            current_price: last.close,
            previous_close,
            change_24h,
            change_percent_24h,
            high_52w,
            low_52w,
            volume: last.volume,
            sma_20: simple_moving_average(&closes, SMA_SHORT)?,
            sma_50: simple_moving_average(&closes, SMA_LONG)?,
            rsi_14: relative_strength(&closes, RSI_PERIOD)?,
            recent_closes,
        })
    }

    /// Plain-text rendering handed to the quantitative analyst
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Symbol: {}", self.symbol);
        let _ = writeln!(out, "As of: {}", self.as_of.format("%Y-%m-%d"));
        let _ = writeln!(out, "Current price (last close): {:.2}", self.current_price);
        match (self.change_24h, self.change_percent_24h) {
            (Some(abs), Some(pct)) => {
                let _ = writeln!(out, "24h change: {abs:+.2} ({pct:+.2}%)");
            }
            (Some(abs), None) => {
                let _ = writeln!(out, "24h change: {abs:+.2}");
            }
            _ => {
                let _ = writeln!(out, "24h change: not available");
            }
        }
        let _ = writeln!(out, "52-week high: {:.2}", self.high_52w);
        let _ = writeln!(out, "52-week low: {:.2}", self.low_52w);
        let _ = writeln!(out, "Volume (last session): {}", self.volume);
        let _ = writeln!(out, "SMA-20: {}", fmt_optional(self.sma_20));
        let _ = writeln!(out, "SMA-50: {}", fmt_optional(self.sma_50));
        let _ = writeln!(out, "RSI-14: {}", fmt_optional(self.rsi_14));
        let _ = writeln!(out, "Market capitalization: not available");
        let _ = writeln!(out, "P/E ratio: not available");
        out.push_str("Recent closes:\n");
        for (date, close) in &self.recent_closes {
            let _ = writeln!(out, "  {date}: {close:.2}");
        }
        out
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "not enough history".to_string(), |v| format!("{v:.2}"))
}

/// Final SMA value, `None` with fewer than `period` closes
fn simple_moving_average(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() < period {
        return Ok(None);
    }
    let mut sma = SimpleMovingAverage::new(period)
        .map_err(|e| AnalystError::IndicatorError(e.to_string()))?;
    Ok(closes.iter().map(|&c| sma.next(c)).last())
}

/// Final RSI value, `None` without `period + 1` closes
fn relative_strength(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() <= period {
        return Ok(None);
    }
    let mut rsi = RelativeStrengthIndex::new(period)
        .map_err(|e| AnalystError::IndicatorError(e.to_string()))?;
    Ok(closes.iter().map(|&c| rsi.next(c)).last())
}

/// Yahoo Finance backed [`PriceDataSource`]
#[derive(Debug, Clone)]
pub struct YahooPriceSource {
    history_days: u32,
}

impl YahooPriceSource {
    /// Create a source fetching `history_days` of daily bars
    pub fn new(history_days: u32) -> Self {
        Self { history_days }
    }

    async fn history(&self, symbol: &str) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))?;

        let end = Utc::now();
        let start = end - Duration::days(i64::from(self.history_days));
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| AnalystError::YahooFinanceError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| AnalystError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))?;

        Ok(quotes
            .iter()
            .map(|q| PriceBar {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0).unwrap_or(end),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }
}

impl Default for YahooPriceSource {
    fn default() -> Self {
        Self::new(365)
    }
}

#[async_trait]
impl PriceDataSource for YahooPriceSource {
    #[instrument(skip(self))]
    async fn snapshot(&self, symbol: &str) -> Result<PriceSnapshot> {
        let bars = self.history(symbol).await?;
        debug!(bars = bars.len(), "Fetched price history");
        PriceSnapshot::from_bars(symbol, &bars)
    }
}
