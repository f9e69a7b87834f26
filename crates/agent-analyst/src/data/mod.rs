//! Market data collaborators
//!
//! The quantitative stage reads prices keyed by symbol, the qualitative stage
//! reads news keyed by company name. Both sources are traits so the stages
//! can run against fixtures.

mod news;
mod prices;

pub use news::{NewsApiSource, NewsArticle, render_articles};
pub use prices::{PriceBar, PriceSnapshot, YahooPriceSource};

use crate::error::Result;
use async_trait::async_trait;

/// Daily price history for a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceDataSource: Send + Sync {
    /// Fetch and summarize recent prices for `symbol`
    async fn snapshot(&self, symbol: &str) -> Result<PriceSnapshot>;
}

/// Recent news coverage for a company
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch recent articles mentioning `company_name`, newest first
    async fn articles(&self, company_name: &str) -> Result<Vec<NewsArticle>>;
}
