//! IPO listing records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A raw IPO listing submitted for prediction.
///
/// Never persisted directly; only the derived [`PredictionResult`] is.
///
/// [`PredictionResult`]: crate::prediction::PredictionResult
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Ticker symbol
    pub ticker: String,

    /// Issue price in the listing currency
    pub issue_price: f64,

    /// Date the ticker lists
    pub listing_date: NaiveDate,

    /// Exchange the ticker lists on (e.g. "NSE", "BSE")
    #[serde(default)]
    pub exchange: Option<String>,

    /// Sector classification (e.g. "TECH", "FIN")
    #[serde(default)]
    pub sector: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_to_none() {
        let record: ListingRecord = serde_json::from_str(
            r#"{"ticker": "ACME", "issue_price": 120.5, "listing_date": "2024-03-15"}"#,
        )
        .unwrap();
        assert_eq!(record.ticker, "ACME");
        assert!(record.exchange.is_none());
        assert!(record.sector.is_none());
    }

    #[test]
    fn rejects_malformed_date() {
        let result = serde_json::from_str::<ListingRecord>(
            r#"{"ticker": "ACME", "issue_price": 10.0, "listing_date": "15/03/2024"}"#,
        );
        assert!(result.is_err());
    }
}
