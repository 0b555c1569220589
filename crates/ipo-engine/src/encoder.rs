//! Feature encoding: raw listing record -> fixed-width numeric vector.
//!
//! Pure and deterministic: the same record and artifact always produce the
//! same vector. All category codes come from the artifact's category maps;
//! values outside a map (including absent ones) encode as the reserved
//! "not found" code.

use chrono::Datelike;

use ipo_models::ListingRecord;

use crate::artifact::ModelArtifact;

/// Code for a category value not present in the category map.
pub const UNKNOWN_CATEGORY_CODE: f64 = -1.0;

/// Integer code for a categorical value: its index in the category map, or
/// [`UNKNOWN_CATEGORY_CODE`] when the value is absent or unseen.
pub fn category_code(value: Option<&str>, categories: &[String]) -> f64 {
    value
        .and_then(|v| categories.iter().position(|c| c == v))
        .map(|i| i as f64)
        .unwrap_or(UNKNOWN_CATEGORY_CODE)
}

/// Encode a listing record into the artifact's feature-column order.
///
/// Columns the encoder does not compute are filled with 0.
pub fn encode_features(record: &ListingRecord, artifact: &ModelArtifact) -> Vec<f64> {
    let exchange_code = category_code(record.exchange.as_deref(), artifact.categories("exchange"));
    let sector_code = category_code(record.sector.as_deref(), artifact.categories("sector"));

    artifact
        .feature_columns
        .iter()
        .map(|column| match column.as_str() {
            "issue_price" => record.issue_price,
            "listing_month" => f64::from(record.listing_date.month()),
            "listing_day" => f64::from(record.listing_date.day()),
            "exchange_code" => exchange_code,
            "sector_code" => sector_code,
            _ => 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use crate::model::{Linear, Model};

    use super::*;

    fn artifact_with_columns(columns: &[&str]) -> ModelArtifact {
        ModelArtifact {
            model: Model::Linear(Linear {
                weights: vec![0.0; columns.len()],
                intercept: 0.0,
            }),
            feature_columns: columns.iter().map(|s| s.to_string()).collect(),
            category_maps: BTreeMap::from([
                (
                    "exchange".to_string(),
                    vec!["NSE".into(), "BSE".into(), "OTH".into()],
                ),
                ("sector".to_string(), vec!["TECH".into(), "FIN".into()]),
            ]),
        }
    }

    fn record(exchange: Option<&str>, sector: Option<&str>) -> ListingRecord {
        ListingRecord {
            ticker: "ACME".to_string(),
            issue_price: 120.5,
            listing_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            exchange: exchange.map(String::from),
            sector: sector.map(String::from),
        }
    }

    #[test]
    fn known_and_unknown_categories() {
        let artifact = artifact_with_columns(&["exchange_code", "sector_code"]);
        // "BSE" is index 1; "OTH" is not a known sector.
        let vector = encode_features(&record(Some("BSE"), Some("OTH")), &artifact);
        assert_eq!(vector, vec![1.0, UNKNOWN_CATEGORY_CODE]);
    }

    #[test]
    fn absent_categoricals_encode_as_unknown() {
        let artifact = artifact_with_columns(&["exchange_code", "sector_code"]);
        let vector = encode_features(&record(None, None), &artifact);
        assert_eq!(vector, vec![UNKNOWN_CATEGORY_CODE, UNKNOWN_CATEGORY_CODE]);
    }

    #[test]
    fn date_parts_and_price_pass_through() {
        let artifact = artifact_with_columns(&["issue_price", "listing_month", "listing_day"]);
        let vector = encode_features(&record(None, None), &artifact);
        assert_eq!(vector, vec![120.5, 3.0, 15.0]);
    }

    #[test]
    fn output_follows_column_order_and_pads_unknown_columns() {
        let artifact =
            artifact_with_columns(&["sector_code", "extra_column", "issue_price"]);
        let vector = encode_features(&record(None, Some("FIN")), &artifact);
        assert_eq!(vector, vec![1.0, 0.0, 120.5]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let artifact = artifact_with_columns(&[
            "issue_price",
            "listing_month",
            "listing_day",
            "exchange_code",
            "sector_code",
        ]);
        let a = encode_features(&record(Some("NSE"), Some("TECH")), &artifact);
        let b = encode_features(&record(Some("NSE"), Some("TECH")), &artifact);
        assert_eq!(a, b);
    }
}
