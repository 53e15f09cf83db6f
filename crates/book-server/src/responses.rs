//! Order book server response types.

use model::{parse_scaled, BookSnapshot, FixedPointError, PriceLevel};
use serde::Deserialize;

/// Response from GET /snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotResponse {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,
    /// `[price, quantity]` decimal string pairs.
    pub bids: Vec<(String, String)>,
    pub asks: Vec<(String, String)>,
}

impl SnapshotResponse {
    /// Scale every level to fixed-point; a single bad level rejects the snapshot.
    pub fn into_snapshot(self) -> Result<BookSnapshot, FixedPointError> {
        Ok(BookSnapshot {
            last_update_id: self.last_update_id,
            bids: parse_levels(&self.bids)?,
            asks: parse_levels(&self.asks)?,
        })
    }
}

fn parse_levels(levels: &[(String, String)]) -> Result<Vec<PriceLevel>, FixedPointError> {
    levels
        .iter()
        .map(|(price, qty)| Ok(PriceLevel::new(parse_scaled(price)?, parse_scaled(qty)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_snapshot() {
        let json = r#"{
            "lastUpdateId": 1027024,
            "bids": [["4.00000000", "431.00000000"], ["3.9999999", "12.5"]],
            "asks": [["4.00000200", "12.00000000"]]
        }"#;

        let response: SnapshotResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.last_update_id, 1027024);
        assert_eq!(response.bids.len(), 2);

        let snapshot = response.into_snapshot().unwrap();
        assert_eq!(snapshot.last_update_id, 1027024);
        assert_eq!(
            snapshot.bids,
            vec![
                PriceLevel::new(40_000_000, 4_310_000_000),
                PriceLevel::new(39_999_999, 125_000_000),
            ]
        );
        assert_eq!(snapshot.asks, vec![PriceLevel::new(40_000_020, 120_000_000)]);
    }

    #[test]
    fn test_empty_sides() {
        let json = r#"{"lastUpdateId": 0, "bids": [], "asks": []}"#;
        let snapshot = serde_json::from_str::<SnapshotResponse>(json)
            .unwrap()
            .into_snapshot()
            .unwrap();
        assert_eq!(snapshot, BookSnapshot::default());
    }

    #[test]
    fn test_bad_level_rejects_snapshot() {
        let json = r#"{"lastUpdateId": 5, "bids": [["10.0", "oops"]], "asks": []}"#;
        let response: SnapshotResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            response.into_snapshot(),
            Err(FixedPointError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_field_fails_to_deserialize() {
        let json = r#"{"bids": [], "asks": []}"#;
        assert!(serde_json::from_str::<SnapshotResponse>(json).is_err());
    }
}
