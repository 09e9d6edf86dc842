//! Merging a freshly mapped document into a stored one

use sheetmap_core::{fields, Document};

/// Apply `incoming` on top of `existing`.
///
/// Plain fields are overwritten. Prices are merged per `(year, month, type)`
/// so earlier months survive a re-import.
pub fn upsert_document(existing: &mut Document, incoming: &Document) {
    for (key, value) in incoming.iter() {
        if key == fields::PRICES {
            existing.merge_prices(&incoming.prices());
        } else {
            existing.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sheetmap_core::PriceRecord;

    #[test]
    fn test_upsert_overwrites_fields_and_merges_prices() {
        let mut existing = Document::new();
        existing.set_path("name", json!("Old"));
        existing.set_path("region", json!("north"));
        existing.merge_prices(&[
            PriceRecord::confirmed(2024, 1, "video", 1000),
            PriceRecord::confirmed(2024, 2, "video", 1100),
        ]);

        let mut incoming = Document::new();
        incoming.set_path("name", json!("New"));
        incoming.merge_prices(&[
            PriceRecord::confirmed(2024, 2, "video", 1200),
            PriceRecord::confirmed(2024, 2, "live", 300),
        ]);

        upsert_document(&mut existing, &incoming);

        assert_eq!(existing.get("name"), Some(&json!("New")));
        assert_eq!(existing.get("region"), Some(&json!("north")));
        assert_eq!(
            existing.prices(),
            vec![
                PriceRecord::confirmed(2024, 1, "video", 1000),
                PriceRecord::confirmed(2024, 2, "video", 1200),
                PriceRecord::confirmed(2024, 2, "live", 300),
            ]
        );
    }

    #[test]
    fn test_upsert_keeps_stored_price_entries_it_cannot_parse_strictly() {
        let mut existing: Document = serde_json::from_value(json!({
            "name": "Alice",
            "prices": [
                {"year": 2024, "month": 1, "type": "video", "price": 1000.0},
                {"year": 2024, "month": 2, "type": "video", "price": 1100, "_id": "abc"}
            ]
        }))
        .unwrap();

        let mut incoming = Document::new();
        incoming.merge_prices(&[PriceRecord::confirmed(2024, 3, "video", 1200)]);

        upsert_document(&mut existing, &incoming);

        assert_eq!(
            existing.get(fields::PRICES),
            Some(&json!([
                {"year": 2024, "month": 1, "type": "video", "price": 1000.0},
                {"year": 2024, "month": 2, "type": "video", "price": 1100, "_id": "abc"},
                {"year": 2024, "month": 3, "type": "video", "price": 1200, "status": "confirmed"}
            ]))
        );
        assert_eq!(existing.prices().len(), 3);
        assert_eq!(existing.find_price("video").unwrap().price, 1000);
    }

    #[test]
    fn test_upsert_into_empty_document() {
        let mut existing = Document::new();
        let mut incoming = Document::new();
        incoming.set_path("name", json!("Alice"));
        incoming.merge_prices(&[PriceRecord::confirmed(2024, 3, "video", 500)]);

        upsert_document(&mut existing, &incoming);
        assert_eq!(existing, incoming);
    }
}
