//! Advisory Resolver
//!
//! Maps a predicted class label to agronomic advice. The table is built once
//! from a static list and never changes at runtime. Lookups are exact: potato
//! and wheat use `Healthy` while cotton uses `healthy`, and both are listed.

use std::collections::HashMap;

/// Stock advisory texts, keyed by class label as the models spell them
pub const ADVISORIES: &[(&str, &str)] = &[
    // Potato
    (
        "Early_Blight",
        "Early blight (Alternaria solani) detected. Remove infected lower leaves, avoid overhead \
         irrigation and apply a protectant fungicide such as chlorothalonil or mancozeb every 7 to \
         10 days. Rotate away from potato and tomato for at least two seasons.",
    ),
    (
        "Late_Blight",
        "Late blight (Phytophthora infestans) detected. Act immediately: destroy infected plants, \
         apply a systemic fungicide such as metalaxyl or cymoxanil and keep foliage dry. Inspect \
         neighbouring fields, the disease spreads quickly in cool and humid weather.",
    ),
    (
        "Healthy",
        "No disease detected. The leaf looks healthy. Keep monitoring regularly, maintain balanced \
         fertilization and water at the base of the plant.",
    ),
    // Cotton
    (
        "bacterial_blight",
        "Bacterial blight (Xanthomonas citri pv. malvacearum) detected. Use copper oxychloride \
         sprays, remove crop debris after harvest and plant acid-delinted or resistant seed next \
         season.",
    ),
    (
        "curl_virus",
        "Cotton leaf curl virus detected. Control the whitefly vector with a recommended \
         insecticide or neem oil, uproot severely affected plants and remove weed hosts around \
         the field.",
    ),
    (
        "fussarium_wilt",
        "Fusarium wilt detected. The fungus persists in soil, so rotate with non-host crops, \
         improve drainage, apply potash and use wilt-resistant varieties for the next sowing.",
    ),
    (
        "healthy",
        "No disease detected. The cotton plant looks healthy. Continue scouting for whitefly and \
         bollworm, and keep irrigation and nutrient schedules steady.",
    ),
    // Wheat
    (
        "Brown_Rust",
        "Brown (leaf) rust detected. Spray a triazole fungicide such as propiconazole or \
         tebuconazole at first sign of pustules, and prefer rust-resistant varieties in the next \
         season.",
    ),
    (
        "Yellow_Rust",
        "Yellow (stripe) rust detected. Apply propiconazole or tebuconazole without delay, repeat \
         after 15 days if stripes keep spreading, and avoid excess nitrogen which favours the \
         disease.",
    ),
];

/// Immutable label -> advice lookup
#[derive(Debug, Clone)]
pub struct AdvisoryTable {
    entries: HashMap<String, String>,
}

impl Default for AdvisoryTable {
    fn default() -> Self {
        Self::from_entries(ADVISORIES)
    }
}

impl AdvisoryTable {
    pub fn from_entries(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(label, text)| (label.to_string(), text.to_string()))
                .collect(),
        }
    }

    /// Advice for `label`, or `None` when the table has no entry for it
    pub fn advisory_for(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// Labels of `labels` that have no advisory text
    pub fn missing<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        labels
            .into_iter()
            .filter(|label| !self.entries.contains_key(*label))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::Crop;

    #[test]
    fn test_every_stock_label_has_advice() {
        let table = AdvisoryTable::default();
        for crop in Crop::ALL {
            let labels = crop.default_labels();
            assert!(
                table.missing(labels.iter()).is_empty(),
                "{} labels without advice",
                crop
            );
        }
    }

    #[test]
    fn test_healthy_casing_is_distinct() {
        let table = AdvisoryTable::default();
        let potato = table.advisory_for("Healthy").unwrap();
        let cotton = table.advisory_for("healthy").unwrap();

        assert!(potato.starts_with("No disease detected"));
        assert!(cotton.starts_with("No disease detected"));
        assert_ne!(potato, cotton);
        assert_eq!(table.advisory_for("HEALTHY"), None);
    }

    #[test]
    fn test_unknown_label_is_absent() {
        let table = AdvisoryTable::default();
        assert_eq!(table.advisory_for("Septoria"), None);
        assert_eq!(table.advisory_for(""), None);
    }

    #[test]
    fn test_custom_table() {
        let table = AdvisoryTable::from_entries(&[("a", "advice a")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.advisory_for("a"), Some("advice a"));
        assert_eq!(table.missing(["a", "b"]), vec!["b"]);
    }
}
