// File: donutwatch-core/src/catalog.rs
//
// The static table of metrics the DonutSMP endpoints are known to report.
// Adding a metric means adding one row here; the normalizer and the sensor
// layer are both driven off this table.

/// How a metric's wire value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Fractional currency amount.
    Money,
    /// Integer count, truncated from whatever numeric form the API sends.
    Count,
    /// Opaque text, passed through as-is.
    Text,
}

/// One tracked metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDef {
    pub key: &'static str,
    pub display_name: &'static str,
    pub kind: ValueKind,
}

pub const METRICS: &[MetricDef] = &[
    MetricDef { key: "money", display_name: "Money", kind: ValueKind::Money },
    MetricDef { key: "shards", display_name: "Shards", kind: ValueKind::Count },
    MetricDef { key: "kills", display_name: "Kills", kind: ValueKind::Count },
    MetricDef { key: "deaths", display_name: "Deaths", kind: ValueKind::Count },
    MetricDef { key: "playtime", display_name: "Playtime", kind: ValueKind::Count },
    MetricDef { key: "placed_blocks", display_name: "Placed Blocks", kind: ValueKind::Count },
    MetricDef { key: "broken_blocks", display_name: "Broken Blocks", kind: ValueKind::Count },
    MetricDef { key: "mobs_killed", display_name: "Mobs Killed", kind: ValueKind::Count },
    MetricDef { key: "money_spent_on_shop", display_name: "Money Spent on Shop", kind: ValueKind::Money },
    MetricDef { key: "money_made_from_sell", display_name: "Money Made from Selling", kind: ValueKind::Money },
    MetricDef { key: "location", display_name: "Location", kind: ValueKind::Text },
    MetricDef { key: "rank", display_name: "Rank", kind: ValueKind::Text },
];

/// Catalog entry for `key`, if the key is a known metric.
pub fn find(key: &str) -> Option<&'static MetricDef> {
    METRICS.iter().find(|def| def.key == key)
}

/// Coercion kind for `key`. Unknown keys have no kind and are kept as text.
pub fn kind_of(key: &str) -> Option<ValueKind> {
    find(key).map(|def| def.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_keys_are_unique() {
        let keys: HashSet<&str> = METRICS.iter().map(|def| def.key).collect();
        assert_eq!(keys.len(), METRICS.len());
    }

    #[test]
    fn test_known_kinds_match_the_wire_format() {
        assert_eq!(kind_of("money"), Some(ValueKind::Money));
        assert_eq!(kind_of("money_made_from_sell"), Some(ValueKind::Money));
        assert_eq!(kind_of("kills"), Some(ValueKind::Count));
        assert_eq!(kind_of("playtime"), Some(ValueKind::Count));
        assert_eq!(kind_of("rank"), Some(ValueKind::Text));
        assert_eq!(kind_of("location"), Some(ValueKind::Text));
        assert_eq!(kind_of("favorite_color"), None);
    }

    #[test]
    fn test_find_returns_display_names() {
        let def = find("placed_blocks").expect("catalog entry");
        assert_eq!(def.display_name, "Placed Blocks");
    }
}
