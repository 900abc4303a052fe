use std::collections::HashSet;

/// Drops blank and repeated SIDs, keeping first-seen order.
pub fn dedupe_sids<I, S>(sids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    sids.into_iter()
        .map(|sid| sid.as_ref().trim().to_string())
        .filter(|sid| !sid.is_empty() && seen.insert(sid.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_seen_order() {
        let sids = dedupe_sids(["3456789012", "11667051", " 3456789012", "", "9000000000"]);
        assert_eq!(sids, vec!["3456789012", "11667051", "9000000000"]);
    }
}
