//! Forwarding decisions. Pure functions over [`RelayConfig`].

use chanrelay_config::RelayConfig;

/// Decide whether a message with `text` should be forwarded.
///
/// Disabled config never forwards. With keyword filters present, at least one
/// must occur in `text` (case-insensitive substring); without filters every
/// message passes. Blank filter entries are ignored.
pub fn should_forward(config: &RelayConfig, text: &str) -> bool {
    if !config.enabled {
        return false;
    }

    let mut keywords = config
        .keyword_filters
        .iter()
        .filter(|k| !k.trim().is_empty())
        .peekable();
    if keywords.peek().is_none() {
        return true;
    }

    let haystack = text.to_lowercase();
    keywords.any(|k| haystack.contains(&k.to_lowercase()))
}

/// Whether posts from `channel_id` are watched at all.
///
/// An empty allowlist monitors every channel.
pub fn is_monitored(config: &RelayConfig, channel_id: &str) -> bool {
    config.monitored_channels.is_empty() || config.monitored_channels.contains(channel_id)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn enabled_with(filters: &[&str]) -> RelayConfig {
        RelayConfig {
            enabled: true,
            keyword_filters: filters.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("")]
    #[case("anything")]
    #[case("Big SALE today")]
    fn disabled_never_forwards(#[case] text: &str) {
        let mut cfg = enabled_with(&["sale"]);
        cfg.enabled = false;
        assert!(!should_forward(&cfg, text));

        cfg.keyword_filters.clear();
        assert!(!should_forward(&cfg, text));
    }

    #[rstest]
    #[case("hello")]
    #[case("no keywords configured")]
    #[case("مرحبا")]
    fn empty_filters_forward_everything(#[case] text: &str) {
        assert!(should_forward(&enabled_with(&[]), text));
    }

    #[rstest]
    #[case("Big SALE today", true)]
    #[case("wholesale prices", true)]
    #[case("no deals", false)]
    #[case("", false)]
    fn keyword_match_is_case_insensitive(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(should_forward(&enabled_with(&["sale"]), text), expected);
    }

    #[test]
    fn uppercase_filter_matches_lowercase_text() {
        assert!(should_forward(&enabled_with(&["PROMO"]), "promo code inside"));
    }

    #[test]
    fn any_filter_is_enough() {
        let cfg = enabled_with(&["sale", "promo"]);
        assert!(should_forward(&cfg, "new PROMO"));
        assert!(!should_forward(&cfg, "nothing relevant"));
    }

    #[test]
    fn non_ascii_keywords() {
        let cfg = enabled_with(&["ÜBER"]);
        assert!(should_forward(&cfg, "das über-angebot"));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let cfg = enabled_with(&["", "  "]);
        assert!(should_forward(&cfg, "anything goes"));

        let cfg = enabled_with(&["", "promo"]);
        assert!(!should_forward(&cfg, "anything goes"));
    }

    #[test]
    fn decision_is_repeatable() {
        let cfg = enabled_with(&["sale"]);
        for text in ["Big SALE", "nope", ""] {
            assert_eq!(should_forward(&cfg, text), should_forward(&cfg, text));
        }
    }

    #[test]
    fn empty_allowlist_monitors_all() {
        assert!(is_monitored(&RelayConfig::default(), "-100200"));
    }

    #[test]
    fn allowlist_is_exact() {
        let cfg = RelayConfig {
            monitored_channels: ["100".to_string()].into(),
            ..Default::default()
        };
        assert!(is_monitored(&cfg, "100"));
        assert!(!is_monitored(&cfg, "200"));
        assert!(!is_monitored(&cfg, "1000"));
    }
}
