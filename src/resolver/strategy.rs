use once_cell::sync::Lazy;
use regex::Regex;

/// Matches ids embedded as `rbxassetid://123` or `...?id=123` / `&id=123`
static EMBEDDED_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:rbxassetid://|[?&]id=)(\d+)").expect("valid pattern"));

/// Ways of turning an asset id into the animation id it wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStrategy {
    /// Read the `Location` header of the asset-delivery redirect
    RedirectLocation,

    /// Download the asset payload (XML) and search it
    XmlPayload,
}

/// Strategies in the order they are attempted
pub const ANIMATION_STRATEGIES: &[AnimationStrategy] = &[
    AnimationStrategy::RedirectLocation,
    AnimationStrategy::XmlPayload,
];

/// Finds the first embedded id in `text` that differs from `exclude`
pub fn extract_embedded_id(text: &str, exclude: i64) -> Option<i64> {
    EMBEDDED_ID
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<i64>().ok())
        .find(|id| *id > 0 && *id != exclude)
}
