use once_cell::sync::Lazy;
use regex::Regex;

static IMAGE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg|bmp|tiff|avif)$").unwrap());

// Storage systems append "_<hex>" to avoid name collisions,
// e.g. "cake.png" re-uploaded becomes "cake_9f8e7d6c5b.png".
static DISAMBIGUATION_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_[0-9a-f]{10,}$").unwrap());

/// Canonical comparison key for an uploaded filename.
///
/// Strips one trailing image extension, lowercases, folds dashes into
/// underscores, drops anything outside `[a-z0-9_]`, then strips
/// disambiguation suffixes. Re-uploads stack a fresh suffix on top of
/// the previous one, so suffix stripping repeats until stable — which
/// also makes the whole function idempotent.
///
/// Total: never fails. Degenerate input yields an empty key, which
/// simply matches nothing.
pub fn normalize(name: &str) -> String {
    let base = IMAGE_EXTENSION.replace(name, "");
    let mut key: String = base
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' { '_' } else { c })
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
        .collect();

    loop {
        let stripped = DISAMBIGUATION_SUFFIX.replace(&key, "").into_owned();
        if stripped == key {
            break;
        }
        key = stripped;
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_extension_and_lowercases() {
        assert_eq!(normalize("Chocolate-Cake.PNG"), "chocolate_cake");
        assert_eq!(normalize("sketch.jpg"), "sketch");
        assert_eq!(normalize("photo.webp"), "photo");
    }

    #[test]
    fn test_strips_disambiguation_suffix() {
        assert_eq!(normalize("cake_9f8e7d6c5b.png"), normalize("cake.png"));
        assert_eq!(normalize("photo_0a13eb69d3.png"), "photo");
    }

    #[test]
    fn test_short_hex_tail_is_kept() {
        // Fewer than 10 hex chars is not a storage suffix
        assert_eq!(normalize("img_abc123.png"), "img_abc123");
    }

    #[test]
    fn test_stacked_suffixes_from_reupload() {
        // A re-upload of an already-suffixed file gains a second suffix
        assert_eq!(normalize("recipe_0a13eb69d3_c7de44ba7c.png"), "recipe");
    }

    #[test]
    fn test_dashed_suffix_still_collapses() {
        assert_eq!(normalize("photo-0a13eb69d3.png"), normalize("photo.png"));
    }

    #[test]
    fn test_removes_special_characters() {
        // Only dashes fold to underscores; everything else outside the
        // key alphabet is dropped outright
        assert_eq!(normalize("café & crème (1).jpeg"), "cafcrme1");
    }

    #[test]
    fn test_idempotent() {
        for name in [
            "Chocolate-Cake.PNG",
            "photo_0a13eb69d3.png",
            "photo-0a13eb69d3.png",
            "recipe_0a13eb69d3_c7de44ba7c.png",
            "café & crème (1).jpeg",
            "",
            "...",
            "_0a13eb69d3",
        ] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", name);
        }
    }

    #[test]
    fn test_degenerate_input_yields_empty_key() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!.png"), "");
    }
}
