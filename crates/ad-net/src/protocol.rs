//! Hit datagram classification

use ad_core::HitSource;

/// Max bytes read per hit datagram; anything longer is truncated by the socket
pub const HIT_DATAGRAM_MAX: usize = 32;

/// Classify a raw hit datagram.
///
/// Matching is a case-insensitive substring search with precedence
/// KICK > LEFT > RIGHT. Non-UTF-8 payloads and payloads naming no source
/// yield `None`.
pub fn classify(payload: &[u8]) -> Option<HitSource> {
    let text = std::str::from_utf8(payload).ok()?;
    let text = text.trim().to_ascii_uppercase();

    [HitSource::Kick, HitSource::Left, HitSource::Right]
        .into_iter()
        .find(|source| text.contains(source.tag()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_each_source() {
        assert_eq!(classify(b"LEFT_HIT"), Some(HitSource::Left));
        assert_eq!(classify(b"right"), Some(HitSource::Right));
        assert_eq!(classify(b"  Kick\n"), Some(HitSource::Kick));
    }

    #[test]
    fn test_precedence_kick_left_right() {
        assert_eq!(classify(b"LEFT KICK"), Some(HitSource::Kick));
        assert_eq!(classify(b"RIGHT+LEFT"), Some(HitSource::Left));
    }

    #[test]
    fn test_drops_garbage() {
        assert_eq!(classify(b""), None);
        assert_eq!(classify(b"PING"), None);
        assert_eq!(classify(&[0xff, 0xfe, b'L', b'E', b'F', b'T']), None);
    }
}
