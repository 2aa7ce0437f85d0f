use crate::models::SongIdentity;

/// Literal separator between artist and track in a now-playing title
pub const SEPARATOR: &str = " - ";

/// Split `"Artist - Track"` into its parts.
///
/// Everything after the first separator belongs to the track, so
/// `"Artist - Track - Remix"` keeps `"Track - Remix"` intact. Returns `None`
/// when there is no separator or either side is blank.
pub fn parse(raw: &str) -> Option<SongIdentity> {
    let (artist, track) = raw.split_once(SEPARATOR)?;
    let artist = artist.trim();
    let track = track.trim();

    if artist.is_empty() || track.is_empty() {
        return None;
    }

    Some(SongIdentity::new(artist.to_string(), track.to_string()))
}

/// Cache/dedup key for a raw title.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_split() {
        let song = parse("Queen - Bohemian Rhapsody").unwrap();
        assert_eq!(song.artist(), "Queen");
        assert_eq!(song.track(), "Bohemian Rhapsody");
    }

    #[test]
    fn test_track_keeps_later_separators() {
        let song = parse("Daft Punk - One More Time - Radio Edit").unwrap();
        assert_eq!(song.artist(), "Daft Punk");
        assert_eq!(song.track(), "One More Time - Radio Edit");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let song = parse("   The Cure  -   Lovesong   ").unwrap();
        assert_eq!(song.artist(), "The Cure");
        assert_eq!(song.track(), "Lovesong");
    }

    #[test]
    fn test_no_separator() {
        assert!(parse("Station jingle").is_none());
        assert!(parse("AC-DC").is_none());
        assert!(parse("Artist -Track").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_blank_side_is_failure() {
        assert!(parse(" - Track").is_none());
        assert!(parse("Artist - ").is_none());
        assert!(parse("  -   ").is_none());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Queen - Innuendo \n"), "Queen - Innuendo");
    }
}
