//! Per-session transcription state.

/// Outcome of one audio segment after both tracks, filtering and fusion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SegmentResult {
    /// Raw Darija track text, trimmed.
    pub darija: String,
    /// Raw French track text, trimmed.
    pub french: String,
    /// Fused sentence; empty when the segment was discarded.
    pub fused: String,
    /// Assigned only when the fused output is non-empty.
    pub segment_id: Option<u64>,
}

impl SegmentResult {
    /// A discarded or silent segment.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fused.is_empty()
    }
}

/// Mutable state scoped to one recording session.
///
/// Owned by the caller and threaded through segment processing, so two
/// concurrent sessions can never see each other's duplicates or ids.
#[derive(Debug, Default)]
pub struct SessionContext {
    last_fingerprint: Option<String>,
    next_segment_id: u64,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint of one recognized pair, order-sensitive.
    pub fn fingerprint(darija: &str, french: &str) -> String {
        format!("{}|{}", darija, french)
    }

    /// True when the pair matches the immediately preceding accepted segment.
    pub fn is_duplicate(&self, fingerprint: &str) -> bool {
        self.last_fingerprint.as_deref() == Some(fingerprint)
    }

    /// Accept a segment: remember its fingerprint and hand out the next id.
    ///
    /// Called only after fusion produced non-empty text, so discarded
    /// segments never advance the id sequence or the duplicate window.
    pub fn accept(&mut self, fingerprint: String) -> u64 {
        self.last_fingerprint = Some(fingerprint);
        let id = self.next_segment_id;
        self.next_segment_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_strictly_increasing() {
        let mut session = SessionContext::new();
        let a = session.accept("a|".to_string());
        let b = session.accept("b|".to_string());
        let c = session.accept("c|".to_string());
        assert!(a < b && b < c);
    }

    #[test]
    fn test_duplicate_matches_only_last_accepted() {
        let mut session = SessionContext::new();
        session.accept(SessionContext::fingerprint("salam", "bonjour"));
        assert!(session.is_duplicate("salam|bonjour"));

        session.accept(SessionContext::fingerprint("", "merci"));
        // Older fingerprints no longer count
        assert!(!session.is_duplicate("salam|bonjour"));
        assert!(session.is_duplicate("|merci"));
    }

    #[test]
    fn test_fresh_session_has_no_duplicates() {
        let session = SessionContext::new();
        assert!(!session.is_duplicate("|"));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        assert_ne!(
            SessionContext::fingerprint("a", "b"),
            SessionContext::fingerprint("b", "a")
        );
    }

    #[test]
    fn test_empty_segment() {
        let segment = SegmentResult::empty();
        assert!(segment.is_empty());
        assert!(segment.segment_id.is_none());
    }
}
