//! Contamination filters for recognition and fusion output.
//!
//! Speech engines trained on public video hallucinate channel boilerplate
//! on near-silent audio. A track containing a known phrase discards the
//! whole segment; fused output is re-checked against a lowercase list.

/// True when the raw track text contains any known boilerplate phrase.
pub fn contains_boilerplate(text: &str, phrases: &[String]) -> bool {
    if text.is_empty() {
        return false;
    }
    phrases.iter().any(|phrase| text.contains(phrase.as_str()))
}

/// True when the fused sentence contains a reject substring, compared in
/// lowercase.
pub fn fused_is_contaminated(fused: &str, reject_phrases: &[String]) -> bool {
    let lowered = fused.to_lowercase();
    reject_phrases
        .iter()
        .any(|phrase| lowered.contains(phrase.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;

    #[test]
    fn test_detects_french_boilerplate() {
        let filters = FilterConfig::default();
        assert!(contains_boilerplate(
            "Merci d'avoir regardé cette vidéo !",
            &filters.boilerplate_phrases
        ));
    }

    #[test]
    fn test_detects_arabic_boilerplate() {
        let filters = FilterConfig::default();
        assert!(contains_boilerplate(
            "اشتركوا في القناة من فضلكم",
            &filters.boilerplate_phrases
        ));
    }

    #[test]
    fn test_clean_text_passes() {
        let filters = FilterConfig::default();
        assert!(!contains_boilerplate(
            "J'ai mal à la tête depuis deux jours",
            &filters.boilerplate_phrases
        ));
    }

    #[test]
    fn test_empty_text_is_not_boilerplate() {
        let filters = FilterConfig::default();
        assert!(!contains_boilerplate("", &filters.boilerplate_phrases));
    }

    #[test]
    fn test_fused_rejection_is_case_insensitive() {
        let filters = FilterConfig::default();
        assert!(fused_is_contaminated(
            "Abonnez-VOUS pour plus de contenu",
            &filters.fused_reject_phrases
        ));
        assert!(fused_is_contaminated(
            "N'oubliez pas de LIKE",
            &filters.fused_reject_phrases
        ));
    }

    #[test]
    fn test_fused_clean_sentence_passes() {
        let filters = FilterConfig::default();
        assert!(!fused_is_contaminated(
            "Le patient se plaint de douleurs abdominales",
            &filters.fused_reject_phrases
        ));
    }
}
