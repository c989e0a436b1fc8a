//! Consolidation of accepted segments into one session transcript.

use std::sync::Arc;

use crate::asr::session::SegmentResult;
use crate::text::generator::TextGenerator;

/// Turns the ordered segment list into flowing French text.
pub struct ConsolidationEngine {
    generator: Arc<dyn TextGenerator>,
}

impl ConsolidationEngine {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Consolidate segments in their original order.
    ///
    /// Zero usable segments give an empty transcript, a single one is
    /// returned verbatim, and a generator failure degrades to a newline
    /// join so no speech is ever lost to a service outage.
    pub fn consolidate(&self, segments: &[SegmentResult]) -> String {
        let texts: Vec<&str> = segments
            .iter()
            .filter_map(|segment| {
                let text = best_field(segment);
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            })
            .collect();

        match texts.len() {
            0 => String::new(),
            1 => texts[0].to_string(),
            _ => match self.generator.generate(&consolidation_prompt(&texts)) {
                // An empty completion would silently drop speech; join instead
                Ok(consolidated) if !consolidated.trim().is_empty() => {
                    consolidated.trim().to_string()
                }
                Ok(_) => {
                    eprintln!("[consolidation] empty completion, joining segments");
                    texts.join("\n")
                }
                Err(e) => {
                    eprintln!("[consolidation] {}, joining segments", e);
                    texts.join("\n")
                }
            },
        }
    }
}

/// Priority ladder: fused text, else the French track, else Darija.
fn best_field(segment: &SegmentResult) -> &str {
    if !segment.fused.trim().is_empty() {
        segment.fused.trim()
    } else if !segment.french.trim().is_empty() {
        segment.french.trim()
    } else {
        segment.darija.trim()
    }
}

fn consolidation_prompt(texts: &[&str]) -> String {
    let segments_text: Vec<String> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("Segment {}: \"{}\"", i + 1, text))
        .collect();

    format!(
        "Consolide ces segments de transcription en respectant leur ordre et \
         leur sens original :\n\n\
         {}\n\n\
         Instructions :\n\
         1. GARDE l'ordre chronologique des segments\n\
         2. FUSIONNE les segments en gardant leur sens original\n\
         3. ÉVITE les répétitions tout en conservant les informations importantes\n\
         4. N'AJOUTE aucune information qui n'est pas dans les segments\n\
         5. RETOURNE le texte consolidé en paragraphes si nécessaire\n\n\
         Format : Texte fluide en français, respectant la chronologie des segments.",
        segments_text.join("\n")
    )
}
