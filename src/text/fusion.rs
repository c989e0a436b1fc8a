//! Fusion of the Darija and French tracks into one French sentence.

use std::sync::Arc;

use crate::text::filters;
use crate::text::generator::TextGenerator;

/// Merges the two language tracks of one segment.
///
/// A single non-empty track passes through trimmed without touching the
/// generator. When both tracks carry text, the generator picks the clearer
/// reading; if it fails, the French track wins by default since it needs no
/// translation.
pub struct FusionEngine {
    generator: Arc<dyn TextGenerator>,
    reject_phrases: Vec<String>,
}

impl FusionEngine {
    pub fn new(generator: Arc<dyn TextGenerator>, reject_phrases: Vec<String>) -> Self {
        Self {
            generator,
            reject_phrases,
        }
    }

    /// Fuse one recognized pair. Empty output means the segment carried
    /// nothing usable and must be discarded by the caller.
    pub fn fuse(&self, darija: &str, french: &str) -> String {
        let darija = darija.trim();
        let french = french.trim();

        if darija.is_empty() && french.is_empty() {
            return String::new();
        }
        if darija.is_empty() {
            return french.to_string();
        }
        if french.is_empty() {
            return darija.to_string();
        }

        match self.generator.generate(&fusion_prompt(darija, french)) {
            Ok(fused) => {
                let fused = fused.trim().to_string();
                if filters::fused_is_contaminated(&fused, &self.reject_phrases) {
                    String::new()
                } else {
                    fused
                }
            }
            Err(e) => {
                eprintln!("[fusion] {}, keeping single track", e);
                french.to_string()
            }
        }
    }
}

fn fusion_prompt(darija: &str, french: &str) -> String {
    format!(
        "Tu es un expert en transcription médicale marocaine.\n\
         Fusionne ces deux transcriptions en une phrase cohérente en français \
         d'une consultation médicale :\n\n\
         Transcription Darija: \"{darija}\"\n\
         Transcription Française: \"{french}\"\n\n\
         Instructions :\n\
         - Compare les deux transcriptions et choisis la plus claire et cohérente\n\
         - Si la transcription française ne correspond pas au contexte de la darija, ignore-la\n\
         - Formule une phrase simple et naturelle en français en respectant le sens original\n\
         - Ne pas ajouter de termes ou d'interprétations qui ne sont pas dans les transcriptions\n\
         - Retourne une chaîne vide si aucune des transcriptions n'est claire ou cohérente\n\n\
         Important : Utilise uniquement les mots et le sens présents dans les transcriptions, sans ajout."
    )
}
