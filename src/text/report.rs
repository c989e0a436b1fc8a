//! Structured medical report generation.

use std::fmt;
use std::sync::Arc;

use crate::text::generator::TextGenerator;

/// Placeholder for sections the consultation did not cover.
pub const SECTION_NOT_SPECIFIED: &str = "Non précisé dans la consultation";

/// Returned verbatim when there is no transcript to report on.
pub const EMPTY_TRANSCRIPT_MESSAGE: &str = "Impossible de générer un rapport: transcription vide";

/// The six mandatory report sections, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSection {
    Motif,
    Antecedents,
    ExamenClinique,
    Diagnostic,
    PlanDeTraitement,
    Recommandations,
}

impl ReportSection {
    pub const ALL: [ReportSection; 6] = [
        ReportSection::Motif,
        ReportSection::Antecedents,
        ReportSection::ExamenClinique,
        ReportSection::Diagnostic,
        ReportSection::PlanDeTraitement,
        ReportSection::Recommandations,
    ];

    /// Uppercase heading as the generation prompt mandates it.
    pub fn heading(&self) -> &'static str {
        match self {
            ReportSection::Motif => "MOTIF DE CONSULTATION",
            ReportSection::Antecedents => "ANTÉCÉDENTS",
            ReportSection::ExamenClinique => "EXAMEN CLINIQUE",
            ReportSection::Diagnostic => "DIAGNOSTIC",
            ReportSection::PlanDeTraitement => "PLAN DE TRAITEMENT",
            ReportSection::Recommandations => "RECOMMANDATIONS",
        }
    }
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.heading())
    }
}

/// A generated report split into its mandatory sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicalReport {
    pub sections: Vec<(ReportSection, String)>,
}

impl MedicalReport {
    /// Split generated text on the known headings.
    ///
    /// Headings may carry list markers, markdown emphasis or a trailing
    /// colon; sections absent from the text are filled with the
    /// not-specified placeholder.
    pub fn parse(text: &str) -> Self {
        let mut bodies: Vec<Vec<&str>> = vec![Vec::new(); ReportSection::ALL.len()];
        let mut current: Option<usize> = None;

        for line in text.lines() {
            if let Some(index) = match_heading(line) {
                current = Some(index);
                continue;
            }
            if let Some(index) = current {
                bodies[index].push(line);
            }
        }

        let sections = ReportSection::ALL
            .iter()
            .zip(bodies)
            .map(|(&section, lines)| {
                let body = lines.join("\n").trim().to_string();
                if body.is_empty() {
                    (section, SECTION_NOT_SPECIFIED.to_string())
                } else {
                    (section, body)
                }
            })
            .collect();

        Self { sections }
    }

    /// Render back to plain text with one heading per section.
    pub fn to_text(&self) -> String {
        self.sections
            .iter()
            .map(|(section, body)| format!("{}\n{}", section.heading(), body))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn match_heading(line: &str) -> Option<usize> {
    let stripped: String = line
        .trim()
        .trim_start_matches(['-', '#', '*', ' '])
        .trim_end_matches(['*', ':', ' '])
        .to_uppercase();
    ReportSection::ALL
        .iter()
        .position(|section| section.heading() == stripped)
}

/// Produces the consultation report from the consolidated transcript.
pub struct ReportGenerator {
    generator: Arc<dyn TextGenerator>,
}

impl ReportGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate the report text.
    ///
    /// An empty transcript short-circuits to a fixed message without
    /// calling the generator; a generation failure is surfaced as report
    /// text rather than an error, so the caller always has something to show.
    pub fn generate(&self, transcript: &str) -> String {
        if transcript.trim().is_empty() {
            return EMPTY_TRANSCRIPT_MESSAGE.to_string();
        }

        match self.generator.generate(&report_prompt(transcript)) {
            Ok(report) if !report.trim().is_empty() => report.trim().to_string(),
            Ok(_) => {
                eprintln!("[report] empty completion");
                "Erreur de génération du rapport: réponse vide".to_string()
            }
            Err(e) => {
                eprintln!("[report] generation failed: {}", e);
                format!("Erreur de génération du rapport: {}", e)
            }
        }
    }

    /// Generate and split into the six mandatory sections.
    pub fn generate_structured(&self, transcript: &str) -> Option<MedicalReport> {
        if transcript.trim().is_empty() {
            return None;
        }
        Some(MedicalReport::parse(&self.generate(transcript)))
    }
}

fn report_prompt(transcript: &str) -> String {
    format!(
        "Tu es un médecin expert en rédaction de comptes rendus médicaux.\n\
         Génère un compte rendu médical structuré et professionnel à partir de \
         cette transcription d'une consultation:\n\n\
         Transcription: \"{transcript}\"\n\n\
         Structure obligatoire:\n\
         - MOTIF DE CONSULTATION\n\
         - ANTÉCÉDENTS\n\
         - EXAMEN CLINIQUE\n\
         - DIAGNOSTIC\n\
         - PLAN DE TRAITEMENT\n\
         - RECOMMANDATIONS\n\n\
         INSTRUCTIONS IMPORTANTES:\n\
         1. MAINTIENS uniquement les informations présentes dans la transcription\n\
         2. N'INVENTE aucune information médicale\n\
         3. Si une section ne peut pas être remplie faute d'informations, \
         indique \"Non précisé dans la consultation\"\n\
         4. UTILISE un français médical professionnel et adapté"
    )
}
