//! Prompt engineering for outline and slide generation
//!
//! Every prompt carries an explicit `Topic:` line. Offline providers key their
//! synthetic content off that line, so keep it on a line of its own.

use super::schema::SchemaSpec;
use crate::utils::truncate_chars;

/// Default research context budget, in characters
pub const DEFAULT_CONTEXT_BUDGET: usize = 12_000;

/// Prompt builder for outline, slide and JSON-instruction prompts
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    /// Maximum characters of research context embedded in a slide prompt
    context_char_budget: usize,
}

impl PromptBuilder {
    /// Create a builder with the default context budget
    pub fn new() -> Self {
        Self {
            context_char_budget: DEFAULT_CONTEXT_BUDGET,
        }
    }

    /// Override the context budget
    pub fn with_context_budget(mut self, chars: usize) -> Self {
        self.context_char_budget = chars;
        self
    }

    /// Current context budget
    pub fn context_char_budget(&self) -> usize {
        self.context_char_budget
    }

    /// Prompt asking for a hierarchical outline of 3-5 sections
    pub fn outline_prompt(&self, topic: &str, slides_count: usize, language: &str) -> String {
        format!(
            r#"Create a professional hierarchical outline for a {slides_count}-slide presentation.
Topic: {topic}
Divide the presentation into 3-5 logical sections (chapters).
Each section should contain a list of relevant slide topics.
Aim for about {slides_count} slide topics in total across all sections.
Ensure the structure flows logically from introduction to conclusion.
Language: {language}.
"#
        )
    }

    /// System prompt for slide synthesis
    pub fn slide_system_prompt(&self, style: &str, language: &str) -> String {
        format!(
            "You are a top-tier research analyst and professional presentation architect.\n\
             Style: {style}.\n\
             Your objective is to transform raw research into dense, substantive insights.\n\
             Output Language: {language}."
        )
    }

    /// Prompt for one slide, embedding research context up to the budget
    pub fn slide_prompt(
        &self,
        slide_title: &str,
        section_title: &str,
        topic: &str,
        context: &str,
        language: &str,
    ) -> String {
        let context = truncate_chars(context, self.context_char_budget);
        let context = if context.trim().is_empty() {
            "(no research context available; rely on well-established knowledge)"
        } else {
            context
        };

        format!(
            r#"Objective: Create comprehensive, authoritative content for a slide titled '{slide_title}'.
Topic: {topic}
Section: {section_title}

Research Context (from web and encyclopedia sources):
{context}

===== CONTENT STANDARDS =====

0. SLIDE TYPE SELECTION:
   - 'statistics': the research contains 3 or more strong numerical data points. Fill the 'statistics' field.
   - 'image': the slide is about a visual concept, product design or emotional impact.
   - 'chart': only when there is clear categorical data for comparison. Fill 'chart_data' with one value per category.
   - 'content': default for informational text.

1. CONTENT DENSITY:
   - Generate 5-8 substantive bullet points, each 1-2 sentences of real information.
   - Use sub-bullets (indented with "  •") for details, examples or statistics.

2. DATA:
   - Include at least 3 specific numbers, statistics or dates.
   - Reference real companies, researchers or institutions by name.

3. STRUCTURE:
   - First bullet: key definition or core concept.
   - Middle bullets: examples, data points, case studies.
   - Final bullet: current trends, outlook or implications.

4. SPEAKER NOTES: 5-7 professional sentences with extra context and caveats.

5. IMAGE QUERY: highly specific, with style keywords such as "4K", "professional photography" or "infographic style".

6. CITATIONS: list every source URL from the research context that you used.

7. LANGUAGE: {language}
"#
        )
    }

    /// Instructions appended for backends without native schema support
    pub fn json_instructions(&self, schema: &SchemaSpec) -> String {
        format!(
            "\n\nYou MUST respond with valid JSON that matches this schema:\n{}\n\n\
             Respond ONLY with the JSON object, no other text.",
            schema.to_prompt_string()
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
