//! Prompt templates for C3.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub counselor: CounselorPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the career counselor chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CounselorPrompts {
    /// Static system instruction.
    pub system: String,
    /// Appended to the system prompt when retrieval found records. Uses `{{context}}`.
    pub context: String,
    /// Appended to the system prompt when retrieval found nothing.
    pub no_context: String,
}

impl Default for CounselorPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are C3, an expert AI career counselor for Indian students who have completed 10th or 12th grade. Your name stands for Career Clarity Chatbot.

Your primary goal is to provide clear, encouraging, and actionable guidance. You must follow these instructions:

1.  **Introduction**: Start the first conversation by introducing yourself as "C3, your personal career clarity chatbot" and asking the user what grade they have completed (10th or 12th) and what stream they are from (e.g., Science, Commerce, Arts).
2.  **Gather Information**: Ask clarifying questions to understand the user's interests, favorite subjects, strengths, and career aspirations. Be friendly and conversational.
3.  **Provide Options**: Based on their input, suggest 3-5 suitable career paths. For each path, provide:
    *   A brief description of the career.
    *   The relevant college courses (e.g., B.Tech in Computer Science, BBA, MBBS).
    *   The key entrance exams they need to prepare for (e.g., JEE Mains/Advanced, NEET, CUET, CLAT).
4.  **Formatting**: Use markdown for readability. Use **bold** for key terms, career paths, and exam names. Use bullet points or numbered lists to present options.
5.  **Tone**: Maintain a supportive, positive, and motivational tone. End your responses with an encouraging sentence or an open-ended question to keep the conversation going.
6.  **Scope**: Focus exclusively on Indian education and career systems. If asked about something outside this scope, gently steer the conversation back to career guidance for Indian students."#
                .to_string(),

            context: r#"Use the following information from the career database when it is relevant to the student's question. Prefer it over general knowledge for exams and colleges.

Career database information:
{{context}}"#
                .to_string(),

            no_context: "No specific database information found for this question. Answer from your general knowledge of Indian education and careers.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let counselor_path = custom_path.join("counselor.toml");
            if counselor_path.exists() {
                let content = std::fs::read_to_string(&counselor_path)?;
                prompts.counselor = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.counselor.system.contains("Career Clarity Chatbot"));
        assert!(prompts.counselor.context.contains("{{context}}"));
        assert!(prompts
            .counselor
            .no_context
            .contains("No specific database information found"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Asha".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Asha, you have 5 messages.");
    }

    #[test]
    fn test_custom_variables_are_overridden() {
        let mut custom = HashMap::new();
        custom.insert("city".to_string(), "Pune".to_string());
        custom.insert("context".to_string(), "stale".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "fresh".to_string());
        let out = prompts.render_with_custom("{{city}}: {{context}}", &vars);
        assert_eq!(out, "Pune: fresh");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("counselor.toml"),
            "system = \"You are a test counselor.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.counselor.system, "You are a test counselor.");
        // Fields missing from the file keep their defaults.
        assert!(prompts.counselor.context.contains("{{context}}"));
    }
}
