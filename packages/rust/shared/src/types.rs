//! Core domain types for FounderWiki enrichment.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// InputRecord
// ---------------------------------------------------------------------------

/// One row of the input founder CSV. Field names map to the CSV headers.
///
/// The founder name is the unique key for the whole run: the tracker's
/// completed set, the result store, and the exported table are all keyed by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRecord {
    /// Founder name (unique key).
    #[serde(rename = "Founder Name")]
    pub name: String,
    /// Role title, e.g. "Founder/CEO".
    #[serde(rename = "Title")]
    pub title: String,
    /// Company the founder started.
    #[serde(rename = "Company Founded")]
    pub company: String,
    /// Free-text bio from the input set.
    #[serde(rename = "Description")]
    pub description: String,
}

impl InputRecord {
    /// Build the descriptive text handed to verification, combining role,
    /// company, and bio the way the lookup expects them.
    pub fn lookup_description(&self) -> String {
        let mut description = format!("{} at {}", self.title, self.company);
        if !self.description.is_empty() {
            description.push_str(&format!(". {}", self.description));
        }
        if !self.company.is_empty() {
            description.push_str(&format!(". Company: {}", self.company));
        }
        description
    }
}

// ---------------------------------------------------------------------------
// CareerRecord and nested shapes
// ---------------------------------------------------------------------------

/// The enriched career record stored per founder after a confirmed match.
///
/// This is the shape the extraction prompt asks the model to emit. Every field
/// defaults when absent — the JSON arrives from an LLM, and a missing field is
/// an empty value, not a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerRecord {
    /// One-line description focusing on current role and main achievement.
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub education: Education,
    #[serde(default)]
    pub career: Career,
    /// Wikipedia page the record was extracted from. Attached by the pipeline
    /// after extraction, never produced by the model.
    #[serde(default)]
    pub source_url: String,
}

/// Education block of a [`CareerRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub field: String,
}

/// Career block of a [`CareerRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Career {
    #[serde(default)]
    pub current_role: CurrentRole,
    /// Past positions, most recent first. Variable length — the exporter
    /// discovers the global maximum to fix the output schema width.
    #[serde(default)]
    pub experience: Vec<Experience>,
    /// Free-text total, e.g. "15+ years" (the model calculates it).
    #[serde(default)]
    pub total_years_experience: String,
}

/// The founder's current position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentRole {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    /// Time period, e.g. "2020 - Present".
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

/// One company in the experience history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub company: String,
    /// Roles held at this company, most recent first.
    #[serde(default)]
    pub roles: Vec<ExperienceRole>,
}

/// A single role within an [`Experience`] entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRole {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_description_full() {
        let record = InputRecord {
            name: "Brian Armstrong".into(),
            title: "Founder/CEO".into(),
            company: "Coinbase".into(),
            description: "Crypto exchange pioneer".into(),
        };
        assert_eq!(
            record.lookup_description(),
            "Founder/CEO at Coinbase. Crypto exchange pioneer. Company: Coinbase"
        );
    }

    #[test]
    fn lookup_description_without_bio() {
        let record = InputRecord {
            name: "Jane Doe".into(),
            title: "CEO".into(),
            company: "Acme".into(),
            description: String::new(),
        };
        assert_eq!(record.lookup_description(), "CEO at Acme. Company: Acme");
    }

    #[test]
    fn career_record_parses_with_missing_fields() {
        // Extraction output frequently omits education or achievements.
        let json = r#"{
            "short_description": "CEO of Acme",
            "career": {
                "current_role": { "title": "CEO", "company": "Acme" },
                "experience": [
                    { "company": "Initech", "roles": [ { "title": "Engineer" } ] }
                ]
            }
        }"#;
        let record: CareerRecord = serde_json::from_str(json).expect("parse partial record");
        assert_eq!(record.short_description, "CEO of Acme");
        assert_eq!(record.career.current_role.title, "CEO");
        assert_eq!(record.career.experience.len(), 1);
        assert!(record.education.degree.is_empty());
        assert!(record.source_url.is_empty());
    }

    #[test]
    fn career_record_roundtrip() {
        let record = CareerRecord {
            short_description: "Founder of Example".into(),
            education: Education {
                degree: "BSc".into(),
                institution: "MIT".into(),
                field: "CS".into(),
            },
            career: Career {
                current_role: CurrentRole {
                    title: "CEO".into(),
                    company: "Example".into(),
                    description: "Runs the company".into(),
                    duration: "2019 - Present".into(),
                    achievements: vec!["Raised Series B".into()],
                },
                experience: vec![Experience {
                    company: "BigCo".into(),
                    roles: vec![ExperienceRole {
                        title: "Staff Engineer".into(),
                        duration: "2015 - 2019".into(),
                        description: "Infra work".into(),
                        responsibilities: vec!["On-call".into()],
                        achievements: vec!["Shipped v2".into()],
                    }],
                }],
                total_years_experience: "10+ years".into(),
            },
            source_url: "https://en.wikipedia.org/wiki/Example".into(),
        };

        let json = serde_json::to_string(&record).expect("serialize");
        let parsed: CareerRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, record);
    }
}
