use serde::Serialize;

use crate::error::AppError;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LeadSource {
    pub key: String,
    pub label: String,
    /// When set, a lead from this source must also carry a WhatsApp number.
    pub requires_secondary_contact: bool,
}

impl LeadSource {
    fn new(key: &str, label: &str, requires_secondary_contact: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            requires_secondary_contact,
        }
    }
}

/// Catalogue of allowed lead origins. Lookup only, no state.
#[derive(Clone, Debug)]
pub struct LeadSourceRegistry {
    sources: Vec<LeadSource>,
}

impl Default for LeadSourceRegistry {
    fn default() -> Self {
        Self {
            sources: vec![
                LeadSource::new("whatsapp", "WhatsApp", true),
                LeadSource::new("walk_in", "Walk-in", false),
                LeadSource::new("phone_call", "Phone call", false),
                LeadSource::new("referral", "Referral", false),
                LeadSource::new("social_media", "Social media", false),
                LeadSource::new("website", "Website", false),
                LeadSource::new("email", "Email", false),
            ],
        }
    }
}

impl LeadSourceRegistry {
    pub fn new(sources: Vec<LeadSource>) -> Self {
        Self { sources }
    }

    /// Builds the catalogue from `key` / `key:secondary` entries, falling back to the
    /// defaults when no entries are configured.
    pub fn from_config(entries: Option<&[String]>) -> Result<Self, AppError> {
        let Some(entries) = entries.filter(|e| !e.is_empty()) else {
            return Ok(Self::default());
        };

        let mut sources: Vec<LeadSource> = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.trim();
            let (key, flag) = match entry.split_once(':') {
                Some((key, flag)) => (key.trim(), Some(flag.trim())),
                None => (entry, None),
            };
            if key.is_empty() {
                return Err(AppError::Config(format!("Invalid lead source entry '{}'", entry)));
            }
            let requires_secondary_contact = match flag {
                None => false,
                Some("secondary") => true,
                Some(other) => {
                    return Err(AppError::Config(format!(
                        "Unknown lead source flag '{}' for '{}'",
                        other, key
                    )));
                }
            };
            let key = key.to_lowercase();
            if sources.iter().any(|s| s.key == key) {
                return Err(AppError::Config(format!("Duplicate lead source '{}'", key)));
            }
            let label = key.replace('_', " ");
            sources.push(LeadSource {
                key,
                label,
                requires_secondary_contact,
            });
        }
        Ok(Self { sources })
    }

    pub fn all(&self) -> &[LeadSource] {
        &self.sources
    }

    pub fn get(&self, key: &str) -> Option<&LeadSource> {
        let key = key.trim();
        self.sources.iter().find(|s| s.key.eq_ignore_ascii_case(key))
    }

    pub fn requires_secondary_contact(&self, key: &str) -> bool {
        self.get(key).is_some_and(|s| s.requires_secondary_contact)
    }
}
