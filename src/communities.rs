// Community registry and the session that owns it

use crate::error::AppError;
use crate::roster::Roster;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Selecting this entry prints no community on the labels.
pub const EMPTY_COMMUNITY: &str = "VAZIO";

const DEFAULT_COMMUNITIES: [&str; 11] = [
    "CAPELA NOSSA SRA. DE FÁTIMA",
    "CAPELA SAGRADO CORAÇÃO DE JESUS",
    "CAPELA SANT'ANNA",
    "CAPELA SANTA CATARINA",
    "CAPELA SÃO JERÔNIMO",
    "CAPELA SÃO JORGE",
    "CAPELA SÃO JOSÉ",
    "CAPELA S. SEBASTIÃO - MEIO DA SERRA",
    "CAPELA SÃO SEBASTIAO RUA J",
    "MATRIZ",
    EMPTY_COMMUNITY,
];

fn clean_name(name: &str) -> Result<String, AppError> {
    let cleaned = name.trim().to_uppercase();
    if cleaned.is_empty() {
        return Err(AppError::EmptyCommunityName);
    }
    Ok(cleaned)
}

/// Ordered list of community names offered for manual entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityRegistry {
    names: Vec<String>,
}

impl Default for CommunityRegistry {
    fn default() -> Self {
        CommunityRegistry {
            names: DEFAULT_COMMUNITIES.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl CommunityRegistry {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn add(&mut self, name: &str) -> Result<String, AppError> {
        let name = clean_name(name)?;
        if self.contains(&name) {
            return Err(AppError::CommunityExists(name));
        }
        self.names.push(name.clone());
        Ok(name)
    }

    /// Renames in place, keeping the entry's position in the list.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, AppError> {
        let old = old.trim().to_uppercase();
        let new = clean_name(new)?;
        let idx = self
            .names
            .iter()
            .position(|n| *n == old)
            .ok_or_else(|| AppError::CommunityNotFound(old.clone()))?;

        if new != old && self.contains(&new) {
            return Err(AppError::CommunityExists(new));
        }
        self.names[idx] = new.clone();
        Ok(new)
    }

    pub fn remove(&mut self, name: &str) -> Result<String, AppError> {
        let name = name.trim().to_uppercase();
        let idx = self
            .names
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| AppError::CommunityNotFound(name.clone()))?;
        Ok(self.names.remove(idx))
    }

    /// Text printed on the labels for a selection. `VAZIO` and no selection
    /// both print nothing.
    pub fn resolve(&self, selection: Option<&str>) -> Result<String, AppError> {
        let selected = match selection {
            Some(s) => s.trim().to_uppercase(),
            None => return Ok(String::new()),
        };
        if selected.is_empty() || selected == EMPTY_COMMUNITY {
            return Ok(String::new());
        }
        if !self.contains(&selected) {
            return Err(AppError::CommunityNotFound(selected));
        }
        Ok(selected)
    }

    /// Loads the registry, falling back to the built-in list when the file
    /// does not exist yet.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            debug!(path = %path.display(), "no community file, using defaults");
            return Ok(CommunityRegistry::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::RegistryError(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::RegistryError(format!("Invalid JSON in {}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::RegistryError(e.to_string()))?;
        fs::write(path, json)?;
        info!(path = %path.display(), count = self.names.len(), "saved community list");
        Ok(())
    }
}

/// Default location of the registry file.
pub fn default_registry_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pimaco-labels")
        .join("communities.json")
}

/// Holds the registry together with the roster currently loaded, so that
/// community edits reach records that were already read.
#[derive(Debug, Default)]
pub struct Session {
    pub registry: CommunityRegistry,
    roster: Option<Roster>,
}

impl Session {
    pub fn new(registry: CommunityRegistry) -> Self {
        Session {
            registry,
            roster: None,
        }
    }

    pub fn load_roster(&mut self, roster: Roster) {
        self.roster = Some(roster);
    }

    pub fn roster(&self) -> Option<&Roster> {
        self.roster.as_ref()
    }

    /// Renames in the registry and rewrites matching records of the loaded roster.
    pub fn rename_community(&mut self, old: &str, new: &str) -> Result<usize, AppError> {
        let old = old.trim().to_uppercase();
        let new = self.registry.rename(&old, new)?;

        let mut updated = 0;
        if let Some(roster) = self.roster.as_mut() {
            for record in roster.iter_mut().filter(|r| r.community == old) {
                record.community = new.clone();
                updated += 1;
            }
        }
        debug!(%old, %new, updated, "renamed community");
        Ok(updated)
    }
}
