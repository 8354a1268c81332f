//! Playback roster: who appears, in what order

use mosaic_core::{MosaicError, Result, XorShiftRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, alias = "englishName", alias = "displayName")]
    pub display_name: String,
    #[serde(default, alias = "koreanName", skip_serializing_if = "Option::is_none")]
    pub secondary_name: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "imageRef")]
    pub image_ref: String,
}

impl Person {
    pub fn new(display_name: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            secondary_name: None,
            image_ref: image_ref.into(),
        }
    }

    fn is_valid(&self) -> bool {
        !self.display_name.trim().is_empty() && !self.image_ref.trim().is_empty()
    }

    pub fn caption(&self) -> String {
        format_caption(&self.display_name)
    }
}

#[derive(Deserialize)]
struct RosterFile {
    #[serde(default)]
    people: Vec<Person>,
}

/// Ordered, non-empty list of people
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    people: Vec<Person>,
}

impl Roster {
    /// Keep the valid entries; fail if none remain
    pub fn new(people: Vec<Person>) -> Result<Self> {
        let total = people.len();
        let people: Vec<Person> = people
            .into_iter()
            .filter(|p| {
                if !p.is_valid() {
                    log::warn!("Skipping roster entry without name or image: {:?}", p);
                }
                p.is_valid()
            })
            .collect();

        if people.is_empty() {
            return Err(MosaicError::RosterError(format!(
                "no usable entries (of {})",
                total
            )));
        }
        Ok(Self { people })
    }

    /// Parse a JSON array of people
    pub fn from_json_str(json: &str) -> Result<Self> {
        let people: Vec<Person> = serde_json::from_str(json)?;
        Self::new(people)
    }

    /// Parse a TOML document of `[[people]]` tables
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let file: RosterFile = toml::from_str(toml_str)?;
        Self::new(file.people)
    }

    /// Load from a `.json` or `.toml` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => Err(MosaicError::RosterError(format!(
                "unsupported roster format: {}",
                path.display()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Position in the roster for an absolute photo index
    pub fn looped_index(&self, absolute: u64) -> usize {
        (absolute % self.people.len() as u64) as usize
    }

    /// The person shown for an absolute photo index
    pub fn person_for(&self, absolute: u64) -> &Person {
        &self.people[self.looped_index(absolute)]
    }

    pub fn shuffle(&mut self, rng: &mut XorShiftRng) {
        rng.shuffle(&mut self.people);
    }
}

/// Supplies the ordered list of people to play
pub trait RosterProvider {
    fn get_roster(&self) -> Result<Roster>;
}

impl RosterProvider for Roster {
    fn get_roster(&self) -> Result<Roster> {
        Ok(self.clone())
    }
}

/// Re-reads a `.json` or `.toml` roster file on every request
#[derive(Debug, Clone)]
pub struct FileRoster {
    path: PathBuf,
}

impl FileRoster {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterProvider for FileRoster {
    fn get_roster(&self) -> Result<Roster> {
        Roster::load(&self.path)
    }
}

/// "JaneDoe" → "JANE DOE": split camel-case boundaries, then upper-case
pub fn format_caption(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push(' ');
        }
        prev_lower = c.is_ascii_lowercase();
        out.push(c);
    }
    out.to_uppercase()
}
