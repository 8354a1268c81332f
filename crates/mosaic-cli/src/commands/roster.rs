//! Roster validation and listing

use anyhow::{bail, Context, Result};
use mosaic_cache::{FileRoster, Roster, RosterProvider};
use mosaic_core::XorShiftRng;

pub fn run(file: &str, shuffle: Option<u32>, format: &str) -> Result<()> {
    let roster = load_ordered(file, shuffle)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(roster.people())?),
        "text" => {
            println!("Roster: {} ({} people)", file, roster.len());
            for (i, person) in roster.people().iter().enumerate() {
                println!(
                    "  {:>4}  {:<28} {:<16} {}",
                    i,
                    person.caption(),
                    person.secondary_name.as_deref().unwrap_or(""),
                    person.image_ref
                );
            }
        }
        other => bail!("Unknown format '{}'; valid values: text, json", other),
    }
    Ok(())
}

fn load_ordered(file: &str, shuffle: Option<u32>) -> Result<Roster> {
    let mut roster = FileRoster::new(file)
        .get_roster()
        .with_context(|| format!("Failed to load roster {}", file))?;
    if let Some(seed) = shuffle {
        if seed == 0 {
            bail!("--shuffle needs a non-zero seed");
        }
        roster.shuffle(&mut XorShiftRng::new(seed));
    }
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_roster(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mosaic_roster_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const PEOPLE: &str = r#"[
        {"englishName": "AdaLovelace", "koreanName": "에이다", "imageUrl": "ada.png"},
        {"displayName": "GraceHopper", "imageRef": "grace.png"},
        {"displayName": "AlanTuring", "imageRef": "alan.png"},
        {"displayName": "", "imageRef": "nobody.png"}
    ]"#;

    #[test]
    fn test_load_drops_invalid_entries() {
        let path = temp_roster("people.json", PEOPLE);
        let roster = load_ordered(path.to_str().unwrap(), None).unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.people()[0].caption(), "ADA LOVELACE");
        assert!(run(path.to_str().unwrap(), None, "text").is_ok());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let path = temp_roster("people.json", PEOPLE);
        let file = path.to_str().unwrap();
        let a = load_ordered(file, Some(5)).unwrap();
        let b = load_ordered(file, Some(5)).unwrap();
        let names = |r: &Roster| {
            r.people()
                .iter()
                .map(|p| p.display_name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
        assert!(load_ordered(file, Some(0)).is_err());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_ordered("/nonexistent/mosaic/people.json", None).is_err());
    }
}
