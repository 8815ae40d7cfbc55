use tracing::{debug, warn};

use crate::error::{Result, TodoError};
use crate::model::Tag;
use crate::store::TodoDb;

/// Colors handed out to tags created without one.
pub const PALETTE: [&str; 15] = [
    "#2196F3", "#4CAF50", "#FF9800", "#9C27B0", "#F44336", "#607D8B", "#795548", "#009688",
    "#FF5722", "#3F51B5", "#E91E63", "#CDDC39", "#FFC107", "#673AB7", "#00BCD4",
];

/// Tag rules layered over the raw tag repository: trimmed names,
/// uniqueness checks and default colors.
pub struct TagManager<'a> {
    db: &'a TodoDb,
}

impl<'a> TagManager<'a> {
    pub fn new(db: &'a TodoDb) -> Self {
        Self { db }
    }

    pub fn palette() -> &'static [&'static str] {
        &PALETTE
    }

    /// `#RRGGBB`, either case.
    pub fn is_valid_color(color: &str) -> bool {
        color.len() == 7
            && color.starts_with('#')
            && color[1..].chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn random_color() -> &'static str {
        let mut byte = [0u8; 1];
        match getrandom::fill(&mut byte) {
            Ok(()) => PALETTE[byte[0] as usize % PALETTE.len()],
            Err(err) => {
                warn!(%err, "random source unavailable, using first palette color");
                PALETTE[0]
            }
        }
    }

    pub fn all_tags(&self) -> Result<Vec<Tag>> {
        self.db.get_all_tags()
    }

    /// Create a tag, or return the existing one when the trimmed name is taken.
    pub fn create_tag(&self, name: &str, color: Option<&str>) -> Result<Tag> {
        let name = valid_name(name)?;
        if let Some(existing) = self.db.get_tag_by_name(name)? {
            debug!(tag_id = existing.id, name, "tag already exists");
            return Ok(existing);
        }
        let color = match color {
            Some(color) if Self::is_valid_color(color) => color,
            Some(color) => return Err(TodoError::InvalidColor(color.to_string())),
            None => Self::random_color(),
        };
        let mut tag = Tag::new(name, color);
        tag.id = self.db.add_tag(&tag)?;
        debug!(tag_id = tag.id, name, color, "tag created");
        Ok(tag)
    }

    pub fn get_or_create_tag(&self, name: &str) -> Result<Tag> {
        self.create_tag(name, None)
    }

    /// Rename or recolor a tag. Fails if another tag already has the name;
    /// returns `false` when the tag does not exist.
    pub fn update_tag(&self, tag: &Tag) -> Result<bool> {
        let name = valid_name(&tag.name)?;
        if !Self::is_valid_color(&tag.color) {
            return Err(TodoError::InvalidColor(tag.color.clone()));
        }
        if !self.is_tag_name_available(name, Some(tag.id))? {
            return Err(TodoError::TagNameUnavailable(name.to_string()));
        }
        let updated = Tag {
            id: tag.id,
            name: name.to_string(),
            color: tag.color.clone(),
        };
        Ok(self.db.update_tag(&updated)? > 0)
    }

    pub fn delete_tag(&self, id: i64) -> Result<bool> {
        Ok(self.db.delete_tag(id)? > 0)
    }

    /// Whether `name` is free, ignoring the tag with id `exclude_id`.
    pub fn is_tag_name_available(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        Ok(match self.db.get_tag_by_name(name.trim())? {
            None => true,
            Some(existing) => Some(existing.id) == exclude_id,
        })
    }

    /// Tags whose name contains `query`, ignoring case. An empty query
    /// returns every tag.
    pub fn search_tags(&self, query: &str) -> Result<Vec<Tag>> {
        let needle = query.trim().to_lowercase();
        let tags = self.db.get_all_tags()?;
        if needle.is_empty() {
            return Ok(tags);
        }
        Ok(tags
            .into_iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Resolve a tag argument given as a numeric id or a name.
    pub fn resolve(&self, id_or_name: &str) -> Result<Option<Tag>> {
        if let Ok(id) = id_or_name.trim().parse::<i64>() {
            if let Some(tag) = self.db.get_tag_by_id(id)? {
                return Ok(Some(tag));
            }
        }
        self.db.get_tag_by_name(id_or_name.trim())
    }
}

fn valid_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TodoError::InvalidTagName);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_trims_and_reuses_existing() {
        let db = TodoDb::open_memory().unwrap();
        let tags = TagManager::new(&db);
        let created = tags.create_tag("  Errands ", Some("#123abc")).unwrap();
        assert_eq!(created.name, "Errands");
        assert_eq!(created.color, "#123abc");

        let again = tags.create_tag("Errands", Some("#000000")).unwrap();
        assert_eq!(again, created);
    }

    #[test]
    fn create_without_color_picks_from_palette() {
        let db = TodoDb::open_memory().unwrap();
        let tag = TagManager::new(&db).create_tag("Garden", None).unwrap();
        assert!(PALETTE.contains(&tag.color.as_str()));
    }

    #[test]
    fn create_rejects_blank_name_and_bad_color() {
        let db = TodoDb::open_memory().unwrap();
        let tags = TagManager::new(&db);
        assert!(matches!(
            tags.create_tag("   ", None),
            Err(TodoError::InvalidTagName)
        ));
        assert!(matches!(
            tags.create_tag("Garden", Some("green")),
            Err(TodoError::InvalidColor(_))
        ));
    }

    #[test]
    fn update_refuses_name_of_another_tag() {
        let db = TodoDb::open_memory().unwrap();
        let tags = TagManager::new(&db);
        let mut study = db.get_tag_by_name("Study").unwrap().unwrap();
        study.name = "Work".into();
        assert!(matches!(
            tags.update_tag(&study),
            Err(TodoError::TagNameUnavailable(_))
        ));

        study.name = "Study".into();
        study.color = "#000000".into();
        assert!(tags.update_tag(&study).unwrap());
        assert_eq!(db.get_tag_by_id(study.id).unwrap().unwrap().color, "#000000");
    }

    #[test]
    fn update_missing_tag_is_false() {
        let db = TodoDb::open_memory().unwrap();
        let ghost = Tag {
            id: 9999,
            name: "Ghost".into(),
            color: "#FFFFFF".into(),
        };
        assert!(!TagManager::new(&db).update_tag(&ghost).unwrap());
    }

    #[test]
    fn availability_excludes_self() {
        let db = TodoDb::open_memory().unwrap();
        let tags = TagManager::new(&db);
        let work = db.get_tag_by_name("Work").unwrap().unwrap();
        assert!(!tags.is_tag_name_available("Work", None).unwrap());
        assert!(tags.is_tag_name_available(" Work ", Some(work.id)).unwrap());
        assert!(tags.is_tag_name_available("Hobby", None).unwrap());
    }

    #[test]
    fn search_ignores_case() {
        let db = TodoDb::open_memory().unwrap();
        let tags = TagManager::new(&db);
        let hits = tags.search_tags("  O ").unwrap();
        let names: Vec<_> = hits.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Personal", "Shopping", "Work"]);
        assert_eq!(tags.search_tags("").unwrap().len(), 5);
    }

    #[test]
    fn color_validation() {
        assert!(TagManager::is_valid_color("#A1b2C3"));
        assert!(!TagManager::is_valid_color("A1B2C3"));
        assert!(!TagManager::is_valid_color("#A1B2C"));
        assert!(!TagManager::is_valid_color("#GGGGGG"));
        assert!(!TagManager::is_valid_color("#ÀB2C3"));
    }

    #[test]
    fn resolve_by_id_or_name() {
        let db = TodoDb::open_memory().unwrap();
        let tags = TagManager::new(&db);
        let work = tags.resolve("Work").unwrap().unwrap();
        assert_eq!(tags.resolve(&work.id.to_string()).unwrap(), Some(work));
        assert_eq!(tags.resolve("Nope").unwrap(), None);
    }
}
