use anyhow::Context;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use super::CrmDb;
use crate::crm::models::*;
use crate::crm::payloads::{NewCategory, NewSubCategory, Validate};
use crate::errors::CrmResult;

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<PropertyCategory> {
    Ok(PropertyCategory {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn subcategory_from_row(row: &Row<'_>) -> rusqlite::Result<PropertySubCategory> {
    Ok(PropertySubCategory {
        id: row.get("id")?,
        category_id: row.get("category_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

impl CrmDb {
    // ── Property categories ───────────────────────────────────────────

    pub fn list_categories(&self) -> CrmResult<Vec<PropertyCategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created_at FROM property_categories ORDER BY id")
            .context("Failed to prepare list_categories")?;
        let rows = stmt
            .query_map([], category_from_row)
            .context("Failed to query categories")?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row.context("Failed to read category row")?);
        }
        Ok(categories)
    }

    pub fn get_category(&self, id: i64) -> CrmResult<Option<PropertyCategory>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, description, created_at FROM property_categories WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()
            .context("Failed to query category")?;
        Ok(category)
    }

    /// Sub-categories of `category_id`, each carrying its parent.
    /// `None` when the category does not exist.
    pub fn list_subcategories(
        &self,
        category_id: i64,
    ) -> CrmResult<Option<Vec<PropertySubCategoryWithCategory>>> {
        let Some(category) = self.get_category(category_id)? else {
            return Ok(None);
        };
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, category_id, name, description, created_at
                 FROM property_subcategories WHERE category_id = ?1 ORDER BY id",
            )
            .context("Failed to prepare list_subcategories")?;
        let rows = stmt
            .query_map(params![category_id], subcategory_from_row)
            .context("Failed to query sub-categories")?;
        let mut subs = Vec::new();
        for row in rows {
            subs.push(PropertySubCategoryWithCategory {
                sub_category: row.context("Failed to read sub-category row")?,
                category: category.clone(),
            });
        }
        Ok(Some(subs))
    }

    pub fn get_subcategory(&self, id: i64) -> CrmResult<Option<PropertySubCategory>> {
        let sub = self
            .conn
            .query_row(
                "SELECT id, category_id, name, description, created_at
                 FROM property_subcategories WHERE id = ?1",
                params![id],
                subcategory_from_row,
            )
            .optional()
            .context("Failed to query sub-category")?;
        Ok(sub)
    }

    pub fn create_category(&self, new: NewCategory) -> CrmResult<PropertyCategory> {
        new.validate()?;
        self.conn
            .execute(
                "INSERT INTO property_categories (name, description, created_at) VALUES (?1, ?2, ?3)",
                params![new.name.trim(), new.description, Utc::now()],
            )
            .context("Failed to insert category")?;
        let id = self.conn.last_insert_rowid();
        self.get_category(id)?
            .context("Category not found after insert")
            .map_err(Into::into)
    }

    pub fn create_subcategory(&self, new: NewSubCategory) -> CrmResult<PropertySubCategory> {
        new.validate()?;
        self.ensure_exists("property_categories", "Category", new.category_id)?;
        self.conn
            .execute(
                "INSERT INTO property_subcategories (category_id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![new.category_id, new.name.trim(), new.description, Utc::now()],
            )
            .context("Failed to insert sub-category")?;
        let id = self.conn.last_insert_rowid();
        self.get_subcategory(id)?
            .context("Sub-category not found after insert")
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CrmError;

    fn category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: None,
        }
    }

    fn sub(category_id: i64, name: &str) -> NewSubCategory {
        NewSubCategory {
            category_id,
            name: name.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_categories_and_subcategories() -> CrmResult<()> {
        let db = CrmDb::new_in_memory()?;
        let flats = db.create_category(category("Flats"))?;
        db.create_category(category("Land"))?;
        db.create_subcategory(sub(flats.id, "1 BHK"))?;
        db.create_subcategory(sub(flats.id, "2 BHK"))?;

        assert_eq!(db.list_categories()?.len(), 2);
        let subs = db.list_subcategories(flats.id)?.unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].sub_category.name, "1 BHK");
        assert_eq!(subs[0].category.name, "Flats");
        Ok(())
    }

    #[test]
    fn test_unknown_category_has_no_subcategories() -> CrmResult<()> {
        let db = CrmDb::new_in_memory()?;
        assert!(db.list_subcategories(12)?.is_none());
        assert!(matches!(
            db.create_subcategory(sub(12, "Orphan")),
            Err(CrmError::Validation(_))
        ));
        Ok(())
    }

    #[test]
    fn test_duplicate_category_name_is_conflict() -> CrmResult<()> {
        let db = CrmDb::new_in_memory()?;
        db.create_category(category("Flats"))?;
        assert!(matches!(
            db.create_category(category("Flats")),
            Err(CrmError::Conflict(_))
        ));
        Ok(())
    }
}
