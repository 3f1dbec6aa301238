use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::registry::models::{Category, Entry, RegisterKind, Section};
use crate::shared::ordering::ReorderTargetDto;
use crate::shared::validation::VERSION_REGEX;

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSectionDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSectionDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionResponseDto {
    pub id: Uuid,
    pub kind: RegisterKind,
    pub title: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Section> for SectionResponseDto {
    fn from(s: Section) -> Self {
        Self {
            id: s.id,
            kind: s.kind,
            title: s.title,
            sort_order: s.sort_order,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Section with its categories, for the "move to another section/category" dialog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionOptionDto {
    pub id: Uuid,
    pub title: String,
    pub categories: Vec<CategoryOptionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryOptionDto {
    pub id: Uuid,
    pub title: String,
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    pub section_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub kind: RegisterKind,
    pub section_id: Uuid,
    pub title: String,
    pub highlighted: bool,
    pub archived: bool,
    pub sort_order: i32,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            kind: c.kind,
            section_id: c.section_id,
            title: c.title,
            highlighted: c.highlighted,
            archived: c.archived,
            sort_order: c.sort_order,
            created_by: c.created_by,
            updated_by: c.updated_by,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// PATCH body for categories, dispatched on `action`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum CategoryActionDto {
    Reorder(ReorderTargetDto),
    ToggleHighlight,
    Archive,
    Unarchive,
}

// =============================================================================
// ENTRIES
// =============================================================================

fn validate_details(details: &serde_json::Value) -> Result<(), ValidationError> {
    if details.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("details_must_be_object"))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEntryDto {
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1, max = 100))]
    pub reference: Option<String>,

    #[validate(regex(path = *VERSION_REGEX, message = "version must look like '1', '2.1' or 'Rev 3'"))]
    pub version: Option<String>,

    #[validate(length(max = 255))]
    pub owner: Option<String>,

    pub issue_date: Option<NaiveDate>,

    pub review_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,

    /// Kind-specific fields (JSON object)
    #[validate(custom(function = "validate_details"))]
    pub details: Option<serde_json::Value>,
}

/// Partial update; omitted fields keep their value
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEntryDto {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub reference: Option<String>,

    #[validate(regex(path = *VERSION_REGEX, message = "version must look like '1', '2.1' or 'Rev 3'"))]
    pub version: Option<String>,

    #[validate(length(max = 255))]
    pub owner: Option<String>,

    pub issue_date: Option<NaiveDate>,

    pub review_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,

    #[validate(custom(function = "validate_details"))]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryResponseDto {
    pub id: Uuid,
    pub kind: RegisterKind,
    pub category_id: Uuid,
    pub title: String,
    pub reference: Option<String>,
    pub version: Option<String>,
    pub owner: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub review_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub details: serde_json::Value,
    pub approved: bool,
    pub highlighted: bool,
    pub archived: bool,
    pub sort_order: i32,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Entry> for EntryResponseDto {
    fn from(e: Entry) -> Self {
        Self {
            id: e.id,
            kind: e.kind,
            category_id: e.category_id,
            title: e.title,
            reference: e.reference,
            version: e.version,
            owner: e.owner,
            issue_date: e.issue_date,
            review_date: e.review_date,
            status: e.status,
            details: e.details,
            approved: e.approved,
            highlighted: e.highlighted,
            archived: e.archived,
            sort_order: e.sort_order,
            created_by: e.created_by,
            updated_by: e.updated_by,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Move an entry to another section/category of the same register
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveEntryDto {
    pub section_id: Uuid,
    pub category_id: Uuid,
}

/// PATCH body for entries, dispatched on `action`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum EntryActionDto {
    Reorder(ReorderTargetDto),
    ToggleHighlight,
    Approve,
    Unapprove,
    Archive,
    Unarchive,
}

// =============================================================================
// TREE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionTreeDto {
    pub id: Uuid,
    pub title: String,
    pub sort_order: i32,
    pub categories: Vec<CategoryTreeDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryTreeDto {
    #[serde(flatten)]
    pub category: CategoryResponseDto,
    pub entries: Vec<EntryResponseDto>,
}

impl SectionTreeDto {
    /// Nest pre-sorted categories and entries under their sections
    pub fn build_tree(
        sections: Vec<Section>,
        categories: Vec<Category>,
        entries: Vec<Entry>,
    ) -> Vec<SectionTreeDto> {
        let mut category_nodes: Vec<CategoryTreeDto> = categories
            .into_iter()
            .map(|c| CategoryTreeDto {
                category: c.into(),
                entries: Vec::new(),
            })
            .collect();

        for entry in entries {
            if let Some(node) = category_nodes
                .iter_mut()
                .find(|n| n.category.id == entry.category_id)
            {
                node.entries.push(entry.into());
            }
        }

        sections
            .into_iter()
            .map(|s| SectionTreeDto {
                id: s.id,
                title: s.title,
                sort_order: s.sort_order,
                categories: category_nodes
                    .iter()
                    .filter(|n| n.category.section_id == s.id)
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ordering::{MoveDirection, ReorderTarget};
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    fn section(title: &str, order: i32) -> Section {
        Section {
            id: Uuid::new_v4(),
            kind: RegisterKind::Procedures,
            title: title.to_string(),
            sort_order: order,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn category(section_id: Uuid, order: i32) -> Category {
        Category {
            id: Uuid::new_v4(),
            kind: RegisterKind::Procedures,
            section_id,
            title: Sentence(1..3).fake(),
            highlighted: false,
            archived: false,
            sort_order: order,
            created_by: "user-1".to_string(),
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn entry(category_id: Uuid, order: i32) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            kind: RegisterKind::Procedures,
            category_id,
            title: Sentence(2..5).fake(),
            reference: None,
            version: Some("1.0".to_string()),
            owner: None,
            issue_date: None,
            review_date: None,
            status: None,
            details: serde_json::json!({}),
            approved: false,
            highlighted: false,
            archived: false,
            sort_order: order,
            created_by: "user-1".to_string(),
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_tree_nests_and_keeps_order() {
        let s1 = section("Operations", 0);
        let s2 = section("Support", 1);
        let c1 = category(s1.id, 0);
        let c2 = category(s1.id, 1);
        let c3 = category(s2.id, 0);
        let e1 = entry(c1.id, 0);
        let e2 = entry(c1.id, 1);
        let e3 = entry(c3.id, 0);
        let (s1_id, c1_id, c2_id, c3_id) = (s1.id, c1.id, c2.id, c3.id);
        let (e1_id, e2_id, e3_id) = (e1.id, e2.id, e3.id);

        let tree = SectionTreeDto::build_tree(
            vec![s1, s2],
            vec![c1, c2, c3],
            vec![e1, e2, e3],
        );

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, s1_id);
        let ids: Vec<Uuid> = tree[0].categories.iter().map(|c| c.category.id).collect();
        assert_eq!(ids, vec![c1_id, c2_id]);
        let entry_ids: Vec<Uuid> = tree[0].categories[0].entries.iter().map(|e| e.id).collect();
        assert_eq!(entry_ids, vec![e1_id, e2_id]);
        assert!(tree[0].categories[1].entries.is_empty());
        assert_eq!(tree[1].categories[0].category.id, c3_id);
        assert_eq!(tree[1].categories[0].entries[0].id, e3_id);
    }

    #[test]
    fn test_entries_of_unlisted_categories_are_dropped() {
        let s = section("Operations", 0);
        let orphan = entry(Uuid::new_v4(), 0);
        let tree = SectionTreeDto::build_tree(vec![s], vec![], vec![orphan]);
        assert!(tree[0].categories.is_empty());
    }

    #[test]
    fn test_entry_action_parsing() {
        let action: EntryActionDto =
            serde_json::from_value(serde_json::json!({ "action": "toggle-highlight" })).unwrap();
        assert!(matches!(action, EntryActionDto::ToggleHighlight));

        let action: EntryActionDto = serde_json::from_value(
            serde_json::json!({ "action": "reorder", "direction": "up" }),
        )
        .unwrap();
        match action {
            EntryActionDto::Reorder(target) => assert_eq!(
                target.resolve(),
                Ok(ReorderTarget::Step(MoveDirection::Up))
            ),
            other => panic!("unexpected action: {:?}", other),
        }

        assert!(serde_json::from_value::<EntryActionDto>(
            serde_json::json!({ "action": "publish" })
        )
        .is_err());
    }

    #[test]
    fn test_category_action_has_no_approve() {
        assert!(serde_json::from_value::<CategoryActionDto>(
            serde_json::json!({ "action": "approve" })
        )
        .is_err());
    }

    #[test]
    fn test_reorder_target_needs_exactly_one() {
        assert!(ReorderTargetDto::default().resolve().is_err());
        let both = ReorderTargetDto {
            direction: Some(MoveDirection::Down),
            position: Some(1),
        };
        assert!(both.resolve().is_err());
        let position = ReorderTargetDto {
            direction: None,
            position: Some(3),
        };
        assert_eq!(position.resolve(), Ok(ReorderTarget::Position(3)));
    }

    #[test]
    fn test_create_entry_validation() {
        let mut dto = CreateEntryDto {
            category_id: Uuid::new_v4(),
            title: Sentence(2..4).fake(),
            reference: Some("PR-001".to_string()),
            version: Some("2.1".to_string()),
            owner: None,
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            review_date: None,
            status: None,
            details: Some(serde_json::json!({ "department": "QA" })),
        };
        assert!(dto.validate().is_ok());

        dto.details = Some(serde_json::json!(["not", "an", "object"]));
        assert!(dto.validate().is_err());

        dto.details = None;
        dto.version = Some("1..2".to_string());
        assert!(dto.validate().is_err());

        dto.version = None;
        dto.title = String::new();
        assert!(dto.validate().is_err());
    }
}
