use d2d_database::database::characterization_data as entries_db;
use d2d_database::models::characterization_data::ActiveModel;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use super::checklist::all_complete;
use super::entry::{Entry, EntryStore};
use crate::error::CureError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntryInfo {
    pub creator: String,
    pub institution: String,
    pub pi: String,
    pub resid: String,
    pub resnum: i32,
    pub resmut: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teammates {
    pub teammate: Option<String>,
    pub teammate2: Option<String>,
    pub teammate3: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CuratorRole {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "Professor")]
    Professor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurationStatus {
    InProgress,
    PendingApproval,
    PiApproved,
    Approved,
}

impl CurationStatus {
    pub fn of(entry: &Entry) -> Self {
        if entry.curated {
            CurationStatus::Approved
        } else if entry.approved_by_pi {
            CurationStatus::PiApproved
        } else if entry.submitted_for_curation {
            CurationStatus::PendingApproval
        } else {
            CurationStatus::InProgress
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CurationStatus::InProgress => "In Progress",
            CurationStatus::PendingApproval => "Pending Approval",
            CurationStatus::PiApproved => "PI Approved",
            CurationStatus::Approved => "Curated",
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn write(
    store: &dyn EntryStore,
    id: i32,
    version: Option<i32>,
    changes: ActiveModel,
) -> Result<Entry, CureError> {
    let written = entries_db::update_entry_columns(id, version, changes)
        .await
        .map_err(|e| CureError::Persistence(e.to_string()))?;
    let now = store.get(id).await?;
    if written == 0 {
        return Err(CureError::Conflict {
            expected: version.unwrap_or(now.version),
            actual: now.version,
        });
    }
    Ok(now)
}

/**
 * Open a new entry for a variant
 *
 * # Arguments
 * @param info: NewEntryInfo - Creator, institution, PI and the mutation
 *
 * # Returns
 * @return Result<Entry, CureError> - The new entry, or a Validation error when
 * the creator already has an entry for this variant at this institution
 */
pub async fn create_entry(info: NewEntryInfo) -> Result<Entry, CureError> {
    if info.creator.trim().is_empty() || info.institution.trim().is_empty() {
        return Err(CureError::Validation("creator and institution are required".into()));
    }
    let existing = entries_db::find_entry(
        &info.creator,
        &info.institution,
        &info.resid,
        info.resnum,
        &info.resmut,
    )
    .await
    .map_err(|e| CureError::Fetch(e.to_string()))?;
    if let Some(existing) = existing {
        return Err(CureError::Validation(format!(
            "{} already has entry {} for {}",
            info.creator,
            existing.id,
            existing.variant_name()
        )));
    }
    let entry = entries_db::create_entry(
        &info.creator,
        &info.institution,
        &info.pi,
        &info.resid,
        info.resnum,
        &info.resmut,
    )
    .await
    .map_err(|e| CureError::Persistence(e.to_string()))?;
    log::info!("Created entry {} for {}", entry.id, entry.variant_name());
    Ok(entry)
}

/// Hand a finished entry to the curators. Every checklist item must be complete.
pub async fn submit_for_curation(
    store: &dyn EntryStore,
    id: i32,
    version: Option<i32>,
) -> Result<Entry, CureError> {
    let entry = store.get(id).await?;
    if !all_complete(&entry) {
        return Err(CureError::Validation(format!(
            "Entry {} still has incomplete checklist items",
            id
        )));
    }
    write(
        store,
        id,
        version,
        ActiveModel {
            submitted_for_curation: Set(true),
            ..Default::default()
        },
    )
    .await
}

pub async fn update_teammates(
    store: &dyn EntryStore,
    id: i32,
    version: Option<i32>,
    teammates: Teammates,
) -> Result<Entry, CureError> {
    store.get(id).await?;
    write(
        store,
        id,
        version,
        ActiveModel {
            teammate: Set(blank_to_none(teammates.teammate)),
            teammate2: Set(blank_to_none(teammates.teammate2)),
            teammate3: Set(blank_to_none(teammates.teammate3)),
            ..Default::default()
        },
    )
    .await
}

pub async fn update_comment(
    store: &dyn EntryStore,
    id: i32,
    version: Option<i32>,
    comment: Option<String>,
) -> Result<Entry, CureError> {
    store.get(id).await?;
    write(
        store,
        id,
        version,
        ActiveModel {
            comments: Set(blank_to_none(comment)),
            ..Default::default()
        },
    )
    .await
}

/// Admins curate; anyone else approving is taken to be the PI.
pub async fn curate(ids: &[i32], role: CuratorRole) -> Result<u64, CureError> {
    let mut updated = 0;
    for id in ids {
        let changes = match role {
            CuratorRole::Admin => ActiveModel {
                curated: Set(true),
                ..Default::default()
            },
            CuratorRole::Professor => ActiveModel {
                approved_by_pi: Set(true),
                ..Default::default()
            },
        };
        updated += entries_db::update_entry_columns(*id, None, changes)
            .await
            .map_err(|e| CureError::Persistence(e.to_string()))?;
    }
    log::info!("{:?} approved {} of {} entries", role, updated, ids.len());
    Ok(updated)
}

/// Delete entries together with their raw assay records. Unknown ids are skipped.
pub async fn delete_entries(ids: &[i32]) -> Result<usize, CureError> {
    let mut deleted = 0;
    for id in ids {
        match entries_db::delete_entry(*id).await {
            Ok(()) => deleted += 1,
            Err(sea_orm::DbErr::RecordNotFound(_)) => {
                log::warn!("Entry {} was already gone", id);
            }
            Err(e) => return Err(CureError::Persistence(e.to_string())),
        }
    }
    Ok(deleted)
}

/// Entries waiting for curation, optionally only those of one PI.
pub async fn submitted_entries(pi: Option<String>) -> Result<Vec<Entry>, CureError> {
    entries_db::get_submitted_entries(pi)
        .await
        .map_err(|e| CureError::Fetch(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checklist::tests::blank_entry;
    use crate::core::entry::DatabaseEntryStore;
    use d2d_database::setup_test_environment;
    use serial_test::serial;

    fn info() -> NewEntryInfo {
        NewEntryInfo {
            creator: "jdoe".into(),
            institution: "UCDavis".into(),
            pi: "dr_pi".into(),
            resid: "A".into(),
            resnum: 123,
            resmut: "C".into(),
        }
    }

    #[test]
    fn status_follows_the_curation_flags() {
        let mut entry = blank_entry();
        assert_eq!(CurationStatus::of(&entry), CurationStatus::InProgress);
        entry.submitted_for_curation = true;
        assert_eq!(CurationStatus::of(&entry), CurationStatus::PendingApproval);
        entry.approved_by_pi = true;
        assert_eq!(CurationStatus::of(&entry).label(), "PI Approved");
        entry.curated = true;
        assert_eq!(CurationStatus::of(&entry), CurationStatus::Approved);
    }

    #[test]
    fn roles_use_their_wire_names() {
        let role: CuratorRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, CuratorRole::Admin);
    }

    #[tokio::test]
    #[serial]
    async fn duplicate_entries_are_refused() {
        setup_test_environment().await;
        let entry = create_entry(info()).await.unwrap();
        assert_eq!(entry.version, 0);
        assert!(matches!(create_entry(info()).await, Err(CureError::Validation(_))));
    }

    #[tokio::test]
    #[serial]
    async fn incomplete_entries_cannot_be_submitted() {
        setup_test_environment().await;
        let entry = create_entry(info()).await.unwrap();
        let result = submit_for_curation(&DatabaseEntryStore, entry.id, None).await;
        assert!(matches!(result, Err(CureError::Validation(_))));
    }

    #[tokio::test]
    #[serial]
    async fn teammates_and_comments_are_trimmed() {
        setup_test_environment().await;
        let store = DatabaseEntryStore;
        let entry = create_entry(info()).await.unwrap();
        let updated = update_teammates(
            &store,
            entry.id,
            Some(entry.version),
            Teammates {
                teammate: Some(" asmith ".into()),
                teammate2: Some("".into()),
                teammate3: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.teammate.as_deref(), Some("asmith"));
        assert_eq!(updated.teammate2, None);

        let stale = update_comment(&store, entry.id, Some(entry.version), Some("hi".into())).await;
        assert!(matches!(stale, Err(CureError::Conflict { .. })));
        let commented = update_comment(&store, entry.id, None, Some("hi".into())).await.unwrap();
        assert_eq!(commented.comments.as_deref(), Some("hi"));
    }

    #[tokio::test]
    #[serial]
    async fn curation_and_deletion() {
        setup_test_environment().await;
        let store = DatabaseEntryStore;
        let first = create_entry(info()).await.unwrap();
        let second = create_entry(NewEntryInfo {
            resmut: "D".into(),
            ..info()
        })
        .await
        .unwrap();

        assert_eq!(curate(&[first.id], CuratorRole::Professor).await.unwrap(), 1);
        assert!(store.get(first.id).await.unwrap().approved_by_pi);
        curate(&[first.id], CuratorRole::Admin).await.unwrap();
        assert!(store.get(first.id).await.unwrap().curated);

        assert_eq!(delete_entries(&[second.id, 9999]).await.unwrap(), 1);
        assert!(matches!(store.get(second.id).await, Err(CureError::NotFound(_))));
        assert!(submitted_entries(None).await.unwrap().is_empty());
    }
}
