use crate::get_database_connection;
use crate::models::kinetic_raw_data::{
    ActiveModel, Column, Entity as KineticRawData, Model as KineticRawDataModel,
};
use sea_orm::{entity::*, query::*};

/**
 * Get a kinetic raw data record by its id
 *
 * # Arguments
 * @param id: i32 - The record id
 *
 * # Returns
 * @return Result<Option<KineticRawDataModel>, sea_orm::DbErr> - The result of the operation
 */
pub async fn get_kinetic_raw_data(id: i32) -> Result<Option<KineticRawDataModel>, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    KineticRawData::find_by_id(id).one(&conn).await
}

/**
 * Get the most recent kinetic raw data record of an entry
 *
 * # Arguments
 * @param parent_id: i32 - The entry id
 *
 * # Returns
 * @return Result<Option<KineticRawDataModel>, sea_orm::DbErr> - The result of the operation
 */
pub async fn get_kinetic_raw_data_by_parent(
    parent_id: i32,
) -> Result<Option<KineticRawDataModel>, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    KineticRawData::find()
        .filter(Column::ParentId.eq(parent_id))
        .order_by(Column::Id, Order::Desc)
        .one(&conn)
        .await
}

/**
 * Get every kinetic raw data record belonging to one of the given entries
 *
 * # Arguments
 * @param parent_ids: Vec<i32> - The entry ids
 *
 * # Returns
 * @return Result<Vec<KineticRawDataModel>, sea_orm::DbErr> - The result of the operation
 */
pub async fn get_kinetic_raw_data_for_parents(
    parent_ids: Vec<i32>,
) -> Result<Vec<KineticRawDataModel>, sea_orm::DbErr> {
    if parent_ids.is_empty() {
        return Ok(vec![]);
    }
    let conn = get_database_connection().await?;
    KineticRawData::find()
        .filter(Column::ParentId.is_in(parent_ids))
        .order_by(Column::Id, Order::Asc)
        .all(&conn)
        .await
}

/**
 * Insert or update the kinetic raw data of a variant. There is at most one
 * record per (parent_id, variant).
 *
 * # Arguments
 * @param parent_id: i32 - The entry id
 * @param variant: &str - The variant name
 * @param fields: ActiveModel - The columns to write
 *
 * # Returns
 * @return Result<KineticRawDataModel, sea_orm::DbErr> - The stored record
 */
pub async fn upsert_kinetic_raw_data(
    parent_id: i32,
    variant: &str,
    mut fields: ActiveModel,
) -> Result<KineticRawDataModel, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    let existing = KineticRawData::find()
        .filter(Column::ParentId.eq(parent_id))
        .filter(Column::Variant.eq(variant))
        .one(&conn)
        .await?;

    fields.parent_id = Set(parent_id);
    fields.variant = Set(variant.to_string());
    match existing {
        Some(record) => {
            fields.id = Unchanged(record.id);
            fields.update(&conn).await
        }
        None => {
            fields.id = NotSet;
            fields.insert(&conn).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup_test_environment;
    use crate::types::{KineticSlopeUnits, YieldUnits};
    use serial_test::serial;

    fn fields(kcat: f64) -> ActiveModel {
        ActiveModel {
            user_name: Set("jdoe".into()),
            slope_units: Set(Some(KineticSlopeUnits::PerMinute)),
            yield_value: Set(Some(1.25)),
            yield_units: Set(Some(YieldUnits::MgPerMl)),
            kcat: Set(Some(kcat)),
            approved_by_student: Set(true),
            ..Default::default()
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_upsert_keeps_one_record_per_variant() {
        setup_test_environment().await;

        let first = upsert_kinetic_raw_data(7, "A123C", fields(10.0)).await.unwrap();
        let second = upsert_kinetic_raw_data(7, "A123C", fields(12.5)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.kcat, Some(12.5));

        let other = upsert_kinetic_raw_data(7, "WT", fields(3.0)).await.unwrap();
        assert_ne!(other.id, first.id);

        let all = get_kinetic_raw_data_for_parents(vec![7]).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_get_by_id_and_parent() {
        setup_test_environment().await;
        let record = upsert_kinetic_raw_data(3, "WT", fields(1.0)).await.unwrap();

        let by_id = get_kinetic_raw_data(record.id).await.unwrap();
        assert_eq!(by_id.map(|r| r.parent_id), Some(3));
        let by_parent = get_kinetic_raw_data_by_parent(3).await.unwrap();
        assert_eq!(by_parent.map(|r| r.id), Some(record.id));
        assert!(get_kinetic_raw_data_by_parent(4).await.unwrap().is_none());
        assert!(get_kinetic_raw_data_for_parents(vec![]).await.unwrap().is_empty());
    }
}
