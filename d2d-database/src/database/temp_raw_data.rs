use crate::get_database_connection;
use crate::models::temp_raw_data::{
    ActiveModel, Column, Entity as TempRawData, Model as TempRawDataModel,
};
use sea_orm::{entity::*, query::*};

/**
 * Get a thermostability raw data record by its id
 *
 * # Arguments
 * @param id: i32 - The record id
 *
 * # Returns
 * @return Result<Option<TempRawDataModel>, sea_orm::DbErr> - The result of the operation
 */
pub async fn get_temp_raw_data(id: i32) -> Result<Option<TempRawDataModel>, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    TempRawData::find_by_id(id).one(&conn).await
}

pub async fn get_temp_raw_data_by_parent(
    parent_id: i32,
) -> Result<Option<TempRawDataModel>, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    TempRawData::find()
        .filter(Column::ParentId.eq(parent_id))
        .order_by(Column::Id, Order::Desc)
        .one(&conn)
        .await
}

pub async fn get_temp_raw_data_for_parents(
    parent_ids: Vec<i32>,
) -> Result<Vec<TempRawDataModel>, sea_orm::DbErr> {
    if parent_ids.is_empty() {
        return Ok(vec![]);
    }
    let conn = get_database_connection().await?;
    TempRawData::find()
        .filter(Column::ParentId.is_in(parent_ids))
        .order_by(Column::Id, Order::Asc)
        .all(&conn)
        .await
}

/**
 * Insert or update the thermostability raw data of an entry, one record per parent
 *
 * # Arguments
 * @param parent_id: i32 - The entry id
 * @param fields: ActiveModel - The columns to write
 *
 * # Returns
 * @return Result<TempRawDataModel, sea_orm::DbErr> - The stored record
 */
pub async fn upsert_temp_raw_data(
    parent_id: i32,
    mut fields: ActiveModel,
) -> Result<TempRawDataModel, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    let existing = TempRawData::find()
        .filter(Column::ParentId.eq(parent_id))
        .one(&conn)
        .await?;

    fields.parent_id = Set(parent_id);
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
    use crate::types::TempSlopeUnits;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn test_upsert_temp_raw_data_by_parent() {
        setup_test_environment().await;

        let fields = |t50: f64| ActiveModel {
            user_name: Set("jdoe".into()),
            variant: Set("A123C".into()),
            slope_units: Set(Some(TempSlopeUnits::PerSecond)),
            t50: Set(Some(t50)),
            approved_by_student: Set(true),
            ..Default::default()
        };

        let first = upsert_temp_raw_data(11, fields(41.2)).await.unwrap();
        let second = upsert_temp_raw_data(11, fields(43.9)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.t50, Some(43.9));

        let by_parent = get_temp_raw_data_by_parent(11).await.unwrap().unwrap();
        assert_eq!(by_parent.slope_units, Some(TempSlopeUnits::PerSecond));
        assert!(get_temp_raw_data(by_parent.id).await.unwrap().is_some());
        assert_eq!(get_temp_raw_data_for_parents(vec![11, 12]).await.unwrap().len(), 1);
    }
}
