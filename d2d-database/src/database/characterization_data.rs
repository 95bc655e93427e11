use crate::get_database_connection;
use crate::models::characterization_data::{
    ActiveModel, Column, Entity as CharacterizationData, Model as EntryModel, WILD_TYPE_RESIDUE,
};
use crate::models::{kinetic_raw_data, temp_raw_data};
use sea_orm::prelude::Expr;
use sea_orm::{entity::*, query::*, DbErr, TransactionTrait};

/**
 * Get a single entry
 *
 * # Arguments
 * @param id: i32 - The entry id
 *
 * # Returns
 * @return Result<Option<EntryModel>, sea_orm::DbErr> - The result of the operation
 */
pub async fn get_entry(id: i32) -> Result<Option<EntryModel>, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    CharacterizationData::find_by_id(id).one(&conn).await
}

/**
 * Find the entry a creator already opened for a variant at an institution
 *
 * # Arguments
 * @param creator: &str - The user that created the entry
 * @param institution: &str - The institution
 * @param resid: &str - Wild type residue
 * @param resnum: i32 - Residue number
 * @param resmut: &str - Mutated residue
 *
 * # Returns
 * @return Result<Option<EntryModel>, sea_orm::DbErr> - The result of the operation
 */
pub async fn find_entry(
    creator: &str,
    institution: &str,
    resid: &str,
    resnum: i32,
    resmut: &str,
) -> Result<Option<EntryModel>, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    CharacterizationData::find()
        .filter(Column::Creator.eq(creator))
        .filter(Column::Institution.eq(institution))
        .filter(Column::Resid.eq(resid))
        .filter(Column::Resnum.eq(resnum))
        .filter(Column::Resmut.eq(resmut))
        .one(&conn)
        .await
}

/**
 * Create a new, empty entry
 *
 * # Arguments
 * @param creator: &str - The user creating the entry
 * @param institution: &str - The institution of the user
 * @param pi: &str - The principal investigator of the user
 * @param resid: &str - Wild type residue, "X" for a wild type entry
 * @param resnum: i32 - Residue number, 0 for a wild type entry
 * @param resmut: &str - Mutated residue, "X" for a wild type entry
 *
 * # Returns
 * @return Result<EntryModel, sea_orm::DbErr> - The created entry
 */
pub async fn create_entry(
    creator: &str,
    institution: &str,
    pi: &str,
    resid: &str,
    resnum: i32,
    resmut: &str,
) -> Result<EntryModel, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    let new_entry = ActiveModel {
        resid: Set(resid.to_string()),
        resnum: Set(resnum),
        resmut: Set(resmut.to_string()),
        creator: Set(creator.to_string()),
        institution: Set(institution.to_string()),
        pi: Set(pi.to_string()),
        teammate: Set(None),
        teammate2: Set(None),
        teammate3: Set(None),
        comments: Set(None),
        rosetta_score: Set(None),
        oligo_ordered: Set(false),
        plasmid_verified: Set(false),
        ab1_filename: Set(None),
        expressed: Set(None),
        yield_avg: Set(None),
        yield_units: Set(None),
        raw_data_id: Set(0),
        kcat_avg: Set(None),
        kcat_sd: Set(None),
        km_avg: Set(None),
        km_sd: Set(None),
        kcat_over_km: Set(None),
        kcat_over_km_sd: Set(None),
        wt_raw_data_id: Set(0),
        temp_raw_data_id: Set(0),
        t50: Set(None),
        t50_sd: Set(None),
        t50_k: Set(None),
        t50_k_sd: Set(None),
        wt_temp_raw_data_id: Set(0),
        tm: Set(None),
        tm_sd: Set(None),
        gel_filename: Set(None),
        submitted_for_curation: Set(false),
        approved_by_pi: Set(false),
        curated: Set(false),
        version: Set(0),
        ..Default::default()
    };
    new_entry.insert(&conn).await
}

/**
 * Write only the columns set in `changes` and bump the version counter.
 * When `expected_version` is given the row is only touched if its version still matches.
 *
 * # Arguments
 * @param id: i32 - The entry id
 * @param expected_version: Option<i32> - The version the caller read
 * @param changes: ActiveModel - The columns to write, everything else NotSet
 *
 * # Returns
 * @return Result<u64, sea_orm::DbErr> - Number of rows written, 0 on a stale version or unknown id
 */
pub async fn update_entry_columns(
    id: i32,
    expected_version: Option<i32>,
    changes: ActiveModel,
) -> Result<u64, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    let mut query = CharacterizationData::update_many()
        .set(changes)
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .filter(Column::Id.eq(id));
    if let Some(version) = expected_version {
        query = query.filter(Column::Version.eq(version));
    }
    let result = query.exec(&conn).await?;
    Ok(result.rows_affected)
}

/**
 * Get the wild type entries of an institution
 *
 * # Arguments
 * @param institution: &str - The institution
 *
 * # Returns
 * @return Result<Vec<EntryModel>, sea_orm::DbErr> - The result of the operation
 */
pub async fn get_wild_type_entries(institution: &str) -> Result<Vec<EntryModel>, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    CharacterizationData::find()
        .filter(Column::Institution.eq(institution))
        .filter(Column::Resid.eq(WILD_TYPE_RESIDUE))
        .order_by(Column::Id, Order::Asc)
        .all(&conn)
        .await
}

/**
 * Get the entries waiting for curation, optionally limited to one PI
 *
 * # Arguments
 * @param pi: Option<String> - Only entries of this PI
 *
 * # Returns
 * @return Result<Vec<EntryModel>, sea_orm::DbErr> - The result of the operation
 */
pub async fn get_submitted_entries(pi: Option<String>) -> Result<Vec<EntryModel>, sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    let mut query = CharacterizationData::find()
        .filter(Column::SubmittedForCuration.eq(true))
        .filter(Column::Curated.eq(false));
    if let Some(pi) = pi {
        query = query.filter(Column::Pi.eq(pi));
    }
    query.order_by(Column::Id, Order::Asc).all(&conn).await
}

/**
 * Delete an entry together with its raw assay records
 *
 * # Arguments
 * @param id: i32 - The entry id
 *
 * # Returns
 * @return Result<(), sea_orm::DbErr> - The result of the operation
 */
pub async fn delete_entry(id: i32) -> Result<(), sea_orm::DbErr> {
    let conn = get_database_connection().await?;
    let txn = conn.begin().await?;
    kinetic_raw_data::Entity::delete_many()
        .filter(kinetic_raw_data::Column::ParentId.eq(id))
        .exec(&txn)
        .await?;
    temp_raw_data::Entity::delete_many()
        .filter(temp_raw_data::Column::ParentId.eq(id))
        .exec(&txn)
        .await?;
    let result = CharacterizationData::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(DbErr::RecordNotFound(format!("Entry {} not found", id)));
    }
    txn.commit().await
}
