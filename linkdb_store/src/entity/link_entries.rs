//! One row per set member; a legacy scalar entry is a single row of kind
//! `scalar` whose `member` holds the value.
//!
//! Both key columns are plain `String`s: unbounded on SQLite and PostgreSQL,
//! `varchar(255)` on MySQL.

use sea_orm::entity::prelude::*;

pub const KIND_SET: &str = "set";
pub const KIND_SCALAR: &str = "scalar";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "link_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "entry_key")]
    pub key: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub member: String,
    pub kind: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
