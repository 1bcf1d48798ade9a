use crate::entities::lead::Entity as Lead;
use crate::entities::user::Entity as User;
use sea_orm::entity::prelude::*;
use serde::Serialize;

//(user_id, lead_id) carries a unique index, see setup_schema. Re-adding a
//lead increments `quantity` instead of inserting a second row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "carts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub user_id: i32,
    pub lead_id: i32,
    pub quantity: u32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "User",
        from = "Column::UserId",
        to = "crate::entities::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "Lead",
        from = "Column::LeadId",
        to = "crate::entities::lead::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Lead,
}

impl Related<crate::entities::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<crate::entities::lead::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lead.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
