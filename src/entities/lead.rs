use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub location: String,
    pub property_type: String,
    pub property_status: String,
    pub service_required_on: String,
    pub budget: f32,
    #[sea_orm(column_type = "Text")]
    pub requirement: String,
    pub tags: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f32>,
    pub discount_price: Option<f32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::entities::review::Entity")]
    Review,
    #[sea_orm(has_many = "crate::entities::wishlist::Entity")]
    Wishlist,
    #[sea_orm(has_many = "crate::entities::cart::Entity")]
    Cart,
}

impl Related<crate::entities::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<crate::entities::wishlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wishlist.def()
    }
}

impl Related<crate::entities::cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cart.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
