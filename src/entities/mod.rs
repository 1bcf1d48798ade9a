pub mod address;
pub mod cart;
pub mod lead;
pub mod order;
pub mod order_item;
pub mod refresh_token;
pub mod review;
pub mod user;
pub mod wishlist;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};

use crate::entities::{
    address::Entity as Address, cart::Entity as Cart, lead::Entity as Lead,
    order::Entity as Order, order_item::Entity as OrderItem,
    refresh_token::Entity as RefreshToken, review::Entity as Review, user::Entity as User,
    wishlist::Entity as Wishlist,
};

pub async fn setup_schema(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(RefreshToken),
        schema.create_table_from_entity(Lead),
        schema.create_table_from_entity(Review),
        schema.create_table_from_entity(Wishlist),
        schema.create_table_from_entity(Cart),
        schema.create_table_from_entity(Address),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
    ];

    for table in &tables {
        db.execute(backend.build(table))
            .await
            .expect("Failed to create table schema");
    }

    //Composite uniqueness: these indexes are the backstop for the
    //check-then-act paths (wishlist add, cart add, address create).
    let indexes = [
        Index::create()
            .name("uniq_wishlists_user_lead")
            .table(Wishlist)
            .col(wishlist::Column::UserId)
            .col(wishlist::Column::LeadId)
            .unique()
            .to_owned(),
        Index::create()
            .name("uniq_carts_user_lead")
            .table(Cart)
            .col(cart::Column::UserId)
            .col(cart::Column::LeadId)
            .unique()
            .to_owned(),
        Index::create()
            .name("uniq_addresses_user_type")
            .table(Address)
            .col(address::Column::UserId)
            .col(address::Column::AddressType)
            .unique()
            .to_owned(),
    ];

    for index in &indexes {
        db.execute(backend.build(index))
            .await
            .expect("Failed to create unique index");
    }
}
