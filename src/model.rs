pub mod warp_hall {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "warp_hall")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false, column_name = "StallNumber")]
        pub stall_number: i32,

        #[sea_orm(column_name = "IGN", column_type = "Text")]
        pub ign: String,

        #[sea_orm(column_name = "StallName", column_type = "Text")]
        pub stall_name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod mall_stall {
    use sea_orm::entity::prelude::*;

    /// `(StallNumber, StreetName)` is unique; see `store::ensure_schema`.
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "the_mall")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,

        #[sea_orm(column_name = "StallNumber")]
        pub stall_number: f64,

        #[sea_orm(column_name = "StreetName")]
        pub street_name: String,

        #[sea_orm(column_name = "IGN", column_type = "Text")]
        pub ign: String,

        #[sea_orm(column_name = "StallName", column_type = "Text")]
        pub stall_name: String,

        #[sea_orm(column_name = "ItemsSold", column_type = "Text")]
        pub items_sold: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod mall_review {
    use sea_orm::entity::prelude::*;

    /// `(ReviewerID, StallNumber, StreetName)` is unique; see `store::ensure_schema`.
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "the_mall_reviews")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,

        #[sea_orm(column_name = "ReviewerID")]
        pub reviewer_id: i64,

        #[sea_orm(column_name = "ReviewerName", column_type = "Text")]
        pub reviewer_name: String,

        #[sea_orm(column_name = "StallNumber")]
        pub stall_number: f64,

        #[sea_orm(column_name = "StreetName")]
        pub street_name: String,

        #[sea_orm(column_name = "Rating")]
        pub rating: i32,

        #[sea_orm(column_name = "ReviewText", column_type = "Text")]
        pub review_text: String,

        #[sea_orm(column_name = "UpdatedAt")]
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
