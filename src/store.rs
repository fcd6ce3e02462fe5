//! Keyed access to the stall and review tables.
//!
//! Every public operation opens its own connection and drops it when done;
//! nothing is cached between calls.

use chrono::Utc;
use log::{debug, info};
use sea_orm::{
    sea_query::{Expr, Index, IndexCreateStatement},
    ActiveModelTrait, ColumnTrait, Condition, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Schema,
    Set, SqlErr,
};

use crate::{
    error::{Error, Result},
    location::{MallKey, NewStall, Stall, StallChanges, StallKey, Street},
    model::{mall_review, mall_stall, warp_hall},
};

/// A review as submitted by a caller, before it is stored.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewSubmission {
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub key: MallKey,
    pub rating: i32,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredReview {
    pub review: mall_review::Model,
    /// `true` when an earlier review by the same reviewer was overwritten.
    pub updated: bool,
}

#[derive(Clone, Debug)]
pub struct RecordStore {
    url: String,
}

impl RecordStore {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    async fn connect(&self) -> Result<DatabaseConnection> {
        let mut options = ConnectOptions::new(self.url.clone());
        options.max_connections(1).sqlx_logging(false);
        Database::connect(options)
            .await
            .map_err(Error::StoreUnavailable)
    }

    /// Creates the three tables and their natural-key indexes if absent.
    pub async fn ensure_schema(&self) -> Result<()> {
        let db = self.connect().await?;

        create_table(warp_hall::Entity, &db).await?;
        create_table(mall_stall::Entity, &db).await?;
        create_table(mall_review::Entity, &db).await?;

        create_index(
            Index::create()
                .name("idx_the_mall_stall_key")
                .table(mall_stall::Entity)
                .col(mall_stall::Column::StallNumber)
                .col(mall_stall::Column::StreetName)
                .unique()
                .if_not_exists()
                .to_owned(),
            &db,
        )
        .await?;
        create_index(
            Index::create()
                .name("idx_the_mall_reviews_key")
                .table(mall_review::Entity)
                .col(mall_review::Column::ReviewerId)
                .col(mall_review::Column::StallNumber)
                .col(mall_review::Column::StreetName)
                .unique()
                .if_not_exists()
                .to_owned(),
            &db,
        )
        .await?;

        Ok(())
    }

    pub async fn exists(&self, key: &StallKey) -> Result<bool> {
        let db = self.connect().await?;
        key_exists(&db, key).await
    }

    pub async fn get(&self, key: &StallKey) -> Result<Option<Stall>> {
        let db = self.connect().await?;

        let stall = match key {
            StallKey::WarpHall(number) => warp_hall::Entity::find_by_id(*number)
                .one(&db)
                .await?
                .map(Stall::WarpHall),
            StallKey::Mall(key) => mall_stall::Entity::find()
                .filter(mall_stall_condition(key))
                .one(&db)
                .await?
                .map(Stall::Mall),
        };

        Ok(stall)
    }

    /// Streets holding a mall stall with this number, in canonical street order.
    pub async fn streets_with_number(&self, number: f64) -> Result<Vec<Street>> {
        let db = self.connect().await?;

        let stalls = mall_stall::Entity::find()
            .filter(mall_stall::Column::StallNumber.eq(number))
            .all(&db)
            .await?;

        Ok(Street::ALL
            .into_iter()
            .filter(|street| {
                stalls
                    .iter()
                    .any(|stall| stall.street_name == street.as_str())
            })
            .collect())
    }

    /// Inserts a new stall, failing with [`Error::Conflict`] if the key is taken.
    ///
    /// The existence check and the insert are separate statements; the unique
    /// key on each table turns a lost race into the same `Conflict`.
    pub async fn insert(&self, stall: &NewStall) -> Result<Stall> {
        let db = self.connect().await?;
        let key = stall.key();

        if key_exists(&db, &key).await? {
            return Err(Error::Conflict(key));
        }

        insert_stall(&db, stall).await
    }

    /// Applies the supplied fields only. Zero matching rows is [`Error::NotFound`].
    pub async fn update(&self, key: &StallKey, changes: &StallChanges) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let db = self.connect().await?;

        let rows_affected = match key {
            StallKey::WarpHall(number) => {
                if changes.ign.is_none() && changes.stall_name.is_none() {
                    return Ok(());
                }
                let mut update = warp_hall::Entity::update_many()
                    .filter(warp_hall::Column::StallNumber.eq(*number));
                if let Some(ign) = &changes.ign {
                    update = update.col_expr(warp_hall::Column::Ign, Expr::value(ign.clone()));
                }
                if let Some(name) = &changes.stall_name {
                    update =
                        update.col_expr(warp_hall::Column::StallName, Expr::value(name.clone()));
                }
                update.exec(&db).await?.rows_affected
            }
            StallKey::Mall(mall_key) => {
                let mut update =
                    mall_stall::Entity::update_many().filter(mall_stall_condition(mall_key));
                if let Some(ign) = &changes.ign {
                    update = update.col_expr(mall_stall::Column::Ign, Expr::value(ign.clone()));
                }
                if let Some(name) = &changes.stall_name {
                    update =
                        update.col_expr(mall_stall::Column::StallName, Expr::value(name.clone()));
                }
                if let Some(items) = &changes.items_sold {
                    update =
                        update.col_expr(mall_stall::Column::ItemsSold, Expr::value(items.clone()));
                }
                update.exec(&db).await?.rows_affected
            }
        };

        if rows_affected == 0 {
            return Err(Error::NotFound(key.to_string()));
        }
        info!("Updated stall {key}");
        Ok(())
    }

    pub async fn find_review(
        &self,
        reviewer_id: i64,
        key: &MallKey,
    ) -> Result<Option<mall_review::Model>> {
        let db = self.connect().await?;

        Ok(mall_review::Entity::find()
            .filter(review_condition(reviewer_id, key))
            .one(&db)
            .await?)
    }

    pub async fn count_reviews(&self, key: &MallKey) -> Result<u64> {
        let db = self.connect().await?;

        Ok(mall_review::Entity::find()
            .filter(mall_review::Column::StallNumber.eq(key.number))
            .filter(mall_review::Column::StreetName.eq(key.street.as_str()))
            .count(&db)
            .await?)
    }

    /// At most one review per reviewer and stall: a second submission
    /// overwrites rating, text and timestamp of the first.
    pub async fn upsert_review(&self, review: &ReviewSubmission) -> Result<StoredReview> {
        let db = self.connect().await?;
        let existing = mall_review::Entity::find()
            .filter(review_condition(review.reviewer_id, &review.key))
            .one(&db)
            .await?;
        if let Some(existing) = existing {
            return overwrite_review(&db, existing, review).await;
        }

        insert_review(&db, review).await
    }

    /// Sets `name` on all of the reviewer's rows. Skips the write when every
    /// row already carries it; returns whether anything was written.
    pub async fn rename_reviewer(&self, reviewer_id: i64, name: &str) -> Result<bool> {
        let db = self.connect().await?;

        let reviews = mall_review::Entity::find()
            .filter(mall_review::Column::ReviewerId.eq(reviewer_id))
            .all(&db)
            .await?;
        if reviews.iter().all(|review| review.reviewer_name == name) {
            return Ok(false);
        }

        mall_review::Entity::update_many()
            .col_expr(mall_review::Column::ReviewerName, Expr::value(name))
            .filter(mall_review::Column::ReviewerId.eq(reviewer_id))
            .exec(&db)
            .await?;
        debug!("Renamed reviewer {reviewer_id} to {name:?}");

        Ok(true)
    }
}

async fn create_table<E: EntityTrait>(entity: E, db: &DatabaseConnection) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    db.execute(builder.build(schema.create_table_from_entity(entity).if_not_exists()))
        .await?;

    Ok(())
}

async fn create_index(index: IndexCreateStatement, db: &DatabaseConnection) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    db.execute(builder.build(&index)).await?;
    Ok(())
}

async fn key_exists(db: &DatabaseConnection, key: &StallKey) -> Result<bool> {
    let count = match key {
        StallKey::WarpHall(number) => warp_hall::Entity::find_by_id(*number).count(db).await?,
        StallKey::Mall(key) => {
            mall_stall::Entity::find()
                .filter(mall_stall_condition(key))
                .count(db)
                .await?
        }
    };
    Ok(count > 0)
}

async fn insert_stall(db: &DatabaseConnection, stall: &NewStall) -> Result<Stall> {
    let key = stall.key();

    let inserted = match stall {
        NewStall::WarpHall {
            number,
            ign,
            stall_name,
        } => warp_hall::ActiveModel {
            stall_number: Set(*number),
            ign: Set(ign.clone()),
            stall_name: Set(stall_name.clone()),
        }
        .insert(db)
        .await
        .map(Stall::WarpHall),
        NewStall::Mall {
            key: mall_key,
            ign,
            stall_name,
            items_sold,
        } => mall_stall::ActiveModel {
            stall_number: Set(mall_key.number),
            street_name: Set(mall_key.street.as_str().to_string()),
            ign: Set(ign.clone()),
            stall_name: Set(stall_name.clone()),
            items_sold: Set(items_sold.clone()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map(Stall::Mall),
    };

    match inserted {
        Ok(stall) => {
            info!("Inserted stall {key}");
            Ok(stall)
        }
        Err(err) if is_unique_violation(&err) => Err(Error::Conflict(key)),
        Err(err) => Err(err.into()),
    }
}

/// Stores a first review. If a concurrent first submission got there
/// earlier, that row is overwritten instead.
async fn insert_review(db: &DatabaseConnection, review: &ReviewSubmission) -> Result<StoredReview> {
    let inserted = mall_review::ActiveModel {
        reviewer_id: Set(review.reviewer_id),
        reviewer_name: Set(review.reviewer_name.clone()),
        stall_number: Set(review.key.number),
        street_name: Set(review.key.street.as_str().to_string()),
        rating: Set(review.rating),
        review_text: Set(review.text.clone()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(stored) => Ok(StoredReview {
            review: stored,
            updated: false,
        }),
        Err(err) if is_unique_violation(&err) => {
            let existing = mall_review::Entity::find()
                .filter(review_condition(review.reviewer_id, &review.key))
                .one(db)
                .await?
                .ok_or(Error::Store(err))?;
            overwrite_review(db, existing, review).await
        }
        Err(err) => Err(err.into()),
    }
}

async fn overwrite_review(
    db: &DatabaseConnection,
    existing: mall_review::Model,
    review: &ReviewSubmission,
) -> Result<StoredReview> {
    let mut active = existing.into_active_model();
    active.rating = Set(review.rating);
    active.review_text = Set(review.text.clone());
    active.updated_at = Set(Utc::now());

    Ok(StoredReview {
        review: active.update(db).await?,
        updated: true,
    })
}

fn mall_stall_condition(key: &MallKey) -> Condition {
    Condition::all()
        .add(mall_stall::Column::StallNumber.eq(key.number))
        .add(mall_stall::Column::StreetName.eq(key.street.as_str()))
}

fn review_condition(reviewer_id: i64, key: &MallKey) -> Condition {
    Condition::all()
        .add(mall_review::Column::ReviewerId.eq(reviewer_id))
        .add(mall_review::Column::StallNumber.eq(key.number))
        .add(mall_review::Column::StreetName.eq(key.street.as_str()))
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn warp(number: i32, ign: &str, stall_name: &str) -> NewStall {
        NewStall::WarpHall {
            number,
            ign: ign.into(),
            stall_name: stall_name.into(),
        }
    }

    fn mall(number: f64, street: Street, ign: &str) -> NewStall {
        NewStall::Mall {
            key: MallKey { number, street },
            ign: ign.into(),
            stall_name: "Den".into(),
            items_sold: "Pelts".into(),
        }
    }

    fn submission(reviewer_id: i64, name: &str, rating: i32, text: &str) -> ReviewSubmission {
        ReviewSubmission {
            reviewer_id,
            reviewer_name: name.into(),
            key: MallKey {
                number: 3.0,
                street: Street::WallStreet,
            },
            rating,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn insert_then_get_warp_hall() {
        let (_dir, store) = scratch::store().await;

        store.insert(&warp(12, "Fox", "Den")).await.unwrap();

        let key = StallKey::WarpHall(12);
        assert!(store.exists(&key).await.unwrap());
        assert_eq!(
            store.get(&key).await.unwrap(),
            Some(Stall::WarpHall(warp_hall::Model {
                stall_number: 12,
                ign: "Fox".into(),
                stall_name: "Den".into(),
            }))
        );
        assert_eq!(store.get(&StallKey::WarpHall(13)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts_and_keeps_first_row() {
        let (_dir, store) = scratch::store().await;
        store.insert(&warp(12, "Fox", "Den")).await.unwrap();

        let err = store.insert(&warp(12, "Wolf", "Lair")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(StallKey::WarpHall(12))));

        let stall = store.get(&StallKey::WarpHall(12)).await.unwrap().unwrap();
        assert_eq!(stall.ign(), "Fox");
        assert_eq!(stall.stall_name(), "Den");
    }

    #[tokio::test]
    async fn mall_numbers_repeat_across_streets() {
        let (_dir, store) = scratch::store().await;

        store.insert(&mall(3.0, Street::Five, "Fox")).await.unwrap();
        store.insert(&mall(3.0, Street::WallStreet, "Wolf")).await.unwrap();
        let err = store
            .insert(&mall(3.0, Street::Five, "Otter"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(StallKey::Mall(_))));

        assert_eq!(
            store.streets_with_number(3.0).await.unwrap(),
            vec![Street::WallStreet, Street::Five]
        );
        assert!(store.streets_with_number(4.0).await.unwrap().is_empty());

        let key = StallKey::Mall(MallKey {
            number: 3.0,
            street: Street::WallStreet,
        });
        assert_eq!(store.get(&key).await.unwrap().unwrap().ign(), "Wolf");
    }

    #[tokio::test]
    async fn update_touches_only_supplied_fields() {
        let (_dir, store) = scratch::store().await;
        store.insert(&mall(2.5, Street::WokeAve, "Fox")).await.unwrap();
        let key = StallKey::Mall(MallKey {
            number: 2.5,
            street: Street::WokeAve,
        });

        let changes = StallChanges {
            stall_name: Some("Burrow".into()),
            ..Default::default()
        };
        store.update(&key, &changes).await.unwrap();

        match store.get(&key).await.unwrap().unwrap() {
            Stall::Mall(stall) => {
                assert_eq!(stall.ign, "Fox");
                assert_eq!(stall.stall_name, "Burrow");
                assert_eq!(stall.items_sold, "Pelts");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_of_missing_key_is_not_found() {
        let (_dir, store) = scratch::store().await;
        let changes = StallChanges {
            ign: Some("Fox".into()),
            ..Default::default()
        };

        let err = store
            .update(&StallKey::WarpHall(99), &changes)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn second_review_overwrites_first() {
        let (_dir, store) = scratch::store().await;
        let key = MallKey {
            number: 3.0,
            street: Street::WallStreet,
        };

        let first = store
            .upsert_review(&submission(7, "Vix", 2, "meh"))
            .await
            .unwrap();
        assert!(!first.updated);
        assert_eq!(store.count_reviews(&key).await.unwrap(), 1);

        let second = store
            .upsert_review(&submission(7, "Vix", 5, "great now"))
            .await
            .unwrap();
        assert!(second.updated);
        assert_eq!(second.review.id, first.review.id);
        assert_eq!(store.count_reviews(&key).await.unwrap(), 1);

        let stored = store.find_review(7, &key).await.unwrap().unwrap();
        assert_eq!(stored.rating, 5);
        assert_eq!(stored.review_text, "great now");

        store
            .upsert_review(&submission(8, "Rook", 4, "fine"))
            .await
            .unwrap();
        assert_eq!(store.count_reviews(&key).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn rename_reviewer_only_writes_when_stale() {
        let (_dir, store) = scratch::store().await;
        store
            .upsert_review(&submission(7, "Vix", 4, "ok"))
            .await
            .unwrap();

        assert!(!store.rename_reviewer(7, "Vix").await.unwrap());
        assert!(store.rename_reviewer(7, "Vixen").await.unwrap());

        let key = MallKey {
            number: 3.0,
            street: Street::WallStreet,
        };
        let stored = store.find_review(7, &key).await.unwrap().unwrap();
        assert_eq!(stored.reviewer_name, "Vixen");
        assert!(!store.rename_reviewer(99, "Nobody").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_rows_violate_the_unique_keys() {
        let (_dir, store) = scratch::store().await;
        let db = store.connect().await.unwrap();

        let warp_row = || warp_hall::ActiveModel {
            stall_number: Set(5),
            ign: Set("Fox".into()),
            stall_name: Set("Den".into()),
        };
        warp_row().insert(&db).await.unwrap();
        let err = warp_row().insert(&db).await.unwrap_err();
        assert!(is_unique_violation(&err), "{err:?}");

        let mall_row = || mall_stall::ActiveModel {
            stall_number: Set(5.0),
            street_name: Set(Street::Five.as_str().to_string()),
            ign: Set("Fox".into()),
            stall_name: Set("Den".into()),
            items_sold: Set("Pelts".into()),
            ..Default::default()
        };
        mall_row().insert(&db).await.unwrap();
        let err = mall_row().insert(&db).await.unwrap_err();
        assert!(is_unique_violation(&err), "{err:?}");
    }

    #[tokio::test]
    async fn insert_that_loses_the_race_conflicts() {
        let (_dir, store) = scratch::store().await;
        store.insert(&warp(12, "Fox", "Den")).await.unwrap();
        store.insert(&mall(3.0, Street::Five, "Fox")).await.unwrap();

        // skip the existence check, as a concurrent insert would
        let db = store.connect().await.unwrap();
        let err = insert_stall(&db, &warp(12, "Wolf", "Lair"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(StallKey::WarpHall(12))));
        let err = insert_stall(&db, &mall(3.0, Street::Five, "Otter"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(StallKey::Mall(_))));

        let stall = store.get(&StallKey::WarpHall(12)).await.unwrap().unwrap();
        assert_eq!(stall.ign(), "Fox");
    }

    #[tokio::test]
    async fn review_that_loses_the_race_overwrites() {
        let (_dir, store) = scratch::store().await;
        let key = MallKey {
            number: 3.0,
            street: Street::WallStreet,
        };
        let first = store
            .upsert_review(&submission(7, "Vix", 2, "meh"))
            .await
            .unwrap();

        // the row appeared after the lookup found nothing
        let db = store.connect().await.unwrap();
        let second = insert_review(&db, &submission(7, "Vix", 5, "great now"))
            .await
            .unwrap();
        assert!(second.updated);
        assert_eq!(second.review.id, first.review.id);
        assert_eq!(second.review.rating, 5);
        assert_eq!(second.review.review_text, "great now");
        assert_eq!(store.count_reviews(&key).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        let store = scratch::unreachable();
        let err = store.exists(&StallKey::WarpHall(1)).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
