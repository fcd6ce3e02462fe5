//! The user-facing actions: create, view, edit and review.
//!
//! Each one validates its raw input first, then talks to the store, and
//! hands back typed results for the chat layer to render.

use log::{info, warn};

use crate::{
    auth::{Access, Caller},
    error::{Error, Result, ValidationError},
    format,
    location::{Location, MallKey, NewStall, Stall, StallChanges, StallKey},
    model::mall_review,
    resolve::{KeyStep, NumberKnown, StreetPrompt},
    store::{RecordStore, ReviewSubmission, StoredReview},
    validate,
};

/// Raw creation input as typed by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StallForm {
    pub number: String,
    pub street: Option<String>,
    pub ign: String,
    pub stall_name: String,
    pub items_sold: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewForm {
    pub number: String,
    pub street: String,
    pub rating: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditStep {
    Ready(StallKey, StallChanges),
    ChooseStreet(StreetPrompt, StallChanges),
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    NoChanges,
    Updated {
        stall: Stall,
        changed: Vec<&'static str>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReviewStatus {
    Existing(mall_review::Model),
    Missing(MallKey),
}

pub struct Workflows {
    store: RecordStore,
    access: Access,
}

impl Workflows {
    pub fn new(store: RecordStore, access: Access) -> Self {
        Self { store, access }
    }

    pub fn access(&self) -> &Access {
        &self.access
    }

    pub async fn create(&self, location: Location, form: &StallForm) -> Result<Stall> {
        let stall = new_stall(location, form)?;
        self.store.insert(&stall).await
    }

    /// First step of view and edit: a number that may still need a street.
    pub async fn lookup(&self, location: Location, raw_number: &str) -> Result<KeyStep> {
        NumberKnown::parse(location, raw_number)?
            .resolve(&self.store)
            .await
    }

    pub async fn view(&self, key: &StallKey) -> Result<Stall> {
        self.store
            .get(key)
            .await?
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Checks permission and the supplied fields before any street round trip.
    pub async fn prepare_edit(
        &self,
        caller: &Caller,
        location: Location,
        raw_number: &str,
        raw_changes: &StallChanges,
    ) -> Result<EditStep> {
        if !self.access.permits(caller) {
            return Err(Error::Unauthorized);
        }
        let changes = validate::changes(location, raw_changes)?;

        Ok(match self.lookup(location, raw_number).await? {
            KeyStep::Resolved(key) => EditStep::Ready(key, changes),
            KeyStep::ChooseStreet(prompt) => EditStep::ChooseStreet(prompt, changes),
        })
    }

    /// Applies the supplied fields to an existing stall; omitted ones keep
    /// their stored values. A missing stall is reported even when nothing
    /// would change.
    pub async fn edit(
        &self,
        caller: &Caller,
        key: &StallKey,
        raw_changes: &StallChanges,
    ) -> Result<EditOutcome> {
        if !self.access.permits(caller) {
            return Err(Error::Unauthorized);
        }
        let changes = validate::changes(key.location(), raw_changes)?;

        let mut stall = self.view(key).await?;
        if changes.is_empty() {
            return Ok(EditOutcome::NoChanges);
        }
        self.store.update(key, &changes).await?;
        changes.apply(&mut stall);
        info!("Stall {key} edited by {}", caller.id);

        Ok(EditOutcome::Updated {
            stall,
            changed: changes.labels(),
        })
    }

    /// The caller's current review of a stall, if any.
    pub async fn review_status(
        &self,
        caller: &Caller,
        raw_number: &str,
        raw_street: &str,
    ) -> Result<ReviewStatus> {
        let key = mall_key(raw_number, raw_street)?;
        self.refresh_reviewer_name(caller).await;
        self.ensure_stall(&key).await?;

        Ok(match self.store.find_review(caller.id, &key).await? {
            Some(review) => ReviewStatus::Existing(review),
            None => ReviewStatus::Missing(key),
        })
    }

    pub async fn review(&self, caller: &Caller, form: &ReviewForm) -> Result<StoredReview> {
        let key = mall_key(&form.number, &form.street)?;
        let rating = validate::rating(&form.rating)?;
        let text = validate::text(
            format::LABEL_REVIEW,
            &form.text,
            validate::REVIEW_TEXT_MAX,
        )?;

        self.refresh_reviewer_name(caller).await;
        self.ensure_stall(&key).await?;

        let stored = self
            .store
            .upsert_review(&ReviewSubmission {
                reviewer_id: caller.id,
                reviewer_name: caller.display_name.clone(),
                key,
                rating,
                text,
            })
            .await?;
        info!(
            "Review by {} for stall {key} {}",
            caller.id,
            if stored.updated { "updated" } else { "created" }
        );
        Ok(stored)
    }

    async fn ensure_stall(&self, key: &MallKey) -> Result<()> {
        if self.store.exists(&StallKey::Mall(*key)).await? {
            Ok(())
        } else {
            Err(Error::NotFound(key.to_string()))
        }
    }

    async fn refresh_reviewer_name(&self, caller: &Caller) {
        if let Err(err) = self
            .store
            .rename_reviewer(caller.id, &caller.display_name)
            .await
        {
            warn!("Could not refresh reviewer name for {}: {err}", caller.id);
        }
    }
}

fn mall_key(raw_number: &str, raw_street: &str) -> Result<MallKey, ValidationError> {
    Ok(MallKey {
        number: validate::stall_number(raw_number, Location::Mall)?,
        street: validate::street_name(raw_street)?,
    })
}

fn new_stall(location: Location, form: &StallForm) -> Result<NewStall, ValidationError> {
    let ign = validate::text(format::LABEL_IGN, &form.ign, validate::IGN_MAX)?;
    let stall_name = validate::text(
        format::LABEL_STALL_NAME,
        &form.stall_name,
        validate::STALL_NAME_MAX,
    )?;

    Ok(match location {
        Location::WarpHall => NewStall::WarpHall {
            number: validate::warp_hall_number(&form.number)?,
            ign,
            stall_name,
        },
        Location::Mall => NewStall::Mall {
            key: mall_key(&form.number, form.street.as_deref().unwrap_or_default())?,
            ign,
            stall_name,
            items_sold: validate::text(
                format::LABEL_ITEMS_SOLD,
                form.items_sold.as_deref().unwrap_or_default(),
                validate::ITEMS_SOLD_MAX,
            )?,
        },
    })
}
