//! Turning a bare stall number into a full [`StallKey`].
//!
//! Resolution runs `NumberKnown -> StreetChosen -> Resolved`. A Warp Hall
//! number is already a full key. A mall number needs a street: the candidates
//! are the streets that hold a stall with that number. An empty candidate set
//! ends resolution with `NotFound` before the caller is asked anything, and a
//! single candidate is taken without asking.

use crate::{
    error::{Error, Result, ValidationError},
    location::{Location, MallKey, StallKey, Street},
    store::RecordStore,
    validate,
};

/// A validated number whose street, if any, is still unknown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberKnown {
    WarpHall(i32),
    Mall(f64),
}

impl NumberKnown {
    pub fn parse(location: Location, raw: &str) -> Result<Self, ValidationError> {
        match location {
            Location::WarpHall => validate::warp_hall_number(raw).map(Self::WarpHall),
            Location::Mall => validate::stall_number(raw, Location::Mall).map(Self::Mall),
        }
    }

    pub async fn resolve(self, store: &RecordStore) -> Result<KeyStep> {
        match self {
            Self::WarpHall(number) => Ok(KeyStep::Resolved(StallKey::WarpHall(number))),
            Self::Mall(number) => {
                let candidates = store.streets_with_number(number).await?;
                if candidates.len() > 1 {
                    return Ok(KeyStep::ChooseStreet(StreetPrompt { number, candidates }));
                }
                match candidates.first() {
                    Some(&street) => Ok(KeyStep::Resolved(StallKey::Mall(MallKey {
                        number,
                        street,
                    }))),
                    None => Err(Error::NotFound(format!(
                        "{} in The Mall",
                        crate::format::stall_number(number)
                    ))),
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum KeyStep {
    Resolved(StallKey),
    ChooseStreet(StreetPrompt),
}

/// The `StreetChosen` transition is [`StreetPrompt::choose`].
#[derive(Clone, Debug, PartialEq)]
pub struct StreetPrompt {
    number: f64,
    candidates: Vec<Street>,
}

impl StreetPrompt {
    pub fn number(&self) -> f64 {
        self.number
    }

    pub fn candidates(&self) -> &[Street] {
        &self.candidates
    }

    pub fn choose(&self, street: Street) -> Result<StallKey> {
        let key = MallKey {
            number: self.number,
            street,
        };
        if !self.candidates.contains(&street) {
            return Err(Error::NotFound(key.to_string()));
        }
        Ok(StallKey::Mall(key))
    }
}
