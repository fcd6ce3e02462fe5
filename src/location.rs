use std::fmt;

use crate::{
    format,
    model::{mall_stall, warp_hall},
};

/// The two marketplace areas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Stalls keyed by number alone.
    WarpHall,
    /// Stalls keyed by number and street.
    Mall,
}

impl Location {
    pub fn title(&self) -> &'static str {
        match self {
            Self::WarpHall => "Warp Hall",
            Self::Mall => "The Mall",
        }
    }

    /// Parses the location token of a command, e.g. `warp` or `mall`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "warp" | "warphall" | "wh" => Some(Self::WarpHall),
            "mall" | "themall" | "tm" => Some(Self::Mall),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Street {
    WallStreet,
    ArtistAlley,
    WokeAve,
    Five,
    PolandStreet,
}

impl Street {
    pub const ALL: [Street; 5] = [
        Street::WallStreet,
        Street::ArtistAlley,
        Street::WokeAve,
        Street::Five,
        Street::PolandStreet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WallStreet => "Wall Street",
            Self::ArtistAlley => "Artist Alley",
            Self::WokeAve => "Woke Ave",
            Self::Five => "Five",
            Self::PolandStreet => "Poland Street",
        }
    }

    /// Exact, case-sensitive lookup by street name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|street| street.as_str() == name)
    }

    /// Position in [`Street::ALL`]; used as a compact wire id.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|street| street == self)
            .unwrap_or_default()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MallKey {
    pub number: f64,
    pub street: Street,
}

impl fmt::Display for MallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", format::stall_number(self.number), self.street)
    }
}

/// A fully resolved primary key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StallKey {
    WarpHall(i32),
    Mall(MallKey),
}

impl StallKey {
    pub fn location(&self) -> Location {
        match self {
            Self::WarpHall(_) => Location::WarpHall,
            Self::Mall(_) => Location::Mall,
        }
    }
}

impl fmt::Display for StallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WarpHall(number) => write!(f, "{number} in Warp Hall"),
            Self::Mall(key) => key.fmt(f),
        }
    }
}

/// A stored stall row of either location.
#[derive(Clone, Debug, PartialEq)]
pub enum Stall {
    WarpHall(warp_hall::Model),
    Mall(mall_stall::Model),
}

impl Stall {
    pub fn location(&self) -> Location {
        match self {
            Self::WarpHall(_) => Location::WarpHall,
            Self::Mall(_) => Location::Mall,
        }
    }

    pub fn ign(&self) -> &str {
        match self {
            Self::WarpHall(stall) => &stall.ign,
            Self::Mall(stall) => &stall.ign,
        }
    }

    pub fn stall_name(&self) -> &str {
        match self {
            Self::WarpHall(stall) => &stall.stall_name,
            Self::Mall(stall) => &stall.stall_name,
        }
    }
}

/// A validated stall that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub enum NewStall {
    WarpHall {
        number: i32,
        ign: String,
        stall_name: String,
    },
    Mall {
        key: MallKey,
        ign: String,
        stall_name: String,
        items_sold: String,
    },
}

impl NewStall {
    pub fn key(&self) -> StallKey {
        match self {
            Self::WarpHall { number, .. } => StallKey::WarpHall(*number),
            Self::Mall { key, .. } => StallKey::Mall(*key),
        }
    }
}

/// Partial update of a stall. `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StallChanges {
    pub ign: Option<String>,
    pub stall_name: Option<String>,
    pub items_sold: Option<String>,
}

impl StallChanges {
    pub fn is_empty(&self) -> bool {
        self.ign.is_none() && self.stall_name.is_none() && self.items_sold.is_none()
    }

    /// Display labels of the supplied fields, in form order.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.ign.is_some(), format::LABEL_IGN),
            (self.stall_name.is_some(), format::LABEL_STALL_NAME),
            (self.items_sold.is_some(), format::LABEL_ITEMS_SOLD),
        ]
        .into_iter()
        .filter_map(|(supplied, label)| supplied.then_some(label))
        .collect()
    }

    /// Overlays the supplied fields onto an already fetched row.
    pub fn apply(&self, stall: &mut Stall) {
        match stall {
            Stall::WarpHall(stall) => {
                if let Some(ign) = &self.ign {
                    stall.ign = ign.clone();
                }
                if let Some(name) = &self.stall_name {
                    stall.stall_name = name.clone();
                }
            }
            Stall::Mall(stall) => {
                if let Some(ign) = &self.ign {
                    stall.ign = ign.clone();
                }
                if let Some(name) = &self.stall_name {
                    stall.stall_name = name.clone();
                }
                if let Some(items) = &self.items_sold {
                    stall.items_sold = items.clone();
                }
            }
        }
    }
}
