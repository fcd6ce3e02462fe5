//! Display cards for stalls, reviews and failures, rendered to Telegram HTML.

use std::time::Duration;

use html_escape::encode_text;
use itertools::Itertools;

use crate::{
    error::Error,
    location::{Location, MallKey, Stall},
    model::mall_review,
    strings,
};

pub const LABEL_STALL_NUMBER: &str = "Stall Number";
pub const LABEL_STREET: &str = "Street Name";
pub const LABEL_IGN: &str = "Owner IGN";
pub const LABEL_STALL_NAME: &str = "Stall Name";
pub const LABEL_ITEMS_SOLD: &str = "Items Sold";
pub const LABEL_REVIEW: &str = "Review";

const FILLED_STAR: &str = "⭐";
const EMPTY_STAR: &str = "☆";
const PREVIEW_CHARS: usize = 500;

/// Ordered label/value pairs with a title, independent of the chat platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayModel {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<(&'static str, String)>,
}

impl DisplayModel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((label, value.into()));
        self
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn to_html(&self) -> String {
        let mut lines = vec![format!("<b>{}</b>", encode_text(&self.title))];
        if let Some(description) = &self.description {
            lines.push(encode_text(description).into_owned());
        }
        if !self.fields.is_empty() {
            lines.push(String::new());
            lines.extend(
                self.fields
                    .iter()
                    .map(|(label, value)| format!("<b>{label}:</b> {}", encode_text(value))),
            );
        }
        lines.push(String::new());
        lines.push(format!("<i>{}</i>", strings::FOOTER));
        lines.join("\n")
    }
}

/// Whole numbers are shown without a decimal point even when stored as floats.
pub fn stall_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub fn stars(rating: i32) -> String {
    let filled = rating.clamp(0, 5) as usize;
    format!(
        "{}{} ({rating}/5)",
        FILLED_STAR.repeat(filled),
        EMPTY_STAR.repeat(5 - filled)
    )
}

fn stall_fields(model: DisplayModel, stall: &Stall) -> DisplayModel {
    match stall {
        Stall::WarpHall(stall) => model
            .field(LABEL_STALL_NUMBER, stall.stall_number.to_string())
            .field(LABEL_IGN, &stall.ign)
            .field(LABEL_STALL_NAME, &stall.stall_name),
        Stall::Mall(stall) => model
            .field(LABEL_STALL_NUMBER, stall_number(stall.stall_number))
            .field(LABEL_STREET, &stall.street_name)
            .field(LABEL_IGN, &stall.ign)
            .field(LABEL_STALL_NAME, &stall.stall_name)
            .field(LABEL_ITEMS_SOLD, &stall.items_sold),
    }
}

fn displayed_number(stall: &Stall) -> String {
    match stall {
        Stall::WarpHall(stall) => stall.stall_number.to_string(),
        Stall::Mall(stall) => stall_number(stall.stall_number),
    }
}

pub fn record(stall: &Stall) -> DisplayModel {
    let title = format!(
        "{} Stall #{}",
        stall.location().title(),
        displayed_number(stall)
    );
    stall_fields(DisplayModel::new(title), stall)
}

pub fn created(stall: &Stall) -> DisplayModel {
    let title = format!("✅ {} Stall Created Successfully!", stall.location().title());
    stall_fields(DisplayModel::new(title), stall)
}

pub fn updated(stall: &Stall, changed: &[&'static str]) -> DisplayModel {
    let title = format!("✅ {} Stall Updated Successfully!", stall.location().title());
    stall_fields(DisplayModel::new(title), stall).field("Updated Fields", changed.join(", "))
}

pub fn no_changes() -> DisplayModel {
    DisplayModel::new(strings::NO_CHANGES_TITLE).describe(strings::NO_CHANGES)
}

pub fn review(review: &mall_review::Model, updated: bool) -> DisplayModel {
    let number = stall_number(review.stall_number);
    let title = if updated {
        format!("✅ Review Updated for The Mall Stall #{number}")
    } else {
        format!("✅ Review Submitted for The Mall Stall #{number}")
    };
    DisplayModel::new(title)
        .field("Reviewer", &review.reviewer_name)
        .field(LABEL_STALL_NUMBER, number)
        .field("Street", &review.street_name)
        .field("Rating", stars(review.rating))
        .field(LABEL_REVIEW, &review.review_text)
}

/// The caller's current review, shown before they overwrite it.
pub fn existing_review(review: &mall_review::Model) -> DisplayModel {
    let mut preview: String = review.review_text.chars().take(PREVIEW_CHARS).collect();
    if review.review_text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    DisplayModel::new("Your Existing Review")
        .describe(format!(
            "You already have a review for stall #{} on {}. Send the command again with a rating and text to replace it.",
            stall_number(review.stall_number),
            review.street_name
        ))
        .field("Current Rating", stars(review.rating))
        .field("Current Review", preview)
}

pub fn review_invitation(key: &MallKey) -> DisplayModel {
    DisplayModel::new("Review The Mall Stall").describe(format!(
        "No review from you for stall #{key} yet. Send /review {} | {} | <rating 1-5> | <text> to write one.",
        stall_number(key.number),
        key.street
    ))
}

pub fn street_prompt(location: Location, number: f64) -> DisplayModel {
    DisplayModel::new("Select Street Name").describe(format!(
        "Please select which street stall #{} in {} is located on.",
        stall_number(number),
        location.title()
    ))
}

pub fn failure(error: &Error) -> DisplayModel {
    let title = match error {
        Error::InvalidInput(_) => "Invalid Input",
        Error::Conflict(_) => "Stall Already Exists",
        Error::NotFound(_) => "Not Found",
        Error::Unauthorized => "❌ Permission Denied",
        Error::StoreUnavailable(_) | Error::Store(_) => "Database Error",
    };
    DisplayModel::new(title).describe(error.to_string())
}

pub fn notice(title: &str, description: impl Into<String>) -> DisplayModel {
    DisplayModel::new(title).describe(description)
}

/// `Just booted` under a minute, otherwise the largest non-zero unit first.
pub fn uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    if total < 60 {
        return "Just booted".to_string();
    }

    let (minutes, seconds) = (total / 60, total % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let (days, hours) = (hours / 24, hours % 24);

    let parts = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")];
    parts
        .iter()
        .skip_while(|(amount, _)| *amount == 0)
        .map(|(amount, unit)| format!("{amount}{unit}"))
        .join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{mall_stall, warp_hall};

    fn sample_review(rating: i32, text: &str) -> mall_review::Model {
        mall_review::Model {
            id: 1,
            reviewer_id: 42,
            reviewer_name: "Vix".into(),
            stall_number: 3.0,
            street_name: "Wall Street".into(),
            rating,
            review_text: text.into(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn whole_floats_lose_the_decimal_point() {
        assert_eq!(stall_number(3.0), "3");
        assert_eq!(stall_number(2.5), "2.5");
        assert_eq!(stall_number(100.0), "100");
    }

    #[test]
    fn star_strip_is_five_wide() {
        assert_eq!(stars(3), "⭐⭐⭐☆☆ (3/5)");
        assert_eq!(stars(5), "⭐⭐⭐⭐⭐ (5/5)");
        assert_eq!(stars(1), "⭐☆☆☆☆ (1/5)");
    }

    #[test]
    fn warp_hall_record_fields() {
        let stall = Stall::WarpHall(warp_hall::Model {
            stall_number: 12,
            ign: "Fox".into(),
            stall_name: "Den".into(),
        });
        let card = record(&stall);
        assert_eq!(card.title, "Warp Hall Stall #12");
        assert_eq!(
            card.fields.iter().map(|(label, _)| *label).collect::<Vec<_>>(),
            vec![LABEL_STALL_NUMBER, LABEL_IGN, LABEL_STALL_NAME]
        );
        assert_eq!(card.value(LABEL_IGN), Some("Fox"));
    }

    #[test]
    fn mall_record_uses_integer_display() {
        let stall = Stall::Mall(mall_stall::Model {
            id: 9,
            stall_number: 4.0,
            street_name: "Five".into(),
            ign: "Fox".into(),
            stall_name: "Den".into(),
            items_sold: "Pelts".into(),
        });
        let card = record(&stall);
        assert_eq!(card.title, "The Mall Stall #4");
        assert_eq!(card.value(LABEL_STALL_NUMBER), Some("4"));
        assert_eq!(card.value(LABEL_STREET), Some("Five"));
        assert_eq!(card.value(LABEL_ITEMS_SOLD), Some("Pelts"));
    }

    #[test]
    fn review_cards() {
        let card = review(&sample_review(4, "Nice"), false);
        assert!(card.title.starts_with("✅ Review Submitted"));
        assert_eq!(card.value("Rating"), Some("⭐⭐⭐⭐☆ (4/5)"));

        let card = review(&sample_review(4, "Nice"), true);
        assert!(card.title.starts_with("✅ Review Updated"));
    }

    #[test]
    fn long_reviews_are_previewed() {
        let card = existing_review(&sample_review(2, &"a".repeat(600)));
        let preview = card.value("Current Review").unwrap();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn html_is_escaped() {
        let html = DisplayModel::new("<Stall>").field(LABEL_IGN, "a&b").to_html();
        assert!(html.contains("<b>&lt;Stall&gt;</b>"));
        assert!(html.contains("<b>Owner IGN:</b> a&amp;b"));
    }

    #[test]
    fn uptime_strings() {
        assert_eq!(uptime(Duration::from_secs(59)), "Just booted");
        assert_eq!(uptime(Duration::from_secs(61)), "1m 1s");
        assert_eq!(uptime(Duration::from_secs(3600)), "1h 0m 0s");
        assert_eq!(uptime(Duration::from_secs(90_061)), "1d 1h 1m 1s");
    }
}
