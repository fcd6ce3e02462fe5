//! Bot commands and their `|`-separated argument grammar.

use teloxide::utils::command::BotCommands;
use thiserror::Error;

use crate::{
    location::{Location, StallChanges},
    strings,
    workflow::{ReviewForm, StallForm},
};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "create a stall: <warp|mall> <number> | [street |] ign | stall name [| items sold]")]
    StallCreate(String),

    #[command(description = "view a stall: <warp|mall> <number>")]
    StallView(String),

    #[command(description = "edit a stall: <warp|mall> <number> | ign=.. | name=.. | items=..")]
    StallEdit(String),

    #[command(description = "review a mall stall: <number> | <street> [| <rating 1-5> | <text>]")]
    Review(String),

    #[command(description = "show the maintenance panel (admin only)")]
    Maintenance,

    #[command(description = "get help message")]
    Help,
}

/// Arguments did not fit the command's shape; carries the usage text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UsageError(pub &'static str);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewRequest {
    Show { number: String, street: String },
    Submit(ReviewForm),
}

fn segments(args: &str, limit: usize) -> Vec<String> {
    args.splitn(limit, '|')
        .map(|segment| segment.trim().to_string())
        .collect()
}

/// `<warp|mall> <number>`
fn target(segment: &str, usage: &'static str) -> Result<(Location, String), UsageError> {
    let mut words = segment.split_whitespace();
    let location = words
        .next()
        .and_then(Location::from_token)
        .ok_or(UsageError(usage))?;
    let number = words.next().ok_or(UsageError(usage))?;
    if words.next().is_some() {
        return Err(UsageError(usage));
    }
    Ok((location, number.to_string()))
}

pub fn create_args(args: &str) -> Result<(Location, StallForm), UsageError> {
    let usage = strings::USAGE_CREATE;
    let head = args.split('|').next().unwrap_or_default();
    let (location, number) = target(head, usage)?;

    let form = match location {
        Location::WarpHall => match segments(args, 3).as_slice() {
            [_, ign, stall_name] => StallForm {
                number,
                ign: ign.clone(),
                stall_name: stall_name.clone(),
                ..Default::default()
            },
            _ => return Err(UsageError(usage)),
        },
        Location::Mall => match segments(args, 5).as_slice() {
            [_, street, ign, stall_name, items_sold] => StallForm {
                number,
                street: Some(street.clone()),
                ign: ign.clone(),
                stall_name: stall_name.clone(),
                items_sold: Some(items_sold.clone()),
            },
            _ => return Err(UsageError(usage)),
        },
    };

    Ok((location, form))
}

pub fn view_args(args: &str) -> Result<(Location, String), UsageError> {
    target(args, strings::USAGE_VIEW)
}

/// Field keys are a fixed set; anything else is a usage error.
pub fn edit_args(args: &str) -> Result<(Location, String, StallChanges), UsageError> {
    let usage = strings::USAGE_EDIT;
    let segments = segments(args, usize::MAX);
    let (head, fields) = segments.split_first().ok_or(UsageError(usage))?;
    let (location, number) = target(head, usage)?;

    let mut changes = StallChanges::default();
    for field in fields {
        let (name, value) = field.split_once('=').ok_or(UsageError(usage))?;
        let slot = match name.trim().to_lowercase().as_str() {
            "ign" | "owner" => &mut changes.ign,
            "name" | "stallname" => &mut changes.stall_name,
            "items" | "itemssold" => &mut changes.items_sold,
            _ => return Err(UsageError(usage)),
        };
        *slot = Some(value.trim().to_string());
    }

    Ok((location, number, changes))
}

pub fn review_args(args: &str) -> Result<ReviewRequest, UsageError> {
    let usage = strings::USAGE_REVIEW;
    match segments(args, 4).as_slice() {
        [number, street] if !number.is_empty() => Ok(ReviewRequest::Show {
            number: number.clone(),
            street: street.clone(),
        }),
        [number, street, rating, text] => Ok(ReviewRequest::Submit(ReviewForm {
            number: number.clone(),
            street: street.clone(),
            rating: rating.clone(),
            text: text.clone(),
        })),
        _ => Err(UsageError(usage)),
    }
}
