pub const FOOTER: &str = "Furryville Index Database";
pub const SENDER_UNKNOWN: &str = "Failed to find the sender of this message";
pub const NO_CHANGES_TITLE: &str = "No Changes Made";
pub const NO_CHANGES: &str = "All fields were empty, so no changes were applied to the stall.";
pub const SELECTION_EXPIRED: &str = "This selection has expired. Run the command again.";
pub const SELECTION_NOT_YOURS: &str = "Only the person who ran the command can pick the street.";
pub const NOT_ADMIN: &str = "You are not authorized to run this command.";
pub const MAINTENANCE_TITLE: &str = "🛠️ Stall Index Maintenance";

pub const USAGE_CREATE: &str = "Usage:\n\
    /stallcreate warp <number> | <ign> | <stall name>\n\
    /stallcreate mall <number> | <street> | <ign> | <stall name> | <items sold>";
pub const USAGE_VIEW: &str = "Usage: /stallview <warp|mall> <number>";
pub const USAGE_EDIT: &str =
    "Usage: /stalledit <warp|mall> <number> | ign=<value> | name=<value> | items=<value>";
pub const USAGE_REVIEW: &str = "Usage:\n\
    /review <number> | <street>\n\
    /review <number> | <street> | <rating 1-5> | <text>";
