use std::{sync::Arc, time::Instant};

use log::{info, warn};
use teloxide::{
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, User},
    utils::command::BotCommands,
};
use thiserror::Error;

mod auth;
mod command;
mod config;
mod error;
mod format;
mod location;
mod model;
mod resolve;
mod session;
mod store;
mod strings;
mod validate;
mod workflow;

use crate::{
    auth::{Access, Caller},
    command::{Command, ReviewRequest, UsageError},
    config::{Config, ConfigError},
    format::DisplayModel,
    location::{Location, Street},
    resolve::{KeyStep, StreetPrompt},
    session::{Pending, PendingAction, SessionError, Sessions},
    store::RecordStore,
    workflow::{EditOutcome, EditStep, ReviewStatus, Workflows},
};

#[tokio::main]
async fn main() -> Result<(), BotError> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();
    info!("Starting bot");

    let config = Config::from_env()?;
    let bot = Bot::from_env();

    // create tables if not exists
    let store = RecordStore::new(config.database_url.clone());
    store.ensure_schema().await?;

    let app = Arc::new(App::new(config, store));

    // setup handlers
    let cmd_handler = Update::filter_message()
        .filter_command::<Command>()
        .branch(dptree::endpoint(command_handler));
    let choice_handler =
        Update::filter_callback_query().branch(dptree::endpoint(street_choice_handler));

    let handler = dptree::entry()
        .branch(cmd_handler)
        .branch(choice_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

struct App {
    config: Config,
    workflows: Workflows,
    sessions: Sessions,
    started: Instant,
}

impl App {
    fn new(config: Config, store: RecordStore) -> Self {
        Self {
            workflows: Workflows::new(store, Access::new(config.admin_id)),
            sessions: Sessions::new(config.selection_timeout),
            started: Instant::now(),
            config,
        }
    }

    async fn identify(&self, bot: &Bot, user: &User, check_role: bool) -> Caller {
        Caller {
            id: user.id.0 as i64,
            display_name: user.full_name(),
            holds_role: check_role && self.holds_role(bot, user).await,
        }
    }

    /// The editor role is membership in the configured role chat.
    async fn holds_role(&self, bot: &Bot, user: &User) -> bool {
        let Some(chat_id) = self.config.role_chat_id else {
            return false;
        };
        match bot.get_chat_member(ChatId(chat_id), user.id).await {
            Ok(member) => member.is_present(),
            Err(err) => {
                warn!("Role lookup for user {} failed: {err}", user.id.0);
                false
            }
        }
    }

    /// Parks the pending action and offers one button per candidate street.
    fn street_choice(
        &self,
        caller: Caller,
        location: Location,
        prompt: StreetPrompt,
        action: PendingAction,
    ) -> Reply {
        let card = format::street_prompt(location, prompt.number());
        let streets = prompt.candidates().to_vec();
        let token = self.sessions.open(caller, prompt, action);

        let keyboard = InlineKeyboardMarkup::new(streets.into_iter().map(|street| {
            vec![InlineKeyboardButton::callback(
                street.as_str(),
                session::encode_choice(token, street),
            )]
        }));
        Reply::Choice(card, keyboard)
    }
}

enum Reply {
    Card(DisplayModel),
    Choice(DisplayModel, InlineKeyboardMarkup),
    Text(String),
}

impl Reply {
    fn usage(usage: UsageError) -> Self {
        Self::Text(usage.to_string())
    }

    fn failure(err: &error::Error) -> Self {
        if err.is_rejection() {
            info!("Rejected: {err}");
        } else {
            warn!("Failed: {err}");
        }
        Self::Card(format::failure(err))
    }

    fn text(&self) -> String {
        match self {
            Self::Card(card) | Self::Choice(card, _) => card.to_html(),
            Self::Text(text) => text.clone(),
        }
    }
}

async fn command_handler(
    bot: Bot,
    message: Message,
    command: Command,
    app: Arc<App>,
) -> Result<(), BotError> {
    // only process commands from known senders
    let sender = match message.from() {
        Some(user) => user.clone(),
        None => {
            send_reply(&bot, &message, Reply::Text(strings::SENDER_UNKNOWN.into())).await?;
            return Ok(());
        }
    };

    let reply = match command {
        Command::StallCreate(args) => create(&app, &args).await,
        Command::StallView(args) => {
            let caller = app.identify(&bot, &sender, false).await;
            view(&app, caller, &args).await
        }
        Command::StallEdit(args) => {
            let caller = app.identify(&bot, &sender, true).await;
            edit(&app, caller, &args).await
        }
        Command::Review(args) => {
            let caller = app.identify(&bot, &sender, false).await;
            review(&app, caller, &args).await
        }
        Command::Maintenance => {
            let caller = app.identify(&bot, &sender, false).await;
            Ok(maintenance(&app, &caller))
        }
        Command::Help => Ok(Reply::Text(Command::descriptions().to_string())),
    };

    let reply = reply.unwrap_or_else(|err| Reply::failure(&err));
    send_reply(&bot, &message, reply).await
}

async fn create(app: &App, args: &str) -> error::Result<Reply> {
    let (location, form) = match command::create_args(args) {
        Ok(parsed) => parsed,
        Err(usage) => return Ok(Reply::usage(usage)),
    };

    let stall = app.workflows.create(location, &form).await?;
    Ok(Reply::Card(format::created(&stall)))
}

async fn view(app: &App, caller: Caller, args: &str) -> error::Result<Reply> {
    let (location, number) = match command::view_args(args) {
        Ok(parsed) => parsed,
        Err(usage) => return Ok(Reply::usage(usage)),
    };

    Ok(match app.workflows.lookup(location, &number).await? {
        KeyStep::Resolved(key) => Reply::Card(format::record(&app.workflows.view(&key).await?)),
        KeyStep::ChooseStreet(prompt) => {
            app.street_choice(caller, location, prompt, PendingAction::View)
        }
    })
}

async fn edit(app: &App, caller: Caller, args: &str) -> error::Result<Reply> {
    let (location, number, changes) = match command::edit_args(args) {
        Ok(parsed) => parsed,
        Err(usage) => return Ok(Reply::usage(usage)),
    };

    Ok(
        match app
            .workflows
            .prepare_edit(&caller, location, &number, &changes)
            .await?
        {
            EditStep::Ready(key, changes) => {
                edited(app.workflows.edit(&caller, &key, &changes).await?)
            }
            EditStep::ChooseStreet(prompt, changes) => {
                app.street_choice(caller, location, prompt, PendingAction::Edit(changes))
            }
        },
    )
}

fn edited(outcome: EditOutcome) -> Reply {
    Reply::Card(match outcome {
        EditOutcome::NoChanges => format::no_changes(),
        EditOutcome::Updated { stall, changed } => format::updated(&stall, &changed),
    })
}

async fn review(app: &App, caller: Caller, args: &str) -> error::Result<Reply> {
    let request = match command::review_args(args) {
        Ok(request) => request,
        Err(usage) => return Ok(Reply::usage(usage)),
    };

    let card = match request {
        ReviewRequest::Show { number, street } => {
            match app.workflows.review_status(&caller, &number, &street).await? {
                ReviewStatus::Existing(review) => format::existing_review(&review),
                ReviewStatus::Missing(key) => format::review_invitation(&key),
            }
        }
        ReviewRequest::Submit(form) => {
            let stored = app.workflows.review(&caller, &form).await?;
            format::review(&stored.review, stored.updated)
        }
    };
    Ok(Reply::Card(card))
}

fn maintenance(app: &App, caller: &Caller) -> Reply {
    if !app.workflows.access().is_admin(caller) {
        return Reply::Card(format::notice("❌ Not Authorized", strings::NOT_ADMIN));
    }

    Reply::Card(format::notice(
        strings::MAINTENANCE_TITLE,
        format!(
            "Uptime: {}\nPending street selections: {}",
            format::uptime(app.started.elapsed()),
            app.sessions.len()
        ),
    ))
}

async fn street_choice_handler(
    bot: Bot,
    query: CallbackQuery,
    app: Arc<App>,
) -> Result<(), BotError> {
    let choice = query.data.as_deref().and_then(session::decode_choice);
    let (token, street) = match (choice, &query.message) {
        (Some(choice), Some(_)) => choice,
        _ => {
            warn!("Unrecognized callback query data {:?}", query.data);
            bot.answer_callback_query(query.id).await?;
            return Ok(());
        }
    };

    let reply = match app.sessions.take(token, query.from.id.0 as i64) {
        Ok(pending) => {
            bot.answer_callback_query(query.id).await?;
            resolve_choice(&app, pending, street)
                .await
                .unwrap_or_else(|err| Reply::failure(&err))
        }
        // leave the buttons for the person they belong to
        Err(err @ SessionError::NotOwner) => {
            bot.answer_callback_query(query.id)
                .text(err.to_string())
                .show_alert(true)
                .await?;
            return Ok(());
        }
        Err(err @ SessionError::Expired) => {
            bot.answer_callback_query(query.id).await?;
            Reply::Card(format::notice("Selection Unavailable", err.to_string()))
        }
    };

    // the buttons are replaced by the outcome
    if let Some(message) = query.message {
        bot.edit_message_text(message.chat.id, message.id, reply.text())
            .parse_mode(ParseMode::Html)
            .await?;
    }

    Ok(())
}

async fn resolve_choice(app: &App, pending: Pending, street: Street) -> error::Result<Reply> {
    let key = pending.prompt.choose(street)?;

    Ok(match pending.action {
        PendingAction::View => Reply::Card(format::record(&app.workflows.view(&key).await?)),
        PendingAction::Edit(changes) => {
            edited(app.workflows.edit(&pending.caller, &key, &changes).await?)
        }
    })
}

async fn send_reply(bot: &Bot, message: &Message, reply: Reply) -> Result<(), BotError> {
    let mut request = bot
        .send_message(message.chat.id, reply.text())
        .reply_to_message_id(message.id);
    match reply {
        Reply::Card(_) => request = request.parse_mode(ParseMode::Html),
        Reply::Choice(_, keyboard) => {
            request = request.parse_mode(ParseMode::Html).reply_markup(keyboard)
        }
        Reply::Text(_) => {}
    }
    request.await?;
    Ok(())
}

#[derive(Debug, Error)]
enum BotError {
    /// Problem originated from the Telegram bot library
    #[error(transparent)]
    Request(#[from] teloxide::RequestError),

    /// Missing or malformed environment settings
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Problem preparing the database at startup
    #[error(transparent)]
    Store(#[from] error::Error),
}
