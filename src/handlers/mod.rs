use teloxide::prelude::*;

use crate::api::models::{Role, User};
use crate::api::ApiClient;
use crate::session::Sessions;
use crate::utils::{chunk_message, MESSAGE_LIMIT};

pub mod appointments;
pub mod auth;
pub mod doctors;
pub mod patients;
pub mod prescriptions;
pub mod records;
pub mod symptoms;

pub fn session_key(chat_id: ChatId) -> String {
    chat_id.0.to_string()
}

/// The chat's signed-in user and an authenticated client, or `None`.
pub async fn current_user(sessions: &Sessions, chat_id: ChatId) -> Option<(ApiClient, User)> {
    let session = sessions.get(&session_key(chat_id)).await;
    let session = session.lock().await;
    session
        .user()
        .cloned()
        .map(|user| (session.client().clone(), user))
}

/// Like [`current_user`], but tells the chat to sign in when nobody is.
pub async fn require_user(
    bot: &Bot,
    sessions: &Sessions,
    chat_id: ChatId,
) -> Result<Option<(ApiClient, User)>, crate::Error> {
    let current = current_user(sessions, chat_id).await;
    if current.is_none() {
        bot.send_message(chat_id, "Please sign in first with /login.")
            .await?;
    }
    Ok(current)
}

/// Same as [`require_user`], restricted to doctors.
pub async fn require_doctor(
    bot: &Bot,
    sessions: &Sessions,
    chat_id: ChatId,
) -> Result<Option<(ApiClient, User)>, crate::Error> {
    match require_user(bot, sessions, chat_id).await? {
        Some((client, user)) if user.role == Role::Doctor => Ok(Some((client, user))),
        Some(_) => {
            bot.send_message(chat_id, "This command is only available to doctors.")
                .await?;
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Sends `text`, spread over several messages when it is too long for one.
pub async fn send_chunked(bot: &Bot, chat_id: ChatId, text: &str) -> ResponseResult<()> {
    for chunk in chunk_message(text, MESSAGE_LIMIT) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

pub fn failure_text(err: impl std::fmt::Display) -> String {
    format!("❌ {}", err)
}

/// Shows a failed call to the user, the way the app shows an alert.
pub async fn report_failure(
    bot: &Bot,
    chat_id: ChatId,
    err: &(dyn std::error::Error + Send + Sync),
) -> ResponseResult<()> {
    log::warn!("Request for chat {} failed: {}", chat_id.0, err);
    bot.send_message(chat_id, failure_text(err)).await?;
    Ok(())
}
