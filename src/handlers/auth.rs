use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, ReplyMarkup};

use crate::api::models::{ResetPasswordRequest, Role, User};
use crate::handlers::{report_failure, require_user, session_key};
use crate::session::Sessions;
use crate::state::otp::ResendCooldown;
use crate::{Error, MyDialogue, State};

/// Main menu for the user's role, the bot's equivalent of routing after sign-in.
pub fn menu_for(role: Role) -> KeyboardMarkup {
    let rows = match role {
        Role::Doctor => vec![
            vec![KeyboardButton::new("📅 Appointments"), KeyboardButton::new("📊 Stats")],
            vec![KeyboardButton::new("👥 Patients"), KeyboardButton::new("👤 Profile")],
            vec![KeyboardButton::new("❓ Help")],
        ],
        _ => vec![
            vec![KeyboardButton::new("📅 Appointments"), KeyboardButton::new("💊 Prescriptions")],
            vec![KeyboardButton::new("📋 Medical Record"), KeyboardButton::new("🩺 Doctors")],
            vec![KeyboardButton::new("👤 Profile"), KeyboardButton::new("❓ Help")],
        ],
    };
    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn describe_profile(user: &User) -> String {
    let mut lines = vec![
        format!("👤 {}", user.full_name()),
        format!("Email: {}", user.email),
        format!("Role: {:?}", user.role),
    ];
    if let Some(phone) = &user.phone {
        lines.push(format!("Phone: {}", phone));
    }
    if let Some(gender) = &user.gender {
        lines.push(format!("Gender: {}", gender));
    }
    if let Some(blood_group) = &user.blood_group {
        lines.push(format!("Blood group: {}", blood_group));
    }
    if let Some(contact) = &user.emergency_contact {
        lines.push(format!(
            "Emergency contact: {} ({})",
            contact.name, contact.phone
        ));
    }
    lines.join("\n")
}

pub async fn start_login(bot: Bot, msg: Message, dialogue: MyDialogue) -> Result<(), Error> {
    bot.send_message(msg.chat.id, "Enter your email address:")
        .await?;
    dialogue.update(State::LoginEmail).await?;
    Ok(())
}

pub async fn receive_login_email(
    bot: Bot,
    msg: Message,
    dialogue: MyDialogue,
) -> Result<(), Error> {
    match msg.text().map(str::trim) {
        Some(email) if email.contains('@') => {
            bot.send_message(msg.chat.id, "Now enter your password:")
                .await?;
            dialogue
                .update(State::LoginPassword {
                    email: email.to_string(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "That doesn't look like an email address.")
                .await?;
        }
    }
    Ok(())
}

/// Completes the login dialogue.
///
/// The password message is deleted from the chat whatever the outcome. On failure
/// the session is left exactly as it was and the dialogue ends.
pub async fn receive_login_password(
    bot: Bot,
    email: String,
    msg: Message,
    dialogue: MyDialogue,
    sessions: Sessions,
) -> Result<(), Error> {
    let Some(password) = msg.text().map(str::to_string) else {
        bot.send_message(msg.chat.id, "Please send your password as text.")
            .await?;
        return Ok(());
    };

    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        log::debug!("Could not delete password message: {}", e);
    }

    let session = sessions.get(&session_key(msg.chat.id)).await;
    let result = session.lock().await.login(&email, &password).await;
    dialogue.exit().await?;

    match result {
        Ok(user) => {
            bot.send_message(
                msg.chat.id,
                format!("Welcome back, {}!", user.full_name()),
            )
            .reply_markup(ReplyMarkup::Keyboard(menu_for(user.role)))
            .await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

pub async fn logout(bot: Bot, msg: Message, sessions: Sessions) -> Result<(), Error> {
    let session = sessions.get(&session_key(msg.chat.id)).await;
    let result = session.lock().await.logout().await;
    match result {
        Ok(()) => {
            bot.send_message(msg.chat.id, "You have been signed out.")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

pub async fn show_profile(bot: Bot, msg: Message, sessions: Sessions) -> Result<(), Error> {
    let Some((_, user)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };
    bot.send_message(msg.chat.id, describe_profile(&user))
        .await?;
    Ok(())
}

pub async fn start_reset(bot: Bot, msg: Message, dialogue: MyDialogue) -> Result<(), Error> {
    bot.send_message(
        msg.chat.id,
        "Enter the email address of the account to reset:",
    )
    .await?;
    dialogue.update(State::ResetEmail).await?;
    Ok(())
}

pub async fn receive_reset_email(
    bot: Bot,
    msg: Message,
    dialogue: MyDialogue,
    sessions: Sessions,
) -> Result<(), Error> {
    let Some(email) = msg.text().map(|t| t.trim().to_string()) else {
        return Ok(());
    };

    let session = sessions.get(&session_key(msg.chat.id)).await;
    let result = session.lock().await.forgot_password(&email).await;

    match result {
        Ok(message) => {
            let mut cooldown = ResendCooldown::default();
            cooldown.start(Utc::now());
            bot.send_message(
                msg.chat.id,
                message.unwrap_or_else(|| "A reset code has been sent to your email.".into())
                    + "\nEnter the code (or /resend to get a new one):",
            )
            .await?;
            dialogue
                .update(State::ResetCode { email, cooldown })
                .await?;
        }
        Err(e) => {
            report_failure(&bot, msg.chat.id, &e).await?;
            dialogue.exit().await?;
        }
    }
    Ok(())
}

pub async fn receive_reset_code(
    bot: Bot,
    (email, _cooldown): (String, ResendCooldown),
    msg: Message,
    dialogue: MyDialogue,
    sessions: Sessions,
) -> Result<(), Error> {
    let Some(otp) = msg.text().map(|t| t.trim().to_string()) else {
        return Ok(());
    };

    let session = sessions.get(&session_key(msg.chat.id)).await;
    let result = session.lock().await.verify_reset_otp(&email, &otp).await;

    match result {
        Ok(_) => {
            bot.send_message(msg.chat.id, "Code accepted. Choose a new password:")
                .await?;
            dialogue
                .update(State::ResetPassword { email, otp })
                .await?;
        }
        // Stay in this step so the user can retry or /resend.
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

pub async fn receive_new_password(
    bot: Bot,
    (email, otp): (String, String),
    msg: Message,
    dialogue: MyDialogue,
    sessions: Sessions,
) -> Result<(), Error> {
    let Some(new_password) = msg.text().map(str::to_string) else {
        return Ok(());
    };
    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        log::debug!("Could not delete password message: {}", e);
    }

    let request = ResetPasswordRequest {
        email,
        otp,
        new_password,
    };
    let session = sessions.get(&session_key(msg.chat.id)).await;
    let result = session.lock().await.reset_password(&request).await;
    dialogue.exit().await?;

    match result {
        Ok(user) => {
            bot.send_message(msg.chat.id, "Password updated, you are now signed in.")
                .reply_markup(ReplyMarkup::Keyboard(menu_for(user.role)))
                .await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

/// Re-sends the reset code, at most once per cooldown period.
pub async fn resend_code(
    bot: Bot,
    msg: Message,
    dialogue: MyDialogue,
    sessions: Sessions,
) -> Result<(), Error> {
    let Some(State::ResetCode {
        email,
        mut cooldown,
    }) = dialogue.get().await?
    else {
        bot.send_message(msg.chat.id, "Start a password reset first with /forgot.")
            .await?;
        return Ok(());
    };

    let now = Utc::now();
    if !cooldown.can_resend(now) {
        bot.send_message(
            msg.chat.id,
            format!(
                "Please wait {} seconds before requesting a new code.",
                cooldown.remaining(now)
            ),
        )
        .await?;
        return Ok(());
    }

    let session = sessions.get(&session_key(msg.chat.id)).await;
    let result = session.lock().await.resend_reset_otp(&email).await;

    match result {
        Ok(message) => {
            cooldown.start(now);
            dialogue
                .update(State::ResetCode { email, cooldown })
                .await?;
            bot.send_message(
                msg.chat.id,
                message.unwrap_or_else(|| "A new code has been sent.".into()),
            )
            .await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}
