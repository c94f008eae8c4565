use std::sync::Arc;

use dotenvy::dotenv;
use dptree::case;
use envconfig::Envconfig;
use phf::phf_map;
use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        Dispatcher, UpdateFilterExt,
    },
    prelude::*,
    types::ReplyMarkup,
    utils::command::BotCommands,
};

use crate::api::ApiClient;
use crate::db::sessions::SqliteSessionStore;
use crate::handlers::{
    appointments, auth, current_user, doctors, patients, prescriptions, records, symptoms,
};
use crate::session::Sessions;
use crate::state::otp::ResendCooldown;

pub mod api;
pub mod db;
pub mod handlers;
pub mod services;
pub mod session;
pub mod state;
pub mod utils;

type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "TELEGRAM_BOT_TOKEN")]
    telegram_bot_token: String,

    #[envconfig(from = "DATABASE_URL", default = "sqlite://carelink.db")]
    database_url: String,

    #[envconfig(from = "API_BASE_URL", default = "http://localhost:5000/api")]
    api_base_url: String,

    #[envconfig(from = "REQUEST_TIMEOUT_SECS", default = "30")]
    request_timeout_secs: u64,

    #[envconfig(from = "REMINDER_SCHEDULE", default = "0 0 8 * * *")]
    reminder_schedule: String,

    #[envconfig(from = "PRESCRIPTION_EXPIRY_WINDOW_DAYS", default = "3")]
    prescription_expiry_window_days: i64,
}

#[derive(BotCommands, Debug, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
enum Command {
    #[command(description = "Start interacting with the bot.")]
    Start,
    #[command(description = "Display help information about available commands.")]
    Help,
    #[command(description = "Display the main menu.")]
    Menu,
    #[command(description = "Sign in with your email and password.")]
    Login,
    #[command(description = "Sign out.")]
    Logout,
    #[command(description = "Show your profile.")]
    Profile,
    #[command(description = "Reset a forgotten password.")]
    Forgot,
    #[command(description = "Send a new password reset code.")]
    Resend,
    #[command(description = "List appointments: /appointments [upcoming|past|all]")]
    Appointments(String),
    #[command(description = "Cancel an appointment: /cancel <id> [reason]")]
    Cancel(String),
    #[command(description = "Update an appointment (doctors): /status <id> <status>")]
    Status(String),
    #[command(description = "Appointment overview (doctors).")]
    Stats,
    #[command(description = "Find doctors: /doctors [specialization]")]
    Doctors(String),
    #[command(description = "Show your doctor profile (doctors).")]
    DoctorProfile,
    #[command(description = "List your prescriptions.")]
    Prescriptions,
    #[command(description = "Show a medical record: /record [patient id]")]
    Record(String),
    #[command(description = "Record vital signs: /vitals bp=120/80 hr=72 weight=70 height=175")]
    Vitals(String),
    #[command(description = "Remove a record entry: /remove <section> <number> [patient id]")]
    Remove(String),
    #[command(description = "Compute BMI: /bmi <weight kg> <height cm>")]
    Bmi(String),
    #[command(description = "List your patients (doctors): /patients [page] [search]")]
    Patients(String),
    #[command(description = "Check symptoms: /symptoms fever, cough")]
    Symptoms(String),
}

#[derive(Clone, PartialEq, Debug, Default)]
pub enum State {
    #[default]
    Start,
    LoginEmail,
    LoginPassword {
        email: String,
    },
    ResetEmail,
    ResetCode {
        email: String,
        cooldown: ResendCooldown,
    },
    ResetPassword {
        email: String,
        otp: String,
    },
}

pub type MyDialogue = Dialogue<State, InMemStorage<State>>;

#[derive(Clone, Copy, Debug, PartialEq)]
enum MenuAction {
    Appointments,
    Stats,
    Patients,
    Prescriptions,
    Record,
    Doctors,
    Profile,
    Help,
}

/// Reply-keyboard labels, as sent back by Telegram when a button is tapped.
static MENU_ACTIONS: phf::Map<&'static str, MenuAction> = phf_map! {
    "📅 Appointments" => MenuAction::Appointments,
    "📊 Stats" => MenuAction::Stats,
    "👥 Patients" => MenuAction::Patients,
    "💊 Prescriptions" => MenuAction::Prescriptions,
    "📋 Medical Record" => MenuAction::Record,
    "🩺 Doctors" => MenuAction::Doctors,
    "👤 Profile" => MenuAction::Profile,
    "❓ Help" => MenuAction::Help,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize the logger with default settings or "info" level if not specified
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting the CareLink bot...");

    // Load environment variables from a .env file if present
    dotenv().ok();

    let config = Config::init_from_env()?;

    let pool = db::init_db(&config.database_url).await?;
    let store = Arc::new(SqliteSessionStore::new(pool));
    let client = ApiClient::new(&config.api_base_url, config.request_timeout_secs)?;
    let sessions = Sessions::new(client.clone(), store.clone());

    let bot = Bot::new(config.telegram_bot_token);

    if let Err(e) = services::schedule_reminders(
        store,
        client,
        bot.clone(),
        &config.reminder_schedule,
        chrono::Duration::days(config.prescription_expiry_window_days),
    )
    .await
    {
        log::error!("Reminders disabled: {}", e);
    }

    let handler = dialogue::enter::<Update, InMemStorage<State>, State, _>()
        // Commands always win, whatever step a dialogue is at
        .branch(
            Update::filter_message()
                .branch(dptree::entry().filter_command::<Command>().endpoint(answer)),
        )
        .branch(
            Update::filter_message()
                .branch(case![State::LoginEmail].endpoint(auth::receive_login_email))
                .branch(case![State::LoginPassword { email }].endpoint(auth::receive_login_password))
                .branch(case![State::ResetEmail].endpoint(auth::receive_reset_email))
                .branch(case![State::ResetCode { email, cooldown }].endpoint(auth::receive_reset_code))
                .branch(case![State::ResetPassword { email, otp }].endpoint(auth::receive_new_password)),
        )
        .branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![sessions, InMemStorage::<State>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Shutting down gracefully");
    Ok(())
}

/// Handles bot commands and routes them to the matching handler.
///
/// # Arguments
///
/// * `bot` - The Telegram Bot instance used to send messages.
/// * `msg` - The received message containing the command.
/// * `cmd` - The parsed command enum.
/// * `dialogue` - The dialogue state for multi-step flows.
/// * `sessions` - Per-chat authentication sessions.
async fn answer(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: MyDialogue,
    sessions: Sessions,
) -> Result<(), Error> {
    log::info!("Received command {:?}", cmd);

    match cmd {
        Command::Start | Command::Menu => show_menu(bot, msg, sessions).await?,
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Login => auth::start_login(bot, msg, dialogue).await?,
        Command::Logout => {
            dialogue.exit().await?;
            auth::logout(bot, msg, sessions).await?
        }
        Command::Profile => auth::show_profile(bot, msg, sessions).await?,
        Command::Forgot => auth::start_reset(bot, msg, dialogue).await?,
        Command::Resend => auth::resend_code(bot, msg, dialogue, sessions).await?,
        Command::Appointments(arg) => {
            appointments::list_appointments(bot, msg, sessions, arg).await?
        }
        Command::Cancel(arg) => appointments::cancel_appointment(bot, msg, sessions, arg).await?,
        Command::Status(arg) => appointments::update_status(bot, msg, sessions, arg).await?,
        Command::Stats => appointments::show_stats(bot, msg, sessions).await?,
        Command::Doctors(arg) => doctors::list_doctors(bot, msg, sessions, arg).await?,
        Command::DoctorProfile => doctors::show_doctor_profile(bot, msg, sessions).await?,
        Command::Prescriptions => prescriptions::list_prescriptions(bot, msg, sessions).await?,
        Command::Record(arg) => records::show_record(bot, msg, sessions, arg).await?,
        Command::Vitals(arg) => records::record_vitals(bot, msg, sessions, arg).await?,
        Command::Remove(arg) => records::remove_record_entry(bot, msg, sessions, arg).await?,
        Command::Bmi(arg) => records::compute_bmi(bot, msg, arg).await?,
        Command::Patients(arg) => patients::list_patients(bot, msg, sessions, arg).await?,
        Command::Symptoms(arg) => symptoms::assess_symptoms(bot, msg, sessions, arg).await?,
    };

    Ok(())
}

/// Shows the role-specific menu, or asks the chat to sign in.
async fn show_menu(bot: Bot, msg: Message, sessions: Sessions) -> Result<(), Error> {
    match current_user(&sessions, msg.chat.id).await {
        Some((_, user)) => {
            bot.send_message(
                msg.chat.id,
                format!("Hello {}, please choose an option:", user.full_name()),
            )
            .reply_markup(ReplyMarkup::Keyboard(auth::menu_for(user.role)))
            .await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                "Welcome to CareLink! Sign in with /login, or type /help for all commands.",
            )
            .await?;
        }
    }
    Ok(())
}

/// Handles plain messages, i.e. taps on the reply-keyboard menu.
async fn handle_message(bot: Bot, msg: Message, sessions: Sessions) -> Result<(), Error> {
    let Some(action) = msg.text().and_then(|text| MENU_ACTIONS.get(text)).copied() else {
        bot.send_message(
            msg.chat.id,
            "I don't understand that. Please use the menu or type /help for available commands.",
        )
        .await?;
        return Ok(());
    };

    match action {
        MenuAction::Appointments => {
            appointments::list_appointments(bot, msg, sessions, "upcoming".to_string()).await?
        }
        MenuAction::Stats => appointments::show_stats(bot, msg, sessions).await?,
        MenuAction::Patients => patients::list_patients(bot, msg, sessions, String::new()).await?,
        MenuAction::Prescriptions => prescriptions::list_prescriptions(bot, msg, sessions).await?,
        MenuAction::Record => records::show_record(bot, msg, sessions, String::new()).await?,
        MenuAction::Doctors => doctors::list_doctors(bot, msg, sessions, String::new()).await?,
        MenuAction::Profile => auth::show_profile(bot, msg, sessions).await?,
        MenuAction::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_menu_button_is_routed() {
        use crate::api::models::Role;

        for role in [Role::Patient, Role::Doctor] {
            let menu = auth::menu_for(role);
            for row in &menu.keyboard {
                for button in row {
                    assert!(
                        MENU_ACTIONS.contains_key(button.text.as_str()),
                        "unrouted button {}",
                        button.text
                    );
                }
            }
        }
    }

    #[test]
    fn commands_parse_arguments() {
        let cmd = Command::parse("/appointments past", "carelink_bot").unwrap();
        assert!(matches!(cmd, Command::Appointments(arg) if arg == "past"));

        let cmd = Command::parse("/appointments", "carelink_bot").unwrap();
        assert!(matches!(cmd, Command::Appointments(arg) if arg.is_empty()));
    }
}
