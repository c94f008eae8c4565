use teloxide::prelude::*;

use crate::api::models::User;
use crate::handlers::{report_failure, require_doctor};
use crate::session::Sessions;
use crate::state::patients::{paginate, search_patients, Page, PAGE_SIZE};
use crate::Error;

/// Splits `/patients` arguments into a page number and a search query.
///
/// A leading number is the page; everything else is the query.
pub fn parse_roster_args(arg: &str) -> (usize, String) {
    let arg = arg.trim();
    match arg.split_once(char::is_whitespace) {
        Some((first, rest)) => match first.parse::<usize>() {
            Ok(page) => (page, rest.trim().to_string()),
            Err(_) => (1, arg.to_string()),
        },
        None => match arg.parse::<usize>() {
            Ok(page) => (page, String::new()),
            Err(_) => (1, arg.to_string()),
        },
    }
}

pub fn format_roster(page: &Page<'_, User>) -> String {
    if page.total_items == 0 {
        return "No patients found.".to_string();
    }
    if page.items.is_empty() {
        return format!("Page {} is out of range (1-{}).", page.page, page.total_pages);
    }

    let lines = page
        .items
        .iter()
        .map(|patient| {
            let mut line = format!("👤 {} · {}", patient.full_name(), patient.email);
            if let Some(phone) = &patient.phone {
                line.push_str(&format!(" · {}", phone));
            }
            line.push_str(&format!("\n   ID: {}", patient.id));
            line
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\nPage {}/{} · {} patients",
        lines, page.page, page.total_pages, page.total_items
    )
}

/// `/patients [page] [search]`, doctors only.
pub async fn list_patients(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let Some((client, _)) = require_doctor(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    let (page, query) = parse_roster_args(&arg);
    log::info!("Listing patients page {} query {:?}", page, query);

    match client.patients().doctor_patients().await {
        Ok(roster) => {
            let matches = search_patients(&roster, &query);
            let page = paginate(&matches, page, PAGE_SIZE);
            bot.send_message(msg.chat.id, format_roster(&page)).await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}
