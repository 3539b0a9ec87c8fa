use teloxide::prelude::*;

use crate::config::CONFIG;

pub const UNAUTHORIZED_MESSAGE: &str = "🚫 You are not authorized to use this bot.";

fn is_listed(allow_list: &[i64], user_id: i64) -> bool {
    allow_list.is_empty() || allow_list.contains(&user_id)
}

/// Allow-list check against the configured user ids. An empty list leaves
/// the bot open, which is the development default.
pub fn is_user_allowed(user_id: i64) -> bool {
    is_listed(&CONFIG.allowed_user_ids, user_id)
}

/// Gate applied before any command or text handler does real work. Replies
/// with the refusal message when the sender is not allowed.
pub async fn check_access(bot: &Bot, message: &Message) -> bool {
    let user_id = message
        .from()
        .and_then(|user| i64::try_from(user.id.0).ok())
        .unwrap_or_default();

    if is_user_allowed(user_id) {
        return true;
    }

    let _ = bot
        .send_message(message.chat.id, UNAUTHORIZED_MESSAGE)
        .await;
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_allows_everyone() {
        assert!(is_listed(&[], 42));
        assert!(is_listed(&[], 0));
    }

    #[test]
    fn non_empty_list_only_allows_members() {
        let list = [1001, 1002];
        assert!(is_listed(&list, 1001));
        assert!(is_listed(&list, 1002));
        assert!(!is_listed(&list, 1003));
        assert!(!is_listed(&list, 0));
    }
}
