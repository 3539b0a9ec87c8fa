use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder replaced by the zero-padded episode label in name templates.
pub const EPISODE_PLACEHOLDER: &str = "{episode}";

static MESSAGE_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://t\.me/([A-Za-z0-9_]+)/([0-9]+)$").expect("valid message link regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct MessageLink {
    channel: String,
    message_id: u64,
}

fn parse_message_link(link: &str) -> Option<MessageLink> {
    let captures = MESSAGE_LINK_RE.captures(link)?;
    let channel = captures[1].to_string();
    let message_id = captures[2].parse::<u64>().ok()?;
    Some(MessageLink {
        channel,
        message_id,
    })
}

/// Expands a start/end channel link pair into one formatted line per message
/// id in the inclusive range.
///
/// The i-th line (1-based) carries a zero-padded two-digit episode label,
/// substituted for `{episode}` in `name_template`, or rendered as
/// `Episode NN` when the template is empty. Lines follow the exact shape
/// `https://t.me/<channel>/<id> -n <name> \n`; downstream batching splits
/// on that trailing newline, so the format is contractual.
///
/// Returns `None` when either link does not match the expected shape or the
/// start id is greater than the end id. The channel is taken from the start
/// link; the end link's channel is parsed but deliberately ignored.
pub fn expand_links(
    start_link: &str,
    end_link: &str,
    name_template: &str,
) -> Option<Vec<String>> {
    let start = parse_message_link(start_link)?;
    let end = parse_message_link(end_link)?;

    if start.message_id > end.message_id {
        return None;
    }

    let count = (end.message_id - start.message_id + 1) as usize;
    let mut lines = Vec::with_capacity(count);
    for (position, message_id) in (start.message_id..=end.message_id).enumerate() {
        let label = format!("{:02}", position + 1);
        let episode_name = if name_template.is_empty() {
            format!("Episode {label}")
        } else {
            name_template.replace(EPISODE_PLACEHOLDER, &label)
        };
        lines.push(format!(
            "https://t.me/{}/{} -n {} \n",
            start.channel, message_id, episode_name
        ));
    }

    Some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_a_range_with_templated_names() {
        let lines = expand_links(
            "https://t.me/mychan/100",
            "https://t.me/mychan/103",
            "Show {episode}",
        )
        .expect("valid links");

        assert_eq!(
            lines,
            vec![
                "https://t.me/mychan/100 -n Show 01 \n",
                "https://t.me/mychan/101 -n Show 02 \n",
                "https://t.me/mychan/102 -n Show 03 \n",
                "https://t.me/mychan/103 -n Show 04 \n",
            ]
        );
    }

    #[test]
    fn empty_template_falls_back_to_episode_labels() {
        let lines = expand_links("https://t.me/c_1/5", "https://t.me/c_1/6", "")
            .expect("valid links");
        assert_eq!(
            lines,
            vec![
                "https://t.me/c_1/5 -n Episode 01 \n",
                "https://t.me/c_1/6 -n Episode 02 \n",
            ]
        );
    }

    #[test]
    fn single_message_range_yields_one_line() {
        let lines =
            expand_links("https://t.me/chan/42", "https://t.me/chan/42", "").expect("valid links");
        assert_eq!(lines, vec!["https://t.me/chan/42 -n Episode 01 \n"]);
    }

    #[test]
    fn labels_stay_zero_padded_past_nine() {
        let lines = expand_links("https://t.me/chan/1", "https://t.me/chan/12", "")
            .expect("valid links");
        assert_eq!(lines.len(), 12);
        assert!(lines[8].ends_with("-n Episode 09 \n"));
        assert!(lines[9].ends_with("-n Episode 10 \n"));
    }

    #[test]
    fn template_without_placeholder_is_used_verbatim() {
        let lines = expand_links("https://t.me/chan/1", "https://t.me/chan/2", "My Show")
            .expect("valid links");
        assert_eq!(
            lines,
            vec![
                "https://t.me/chan/1 -n My Show \n",
                "https://t.me/chan/2 -n My Show \n",
            ]
        );
    }

    #[test]
    fn rejects_malformed_links() {
        let cases = [
            "http://t.me/chan/1",
            "https://t.me/chan",
            "https://t.me/chan/abc",
            "https://t.me/my-chan/1",
            "https://t.me/chan/1/extra",
            "https://example.com/chan/1",
            "",
        ];
        for bad in cases {
            assert!(
                expand_links(bad, "https://t.me/chan/5", "").is_none(),
                "accepted bad start link: {bad}"
            );
            assert!(
                expand_links("https://t.me/chan/5", bad, "").is_none(),
                "accepted bad end link: {bad}"
            );
        }
    }

    #[test]
    fn rejects_reversed_ranges() {
        assert!(expand_links("https://t.me/chan/10", "https://t.me/chan/9", "").is_none());
    }

    #[test]
    fn channel_comes_from_the_start_link() {
        let lines = expand_links("https://t.me/first/1", "https://t.me/second/2", "")
            .expect("valid links");
        assert!(lines.iter().all(|line| line.starts_with("https://t.me/first/")));
    }
}
