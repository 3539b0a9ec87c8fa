use crate::anilist::AnimeInfo;

/// The three post layouts a channel admin can pick after a quality choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFormat {
    Otaku,
    Hanime,
    Ongoing,
}

impl PostFormat {
    pub fn from_callback(data: &str) -> Option<Self> {
        match data {
            "otaku" => Some(PostFormat::Otaku),
            "hanime" => Some(PostFormat::Hanime),
            "ongoing" => Some(PostFormat::Ongoing),
            _ => None,
        }
    }

    pub fn callback_data(&self) -> &'static str {
        match self {
            PostFormat::Otaku => "otaku",
            PostFormat::Hanime => "hanime",
            PostFormat::Ongoing => "ongoing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostFormat::Otaku => "Otaku",
            PostFormat::Hanime => "Hanime",
            PostFormat::Ongoing => "Ongoing",
        }
    }
}

fn episodes_text(info: &AnimeInfo) -> String {
    info.episodes
        .map(|count| count.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn genre_tags(info: &AnimeInfo) -> String {
    info.genres
        .iter()
        .map(|genre| format!("#{genre}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the HTML caption for a formatted post. The literal layouts are
/// the ones the channels expect verbatim.
pub fn render_caption(format: PostFormat, info: &AnimeInfo, quality: &str) -> String {
    let title = info.display_title();
    let episodes = episodes_text(info);
    let genres = info.genres.join(", ");

    match format {
        PostFormat::Hanime => format!(
            "<b>💦 {title}\n\
             ╭──────────────────────\n\
             ├ 📺 Episode : {episodes}\n\
             ├ 💾 Quality : {quality}\n\
             ├ 🎭 Genres: {genres}\n\
             ├ 🔊 Audio track : Sub\n\
             ├ #Censored\n\
             ├ #Recommendation +++++++\n\
             ╰──────────────────────</b>"
        ),
        PostFormat::Otaku => format!(
            "<b>💙 {title}</b>\n\
             \n\
             <b>🎭 Genres :</b> {genres}\n\
             <b>🔊 Audio :</b> Dual Audio\n\
             <b>📡 Status :</b> Completed\n\
             <b>🗓 Episodes :</b> {episodes}\n\
             <b>💾 Quality :</b> {quality}\n\
             <b>✂️ Sizes :</b> 50MB, 120MB & 300MB\n\
             <b>🔞 Rating :</b> PG-13\n\
             \n\
             <blockquote>📌 : {tags}</blockquote>",
            tags = genre_tags(info)
        ),
        PostFormat::Ongoing => format!(
            "❤️  {title}\n\
             ╭───────────────────\n\
             ├ 📺 Episodes : {episodes}\n\
             ├ 💾 Quality : {quality}\n\
             ├ 🎭 Genres: {genres}\n\
             ├ 🔊 Audio track : Dual [English+Japanese]\n\
             ╰───────────────────\n\
             Report Missing Episodes: @Otaku_Library_Support_Bot"
        ),
    }
}
