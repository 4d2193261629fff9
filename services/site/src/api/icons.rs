//! Menu icon identifiers.
//!
//! Menu rows carry free-form icon names; the payload only ever exposes icons
//! from this closed set. Unknown names are dropped, not passed through.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IconId {
    Home,
    Book,
    Pen,
    User,
    Users,
    Settings,
    Shield,
    Chart,
    Code,
    Folder,
    Link,
    ExternalLink,
    Github,
    Rss,
    Mail,
    Star,
}

const ICON_TABLE: &[(&str, IconId)] = &[
    ("home", IconId::Home),
    ("book", IconId::Book),
    ("book-open", IconId::Book),
    ("pen", IconId::Pen),
    ("pencil", IconId::Pen),
    ("user", IconId::User),
    ("users", IconId::Users),
    ("settings", IconId::Settings),
    ("cog", IconId::Settings),
    ("shield", IconId::Shield),
    ("chart", IconId::Chart),
    ("bar-chart", IconId::Chart),
    ("code", IconId::Code),
    ("folder", IconId::Folder),
    ("link", IconId::Link),
    ("external-link", IconId::ExternalLink),
    ("github", IconId::Github),
    ("rss", IconId::Rss),
    ("mail", IconId::Mail),
    ("star", IconId::Star),
];

impl IconId {
    /// Case-insensitive lookup; `_` and spaces are treated as `-`.
    pub fn lookup(name: &str) -> Option<Self> {
        let key: String = name
            .trim()
            .chars()
            .map(|ch| match ch {
                '_' | ' ' => '-',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        ICON_TABLE
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, icon)| *icon)
    }
}
