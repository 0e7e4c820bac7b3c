use std::collections::HashMap;

/// Raw Torznab/Jackett category code (lower-cased, separators removed) to
/// the display category used in the spreadsheet.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    ("audioaudiobook", "Audiobooks"),
    ("audioforeign", "Audio"),
    ("audiolossless", "Audio"),
    ("audiomp3", "Audio"),
    ("audioother", "Audio"),
    ("audiovideo", "Audio"),
    ("bookscomics", "Comics"),
    ("booksebook", "Books"),
    ("booksforeign", "Books"),
    ("booksmagazines", "Magazines"),
    ("booksmags", "Magazines"),
    ("booksother", "Books"),
    ("bookstechnical", "Books"),
    ("console3ds", "Console"),
    ("consolends", "Console"),
    ("consoleother", "Console"),
    ("consoleps3", "Console"),
    ("consoleps4", "Console"),
    ("consolepsp", "Console"),
    ("consolepsvita", "Console"),
    ("consolewii", "Console"),
    ("consolewiiu", "Console"),
    ("consolewiiwarevc", "Console"),
    ("consolexbox", "Console"),
    ("consolexbox360", "Console"),
    ("consolexbox360dlc", "Console"),
    ("consolexboxone", "Console"),
    ("movies3d", "Movies"),
    ("moviesbluray", "Movies"),
    ("moviesdvd", "Movies"),
    ("moviesforeign", "Movies"),
    ("movieshd", "Movies"),
    ("moviesother", "Movies"),
    ("moviessd", "Movies"),
    ("moviesuhd", "Movies"),
    ("movieswebdl", "Movies"),
    ("other", "General"),
    ("otherhashed", "General"),
    ("othermisc", "General"),
    ("pc0day", "PC"),
    ("pcgames", "Games"),
    ("pciso", "PC"),
    ("pcmac", "Mac Software"),
    ("pcmobileandroid", "Android"),
    ("pcmobileios", "iOS"),
    ("pcmobileother", "Phone"),
    ("pcphoneandroid", "Android"),
    ("pcphoneios", "iOS"),
    ("pcphoneother", "Phone"),
    ("tvanime", "Anime"),
    ("tvdocumentary", "TV"),
    ("tvforeign", "TV"),
    ("tvhd", "TV"),
    ("tvother", "TV"),
    ("tvsd", "TV"),
    ("tvsport", "Sports"),
    ("tvuhd", "TV"),
    ("tvwebdl", "TV"),
    ("xxxdvd", "XXX"),
    ("xxximageset", "XXX"),
    ("xxxother", "XXX"),
    ("xxxpack", "XXX"),
    ("xxxpacks", "XXX"),
    ("xxxsd", "XXX"),
    ("xxxuhd", "XXX"),
    ("xxxwmv", "XXX"),
    ("xxxx264", "XXX"),
    ("xxxxvid", "XXX"),
];

#[derive(Debug, Clone)]
pub struct CategoryTaxonomy {
    mappings: HashMap<String, String>,
}

impl CategoryTaxonomy {
    pub fn new<I, K, V>(mappings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            mappings: mappings
                .into_iter()
                .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Case-insensitive lookup; unmapped codes come back trimmed but otherwise unchanged.
    pub fn canonicalize(&self, raw: &str) -> String {
        let raw = raw.trim();
        self.mappings
            .get(&raw.to_lowercase())
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }
}

impl Default for CategoryTaxonomy {
    fn default() -> Self {
        Self::new(DEFAULT_MAPPINGS.iter().copied())
    }
}

/// Appends `value` unless already present, keeping first-seen order.
pub(crate) fn push_unique(values: &mut Vec<String>, value: String) {
    if !value.is_empty() && !values.contains(&value) {
        values.push(value);
    }
}
