//! Tag → Genre Rules
//!
//! Maps free-text MusicBrainz tags onto the controlled genre vocabulary.
//! Rules are an ordered list of (regex, genre); the first matching rule
//! decides a tag's genre and unmatched tags are dropped silently.
//!
//! Tags are normalized before matching (separators folded to spaces) and
//! obvious non-style tags (years, moods, nationalities, chart markers) are
//! discarded so that e.g. "2004" or "british" never reach the rules.

use regex::Regex;
use review_common::config::{GenreRuleConfig, TomlConfig};
use review_common::{Error, Result};

/// Built-in rule table, most specific first
///
/// Order matters: "indie rock" must hit `indie_rock` before the plain
/// `rock` rule sees it.
const DEFAULT_RULES: &[(&str, &str)] = &[
    (r"\bpost[- ]?rock\b", "post_rock"),
    (r"\bpost[- ]?punk\b", "post_punk"),
    (r"\bpost[- ]?hardcore\b", "post_hardcore"),
    (r"\bshoegaze\b", "shoegaze"),
    (r"\bdream[- ]?pop\b", "dream_pop"),
    (r"\bsynth[- ]?pop\b|\belectro[- ]?pop\b", "synth_pop"),
    (r"\bindie[- ]?pop\b", "indie_pop"),
    (r"\bindie[- ]?folk\b", "indie_folk"),
    (r"\bindie\b", "indie_rock"),
    (r"\balternative\b|\balt[- ]rock\b", "alternative_rock"),
    (r"\bblack[- ]?metal\b", "black_metal"),
    (r"\bdeath[- ]?metal\b", "death_metal"),
    (r"\bmetal\b|\bmetalcore\b|\bdoom\b|\bsludge\b", "metal"),
    (r"\bemo\b", "emo"),
    (r"\bhardcore\b|\bpunk\b", "punk"),
    (r"\bgarage\b", "garage_rock"),
    (r"\bpsychedeli[ac]\b|\bpsych\b", "psychedelic"),
    (r"\bkraut[- ]?rock\b", "krautrock"),
    (r"\bprog(ressive)?\b", "progressive_rock"),
    (r"\bstoner\b|\bgrunge\b|\bhard rock\b", "hard_rock"),
    (r"\btrip[- ]?hop\b", "trip_hop"),
    (r"\bhip[- ]?hop\b|\brap\b|\btrap\b", "hip_hop"),
    (r"\br ?n? ?b\b|\brhythm blues\b|\bsoul\b|\bfunk\b", "soul_rnb"),
    (r"\btechno\b|\bhouse\b|\bedm\b|\bdubstep\b|\bdrum bass\b", "electronic_dance"),
    (r"\bambient\b|\bdrone\b", "ambient"),
    (r"\belectronic[a]?\b|\belectro\b|\bidm\b|\bsynth\b", "electronic"),
    (r"\bsinger[- ]?songwriter\b|\bfolk\b|\bamericana\b|\bacoustic\b", "folk"),
    (r"\bcountry\b|\balt[- ]?country\b", "country"),
    (r"\bblues\b", "blues"),
    (r"\bjazz\b", "jazz"),
    (r"\bclassical\b|\bcontemporary classical\b|\bneo[- ]?classical\b", "classical"),
    (r"\breggae\b|\bdub\b|\bska\b", "reggae"),
    (r"\bexperimental\b|\bavant[- ]?garde\b|\bnoise\b", "experimental"),
    (r"\bschlager\b|\bdeutsch[- ]?pop\b|\bchanson\b", "chanson"),
    (r"\bpop\b", "pop"),
    (r"\brock\b", "rock"),
];

/// Tag fragments that mark chart, shop or housekeeping tags
const NON_STYLE_KEYWORDS: &[&str] = &[
    "wochen",
    "charts",
    "plattentests.de",
    "q recommends",
    "ph_temp_checken",
    "pkg-jewel case",
    "cd extra",
    "drm",
    "self-titled",
    "concept album",
    "hidden track",
    "pregaptrack",
];

/// Whole tags that describe origin, mood or vocals rather than style
const NON_STYLE_TAGS: &[&str] = &[
    // origin / language
    "english", "deutsch", "german", "american", "usa", "sweden", "swedish", "france",
    "french", "français", "canada", "canadian", "canadien", "iceland", "british",
    "britannique", "scandinavia", "scandinave", "scandinavie",
    // mood
    "melancholic", "bittersweet", "dark", "dense", "energetic", "passionate", "anxious",
    "mellow", "romantic", "aggressive", "uplifting", "sad", "winter", "summer", "warm",
    "cold", "futuristic", "noisy", "ominous", "playful", "political", "complex",
    "depressive", "existential", "atmospheric", "cryptic", "lonely", "surreal", "sexual",
    "optimistic", "serious", "triumphant", "raw", "heavy",
    // generic
    "music", "genre", "vocal", "male vocalist", "female vocalist", "male vocalists",
    "female vocalists", "family", "live", "soundtrack", "non-music",
];

/// One compiled rule
#[derive(Debug, Clone)]
pub struct GenreRule {
    pattern: Regex,
    genre: String,
}

impl GenreRule {
    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn is_match(&self, tag: &str) -> bool {
        self.pattern.is_match(tag)
    }
}

/// Ordered tag → genre rule set
#[derive(Debug, Clone)]
pub struct GenreRules {
    rules: Vec<GenreRule>,
    year_pattern: Regex,
}

impl GenreRules {
    /// Built-in rule table
    pub fn builtin() -> Result<Self> {
        Self::from_pairs(DEFAULT_RULES.iter().copied())
    }

    /// Rules from `[[genre_rules]]` config entries, in file order
    pub fn from_config(entries: &[GenreRuleConfig]) -> Result<Self> {
        Self::from_pairs(
            entries
                .iter()
                .map(|e| (e.pattern.as_str(), e.genre.as_str())),
        )
    }

    /// `[[genre_rules]]` when configured, otherwise the built-in table
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        match &config.genre_rules {
            Some(entries) => Self::from_config(entries),
            None => Self::builtin(),
        }
    }

    /// Compile `(pattern, genre)` pairs, keeping their order
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut rules = Vec::new();
        for (pattern, genre) in pairs {
            let compiled = Regex::new(pattern).map_err(|e| {
                Error::Config(format!("Invalid genre rule pattern '{}': {}", pattern, e))
            })?;
            rules.push(GenreRule {
                pattern: compiled,
                genre: genre.to_string(),
            });
        }

        let year_pattern = Regex::new(r"\b(19|20)\d{2}\b|\b\d0s\b")
            .map_err(|e| Error::Internal(format!("Year pattern failed to compile: {}", e)))?;

        Ok(Self {
            rules,
            year_pattern,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[GenreRule] {
        &self.rules
    }

    /// Genre for a single raw tag, if any rule matches
    pub fn map_tag(&self, raw_tag: &str) -> Option<&str> {
        let token = normalize_tag(raw_tag)?;
        if self.is_obvious_non_style(&token) {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| rule.is_match(&token))
            .map(GenreRule::genre)
    }

    /// Map raw tags to deduplicated, sorted genres
    pub fn map_tags<I, S>(&self, raw_tags: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut genres: Vec<String> = raw_tags
            .into_iter()
            .filter_map(|tag| self.map_tag(tag.as_ref()).map(str::to_string))
            .collect();
        genres.sort();
        genres.dedup();
        genres
    }

    /// Tags that are clearly not musical styles
    pub fn is_obvious_non_style(&self, token: &str) -> bool {
        if self.year_pattern.is_match(token) {
            return true;
        }
        if NON_STYLE_KEYWORDS.iter().any(|kw| token.contains(kw)) {
            return true;
        }
        NON_STYLE_TAGS.contains(&token)
    }
}

/// Lowercase a raw tag and fold separators into single spaces
///
/// Returns `None` for tags that are empty after normalization.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let mut text = raw.trim().to_lowercase();

    for sep in ['/', ';', ',', '+', '|', '&'] {
        text = text.replace(sep, " ");
    }
    text = text.replace(" and ", " ");

    let token = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
