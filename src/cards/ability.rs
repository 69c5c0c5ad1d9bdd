//! Structured card abilities.
//!
//! Ability text is parsed once, when a definition is registered, into
//! keyword flags and a small closed set of effects. Rules and AI code only
//! ever read the structured form; the text stays for display.
//!
//! ## Grammar
//!
//! - Keywords match whole words: `impulsive`, `relentless`, `grounded`,
//!   `lethal`, `stubborn`, `overwhelm`.
//! - `Spend: ...` introduces the activated ability. Its effect is one of
//!   `recovers N endurance`, `ready`/`spend target`, `create ... 1/1`,
//!   `draw N`. Anything else is kept as `Effect::Inert`.
//! - Outside a spend clause, `draw N` (or `draw a card`) is the on-play
//!   effect for Interruptions.
//! - `enters`/`when played` marks an enter-the-field trigger.
//!
//! ```
//! use riutiz_ccg::cards::{Abilities, Effect, Keyword};
//!
//! let relentless = Abilities::parse(Some("Relentless. Overwhelm."));
//! assert!(relentless.has(Keyword::Relentless));
//! assert!(relentless.has(Keyword::Overwhelm));
//!
//! let medic = Abilities::parse(Some("Spend: Target Pupil recovers 2 endurance."));
//! assert_eq!(medic.on_spend, Some(Effect::RecoverEndurance(2)));
//!
//! let flavor = Abilities::parse(Some("She likes to drawl her words."));
//! assert_eq!(flavor.on_play, None);
//! ```

use serde::{Deserialize, Serialize};

/// Combat and timing keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    /// Enters the field without getting bearings.
    Impulsive,
    /// May attack while spent, and is not spent by attacking.
    Relentless,
    /// Cannot attack.
    Grounded,
    /// Any damage it deals to a blocker spends that blocker.
    Lethal,
    /// Takes no damage when blocked.
    Stubborn,
    /// Excess damage to a dead blocker is scored.
    Overwhelm,
}

impl Keyword {
    pub const ALL: [Keyword; 6] = [
        Keyword::Impulsive,
        Keyword::Relentless,
        Keyword::Grounded,
        Keyword::Lethal,
        Keyword::Stubborn,
        Keyword::Overwhelm,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    fn word(self) -> &'static str {
        match self {
            Keyword::Impulsive => "impulsive",
            Keyword::Relentless => "relentless",
            Keyword::Grounded => "grounded",
            Keyword::Lethal => "lethal",
            Keyword::Stubborn => "stubborn",
            Keyword::Overwhelm => "overwhelm",
        }
    }
}

/// A set of keywords stored as bit flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet(u8);

impl KeywordSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn with(mut self, keyword: Keyword) -> Self {
        self.0 |= keyword.bit();
        self
    }

    pub fn insert(&mut self, keyword: Keyword) {
        self.0 |= keyword.bit();
    }

    #[must_use]
    pub const fn contains(self, keyword: Keyword) -> bool {
        self.0 & keyword.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Keyword> {
        Keyword::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

/// Effects the engine knows how to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Draw up to N cards.
    DrawCards(u32),
    /// Target Pupil regains N endurance, capped at its printed value.
    RecoverEndurance(i32),
    /// Flip the spent flag of a target Pupil.
    ToggleSpent,
    /// Put a 1/1 token Pupil onto the field.
    CreateToken,
    /// Recognised as an ability, but with no engine-side effect.
    Inert,
}

impl Effect {
    /// Whether the effect needs a target instance.
    #[must_use]
    pub const fn needs_target(self) -> bool {
        matches!(self, Effect::RecoverEndurance(_) | Effect::ToggleSpent)
    }
}

/// Parsed ability of a card definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Abilities {
    pub keywords: KeywordSet,
    /// Resolves when an Interruption is played.
    pub on_play: Option<Effect>,
    /// Resolves when the card is spent for its ability.
    pub on_spend: Option<Effect>,
    /// Text describes an enter-the-field trigger.
    pub enters_trigger: bool,
    /// Text mentions drawing cards anywhere.
    pub draws: bool,
}

impl Abilities {
    /// Parse ability text. `None` or empty text yields no abilities.
    #[must_use]
    pub fn parse(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Self::default();
        };
        let lower = text.to_lowercase();
        let words = tokenize(&lower);

        let mut abilities = Self::default();
        for keyword in Keyword::ALL {
            if words.iter().any(|w| *w == keyword.word()) {
                abilities.keywords.insert(keyword);
            }
        }

        match spend_clause(&lower) {
            Some((before, after)) => {
                abilities.on_spend = Some(parse_effect(&tokenize(after)).unwrap_or(Effect::Inert));
                abilities.on_play = parse_draw(&tokenize(before));
            }
            None => abilities.on_play = parse_draw(&words),
        }

        abilities.draws = words.iter().any(|w| *w == "draw" || *w == "draws");
        abilities.enters_trigger = words.iter().any(|w| *w == "enters")
            || words.windows(2).any(|w| w[0] == "when" && w[1] == "played");
        abilities
    }

    #[must_use]
    pub fn has(&self, keyword: Keyword) -> bool {
        self.keywords.contains(keyword)
    }
}

fn tokenize(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '/'))
        .filter(|w| !w.is_empty())
        .collect()
}

// "Spend" only opens an ability clause when written as "Spend:".
fn spend_clause(lower: &str) -> Option<(&str, &str)> {
    lower.match_indices("spend").find_map(|(pos, m)| {
        let at_word_start = lower[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let rest = lower[pos + m.len()..].trim_start();
        let body = rest.strip_prefix(':')?;
        at_word_start.then_some((&lower[..pos], body))
    })
}

fn parse_effect(words: &[&str]) -> Option<Effect> {
    if let Some(i) = words.iter().position(|w| *w == "recovers" || *w == "recover") {
        let amount = words.get(i + 1).and_then(|w| w.parse().ok()).unwrap_or(1);
        return Some(Effect::RecoverEndurance(amount));
    }
    if words.iter().any(|w| *w == "create" || *w == "creates") && words.iter().any(|w| *w == "1/1") {
        return Some(Effect::CreateToken);
    }
    if words.windows(2).any(|w| (w[0] == "ready" || w[0] == "spend") && w[1] == "target") {
        return Some(Effect::ToggleSpent);
    }
    parse_draw(words)
}

fn parse_draw(words: &[&str]) -> Option<Effect> {
    let i = words.iter().position(|w| *w == "draw" || *w == "draws")?;
    let amount = match words.get(i + 1) {
        Some(w) => w.parse().unwrap_or(1),
        None => 1,
    };
    Some(Effect::DrawCards(amount))
}
