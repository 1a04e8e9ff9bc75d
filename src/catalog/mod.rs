//! Extinct mammal catalogue: the stored entity and its translated view.

pub mod map;
pub mod store;

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};

use crate::translate::language::{is_content_language, normalize_lang};
use crate::translate::Translator;

pub use map::{GeocodingData, MapData};
pub use store::{MammalStore, Page, SearchFilter, StoreError};

/// Descriptions longer than this are cut for list views.
pub const SHORT_DESCRIPTION_CHARS: usize = 200;
const ELLIPSIS: &str = "...";

/// One catalogued species, as stored. Text is in the content language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mammal {
    pub id: i64,
    pub common_name: String,
    pub binomial_name: String,
    pub description: String,
    pub habitat: Option<String>,
    pub distribution: Option<String>,
    pub extinction_causes: Option<String>,
    pub image_filename: Option<String>,
    pub continent: Option<String>,
    pub taxonomy_order: Option<String>,
}

/// Fields whose text is translated on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatableField {
    Description,
    Habitat,
    Distribution,
    ExtinctionCauses,
}

impl TranslatableField {
    pub const ALL: [TranslatableField; 4] = [
        TranslatableField::Description,
        TranslatableField::Habitat,
        TranslatableField::Distribution,
        TranslatableField::ExtinctionCauses,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TranslatableField::Description => "description",
            TranslatableField::Habitat => "habitat",
            TranslatableField::Distribution => "distribution",
            TranslatableField::ExtinctionCauses => "extinction_causes",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl Mammal {
    /// Original text of a translatable field; absent values read as "".
    pub fn field(&self, field: TranslatableField) -> &str {
        match field {
            TranslatableField::Description => &self.description,
            TranslatableField::Habitat => self.habitat.as_deref().unwrap_or(""),
            TranslatableField::Distribution => self.distribution.as_deref().unwrap_or(""),
            TranslatableField::ExtinctionCauses => {
                self.extinction_causes.as_deref().unwrap_or("")
            }
        }
    }

    pub fn short_description(&self) -> String {
        shorten(&self.description)
    }
}

/// Truncate to `SHORT_DESCRIPTION_CHARS` characters plus an ellipsis.
pub fn shorten(text: &str) -> String {
    match text.char_indices().nth(SHORT_DESCRIPTION_CHARS) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Read-only view of a `Mammal` in a target language.
///
/// Each translatable field is translated on first access and memoized for
/// the life of the view. All other fields pass straight through. Views are
/// meant to live for one request and are not shared across threads.
pub struct TranslatedMammal<'a> {
    translator: &'a Translator,
    mammal: &'a Mammal,
    target_lang: String,
    memo: [OnceCell<String>; 4],
}

impl<'a> TranslatedMammal<'a> {
    pub fn new(translator: &'a Translator, mammal: &'a Mammal, target_lang: &str) -> Self {
        Self {
            translator,
            mammal,
            target_lang: normalize_lang(target_lang),
            memo: Default::default(),
        }
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// False when the view is in the content language and shows stored text as is.
    pub fn is_translated(&self) -> bool {
        !is_content_language(&self.target_lang, self.translator.content_lang())
    }

    /// The wrapped entity, for any field that is not translated.
    pub fn original(&self) -> &'a Mammal {
        self.mammal
    }

    /// Translated text of `field`, computed once per view.
    pub fn field(&self, field: TranslatableField) -> &str {
        self.memo[field.slot()].get_or_init(|| {
            let original = self.mammal.field(field);
            if original.is_empty() {
                return String::new();
            }
            self.translator
                .translate(original, self.translator.content_lang(), &self.target_lang)
        })
    }

    pub fn description(&self) -> &str {
        self.field(TranslatableField::Description)
    }

    pub fn habitat(&self) -> &str {
        self.field(TranslatableField::Habitat)
    }

    pub fn distribution(&self) -> &str {
        self.field(TranslatableField::Distribution)
    }

    pub fn extinction_causes(&self) -> &str {
        self.field(TranslatableField::ExtinctionCauses)
    }

    /// Derived from the translated description.
    pub fn short_description(&self) -> String {
        shorten(self.description())
    }

    pub fn id(&self) -> i64 {
        self.mammal.id
    }

    pub fn common_name(&self) -> &'a str {
        &self.mammal.common_name
    }

    pub fn binomial_name(&self) -> &'a str {
        &self.mammal.binomial_name
    }

    pub fn taxonomy_order(&self) -> Option<&'a str> {
        self.mammal.taxonomy_order.as_deref()
    }

    pub fn continent(&self) -> Option<&'a str> {
        self.mammal.continent.as_deref()
    }

    pub fn image_filename(&self) -> Option<&'a str> {
        self.mammal.image_filename.as_deref()
    }

    /// All translated text fields at once, e.g. for a detail page.
    pub fn translated_fields(&self) -> TranslatedFields {
        TranslatedFields {
            description: self.description().to_string(),
            short_description: self.short_description(),
            habitat: self.habitat().to_string(),
            distribution: self.distribution().to_string(),
            extinction_causes: self.extinction_causes().to_string(),
        }
    }

    /// Compact card used by list pages and search results.
    pub fn summary(&self) -> MammalSummary {
        MammalSummary {
            id: self.id(),
            common_name: self.common_name().to_string(),
            binomial_name: self.binomial_name().to_string(),
            description: self.short_description(),
            image_filename: self.image_filename().unwrap_or_default().to_string(),
            continent: self.continent().unwrap_or_default().to_string(),
            taxonomy_order: self.taxonomy_order().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedFields {
    pub description: String,
    pub short_description: String,
    pub habitat: String,
    pub distribution: String,
    pub extinction_causes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MammalSummary {
    pub id: i64,
    pub common_name: String,
    pub binomial_name: String,
    pub description: String,
    pub image_filename: String,
    pub continent: String,
    pub taxonomy_order: String,
}
