//! Locale-suffixed column naming.
//!
//! Records whose file columns are translated store one set of slot columns
//! per locale: `document_en`, `document_filename_en`, `document_mime_en`.
//! A record opts in by returning a [`LocaleColumnResolver`] from
//! [`crate::Record::locale_columns`]; without one, column names are used as given.

use crate::slots::SlotColumns;

/// Naming convention for translated slot columns
pub trait LocaleColumnResolver: Send + Sync {
    /// Whether `attribute` is a translatable base attribute (e.g. `document`)
    fn is_translatable(&self, attribute: &str) -> bool;

    /// Locale used when a column is given without a suffix
    fn active_locale(&self) -> &str;

    /// Column holding `attribute` for `locale`
    fn translated_column(&self, attribute: &str, locale: &str) -> String {
        format!("{}_{}", attribute, locale)
    }

    /// Resolve the slot columns for `column`, or `None` when the column is not translatable.
    ///
    /// `document` resolves for the active locale. `document_fr` keeps its own suffix.
    fn resolve_slot_columns(&self, column: &str) -> Option<SlotColumns> {
        let (base, locale) = if self.is_translatable(column) {
            (column, self.active_locale())
        } else {
            match column.rsplit_once('_') {
                Some((base, locale)) if !locale.is_empty() && self.is_translatable(base) => {
                    (base, locale)
                }
                _ => return None,
            }
        };

        Some(SlotColumns {
            presence: self.translated_column(base, locale),
            filename: self.translated_column(&format!("{}_filename", base), locale),
            mime: self.translated_column(&format!("{}_mime", base), locale),
        })
    }
}

/// `{attribute}_{locale}` convention over a fixed list of translatable attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnderscoreLocale {
    attributes: Vec<String>,
    locale: String,
}

impl UnderscoreLocale {
    pub fn new<I, S>(attributes: I, locale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
            locale: locale.into(),
        }
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }
}

impl LocaleColumnResolver for UnderscoreLocale {
    fn is_translatable(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }

    fn active_locale(&self) -> &str {
        &self.locale
    }
}
