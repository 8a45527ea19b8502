//! User-facing message localization.
//!
//! Fatal errors and the partial-success warning are shown to end users, so
//! they are rendered in the language negotiated from the request's
//! `Accept-Language` header. Internal errors, logs, and `Display` impls stay
//! English; only the strings that reach a person go through here.

use crate::error::ProxyError;
use serde::{Deserialize, Serialize};

/// Languages with a full set of user-facing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lang {
    /// English (default).
    #[default]
    En,
    /// French.
    Fr,
}

impl Lang {
    /// Negotiate a language from an `Accept-Language` header value.
    ///
    /// Picks the supported language with the highest q-weight; ties go to
    /// the one listed first. Unknown or empty input falls back to English.
    pub fn negotiate(accept_language: &str) -> Lang {
        let mut best = (Lang::En, -1.0f32);
        for entry in accept_language.split(',') {
            let mut parts = entry.trim().split(';');
            let tag = parts.next().unwrap_or("").trim().to_ascii_lowercase();
            let q = parts
                .find_map(|p| p.trim().strip_prefix("q=").map(str::to_string))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            let lang = if tag == "fr" || tag.starts_with("fr-") {
                Some(Lang::Fr)
            } else if tag == "en" || tag.starts_with("en-") || tag == "*" {
                Some(Lang::En)
            } else {
                None
            };

            if let Some(lang) = lang {
                if q > best.1 {
                    best = (lang, q);
                }
            }
        }
        best.0
    }
}

/// Warning attached to a partially successful job: some identifiers could
/// not be turned into images, the rest were rendered.
pub fn partial_warning(lang: Lang, missing: &[String], rendered: usize) -> String {
    let list = missing.join(", ");
    match lang {
        Lang::En => format!(
            "{} card image(s) could not be found ({list}); {rendered} proxies were rendered.",
            missing.len()
        ),
        Lang::Fr => format!(
            "{} image(s) de carte introuvable(s) ({list}) ; {rendered} proxies ont été générés.",
            missing.len()
        ),
    }
}

/// User-facing rendition of a fatal error.
///
/// Falls back to the error's `Display` for variants that only ever surface
/// to operators (I/O, config, internal).
pub fn error_message(lang: Lang, err: &ProxyError) -> String {
    match (lang, err) {
        (Lang::En, ProxyError::NoValidImages { .. }) => {
            "None of the requested cards could be found; no PDF was generated.".to_string()
        }
        (Lang::Fr, ProxyError::NoValidImages { .. }) => {
            "Aucune des cartes demandées n'a pu être trouvée ; aucun PDF n'a été généré.".to_string()
        }
        (Lang::En, ProxyError::NoInputProvided) => {
            "No decklist provided. Upload a .ydk file, a ydke:// token, or a card list.".to_string()
        }
        (Lang::Fr, ProxyError::NoInputProvided) => {
            "Aucune liste de deck fournie. Envoyez un fichier .ydk, un jeton ydke:// ou une liste de cartes.".to_string()
        }
        (Lang::En, ProxyError::InvalidFileType { name }) => {
            format!("'{name}' is not a .ydk decklist file.")
        }
        (Lang::Fr, ProxyError::InvalidFileType { name }) => {
            format!("'{name}' n'est pas un fichier de deck .ydk.")
        }
        (Lang::En, ProxyError::InvalidFormat(detail)) => {
            format!("The decklist could not be read: {detail}")
        }
        (Lang::Fr, ProxyError::InvalidFormat(detail)) => {
            format!("La liste de deck n'a pas pu être lue : {detail}")
        }
        (_, other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_plain_tags() {
        assert_eq!(Lang::negotiate("fr"), Lang::Fr);
        assert_eq!(Lang::negotiate("en"), Lang::En);
        assert_eq!(Lang::negotiate("fr-FR"), Lang::Fr);
        assert_eq!(Lang::negotiate("en-GB"), Lang::En);
    }

    #[test]
    fn negotiate_honours_q_weights() {
        assert_eq!(Lang::negotiate("fr-FR,fr;q=0.9,en;q=0.8"), Lang::Fr);
        assert_eq!(Lang::negotiate("en;q=0.9,fr;q=0.3"), Lang::En);
        assert_eq!(Lang::negotiate("de,fr;q=0.5"), Lang::Fr);
    }

    #[test]
    fn negotiate_falls_back_to_english() {
        assert_eq!(Lang::negotiate(""), Lang::En);
        assert_eq!(Lang::negotiate("de-DE,de;q=0.9"), Lang::En);
        assert_eq!(Lang::negotiate("not a header"), Lang::En);
    }

    #[test]
    fn no_valid_images_is_localized() {
        let err = ProxyError::NoValidImages {
            requested: 3,
            first_error: "x".into(),
        };
        let en = error_message(Lang::En, &err);
        let fr = error_message(Lang::Fr, &err);
        assert_ne!(en, fr);
        assert!(fr.contains("Aucune"));
    }

    #[test]
    fn partial_warning_names_the_missing_ids() {
        let w = partial_warning(Lang::En, &["111".into(), "222".into()], 7);
        assert!(w.contains("111, 222"));
        assert!(w.contains('7'));
    }
}
