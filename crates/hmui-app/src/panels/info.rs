#![forbid(unsafe_code)]

//! Info panel: about data and language selection.

/// One selectable UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageOption {
    pub code: &'static str,
    pub name: &'static str,
}

/// Selectable languages, English pinned first, the rest sorted by name.
#[must_use]
pub fn language_options() -> Vec<LanguageOption> {
    let mut options = vec![
        LanguageOption {
            code: "en-US",
            name: "English",
        },
        LanguageOption {
            code: "es-ES",
            name: "Español",
        },
        LanguageOption {
            code: "ja-JP",
            name: "日本語",
        },
        LanguageOption {
            code: "ru-RU",
            name: "Русский",
        },
        LanguageOption {
            code: "uk-UA",
            name: "Українська",
        },
        LanguageOption {
            code: "zh-CN",
            name: "简体中文",
        },
        LanguageOption {
            code: "zh-TW",
            name: "繁體中文",
        },
    ];
    options.sort_by(|a, b| {
        if a.code == "en-US" {
            std::cmp::Ordering::Less
        } else if b.code == "en-US" {
            std::cmp::Ordering::Greater
        } else {
            a.name.cmp(b.name)
        }
    });
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_is_pinned_first() {
        let options = language_options();
        assert_eq!(options[0].code, "en-US");
    }

    #[test]
    fn every_code_is_unique() {
        let options = language_options();
        let mut codes: Vec<_> = options.iter().map(|o| o.code).collect();
        codes.dedup();
        assert_eq!(codes.len(), options.len());
    }
}
