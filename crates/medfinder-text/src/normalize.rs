// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case, diacritic, and letter-variant folding.

/// Arabic tashkeel (harakat, tanween, shadda, sukun and extended marks).
const TASHKEEL: std::ops::RangeInclusive<char> = '\u{064B}'..='\u{065F}';

/// Normalize free text for matching.
///
/// In order: Unicode lowercase, strip Arabic diacritics, fold letter variants
/// (`أ إ آ` to `ا`, `ة` to `ه`, `ى` to `ي`), then collapse whitespace runs and
/// trim. Total and idempotent.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !TASHKEEL.contains(c))
        .map(fold_letter)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_letter(c: char) -> char {
    match c {
        'أ' | 'إ' | 'آ' => 'ا',
        'ة' => 'ه',
        'ى' => 'ي',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn alef_variants_fold_together() {
        assert_eq!(normalize("أسبرين"), normalize("اسبرين"));
        assert_eq!(normalize("إسبرين"), "اسبرين");
        assert_eq!(normalize("آسبرين"), "اسبرين");
    }

    #[test]
    fn latin_case_is_folded() {
        assert_eq!(normalize("ADVIL"), normalize("advil"));
        assert_eq!(normalize("Panadol Extra"), "panadol extra");
    }

    #[test]
    fn diacritics_are_stripped() {
        // "دَوَاءٌ" with fatha, fatha, dammatan
        assert_eq!(normalize("دَوَاءٌ"), "دواء");
    }

    #[test]
    fn taa_marbuta_and_alef_maqsura_fold() {
        assert_eq!(normalize("صيدلية"), "صيدليه");
        assert_eq!(normalize("مستشفى"), "مستشفي");
    }

    #[test]
    fn whitespace_is_collapsed_and_trimmed() {
        assert_eq!(normalize("  هل   يتوفر\t\nبنادول  "), "هل يتوفر بنادول");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(""), "");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn normalize_is_idempotent_on_arabic(s in "[\u{0600}-\u{06FF} a-zA-Z0-9]{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
