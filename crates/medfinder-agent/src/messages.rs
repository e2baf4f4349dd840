// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing reply templates (Arabic).

use std::fmt::Write as _;

use medfinder_core::{RankedResult, ReplyButton};

pub const EXTRACTION_FAILED: &str = "لم أتمكن من فهم الرسالة. يرجى إرسال نص واضح أو صورة جيدة.";

pub const NAME_NOT_FOUND: &str = "لم أتمكن من التعرف على اسم الدواء. يرجى إعادة المحاولة بشكل أوضح.";

pub const LOCATION_REQUEST: &str = "يرجى مشاركة موقعك الحالي للعثور على أقرب الصيدليات.";

pub const LOCATION_RECEIVED: &str = "تم استلام موقعك. يرجى إرسال اسم الدواء الذي تبحث عنه.";

pub const GENERIC_ERROR: &str = "حدث خطأ في معالجة طلبك. يرجى المحاولة لاحقاً.";

pub const MAP_CAPTION: &str = "خريطة توضح موقعك والصيدليات القريبة";

pub const ACTION_PROMPT: &str = "ماذا تريد أن تفعل؟";

/// Results rendered in the reply text and on the map.
pub const MAX_SHOWN_RESULTS: usize = 5;

const UNKNOWN: &str = "غير متوفر";

pub fn not_found(medicine: &str) -> String {
    format!(
        "عذراً، لم أجد الدواء \"{medicine}\" في الصيدليات القريبة منك. يرجى التحقق من الاسم والمحاولة مرة أخرى."
    )
}

/// The results message: a header counting every match, then one block per
/// shown result numbered from 1.
pub fn results_text(medicine: &str, shown: &[RankedResult], total: usize) -> String {
    let mut text =
        format!("🔍 نتائج البحث عن: *{medicine}*\n\nوجدت {total} صيدلية قريبة منك:\n\n");
    for (index, result) in shown.iter().enumerate() {
        let entry = &result.entry;
        let _ = writeln!(
            text,
            "📍 *{}. {} - {}*",
            index + 1,
            entry.pharmacy_name,
            entry.branch_name
        );
        let _ = writeln!(text, "   💊 الدواء: {}", entry.medicine_name);
        let _ = writeln!(text, "   💰 السعر: {:.2} ج.م", entry.price);
        let _ = writeln!(text, "   📦 متوفر: {} عبوة", entry.quantity);
        let _ = writeln!(
            text,
            "   📏 المسافة: {} كم (~{} دقيقة)",
            result.distance_km, result.eta_minutes
        );
        let _ = writeln!(
            text,
            "   📞 الهاتف: {}",
            entry.phone.as_deref().unwrap_or(UNKNOWN)
        );
        let _ = writeln!(
            text,
            "   🕒 مواعيد العمل: {} - {}",
            entry.opening_hours.as_deref().unwrap_or(UNKNOWN),
            entry.closing_hours.as_deref().unwrap_or(UNKNOWN)
        );
        text.push('\n');
    }
    text
}

/// Directions, call, and reserve actions for one result.
pub fn action_buttons(result: &RankedResult) -> Vec<ReplyButton> {
    let entry = &result.entry;
    vec![
        ReplyButton {
            id: format!("directions_{}", entry.branch_id),
            title: "🗺️ الاتجاهات".to_string(),
        },
        ReplyButton {
            id: format!("call_{}", entry.branch_id),
            title: "📞 اتصال".to_string(),
        },
        ReplyButton {
            id: format!("order_{}", entry.medicine_id),
            title: "🛒 حجز".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use medfinder_test_utils::fixtures::entry;

    fn ranked(id: i64, distance_km: f64, eta_minutes: u32) -> RankedResult {
        RankedResult {
            entry: entry(id, "Panadol", 12, (30.0, 31.0)),
            distance_km,
            eta_minutes,
        }
    }

    #[test]
    fn results_block_layout() {
        let text = results_text("panadol", &[ranked(4, 2.35, 7)], 1);
        let expected = [
            "🔍 نتائج البحث عن: *panadol*",
            "",
            "وجدت 1 صيدلية قريبة منك:",
            "",
            "📍 *1. Pharmacy 4 - Branch 4*",
            "   💊 الدواء: Panadol",
            "   💰 السعر: 25.50 ج.م",
            "   📦 متوفر: 12 عبوة",
            "   📏 المسافة: 2.35 كم (~7 دقيقة)",
            "   📞 الهاتف: 02-555-0004",
            "   🕒 مواعيد العمل: 09:00 - 23:00",
            "",
            "",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn header_counts_all_results_and_numbers_shown_ones() {
        let shown: Vec<RankedResult> = (1..=2).map(|i| ranked(i, i as f64, 2)).collect();
        let text = results_text("panadol", &shown, 9);
        assert!(text.contains("وجدت 9 صيدلية"));
        assert!(text.contains("*1. Pharmacy 1"));
        assert!(text.contains("*2. Pharmacy 2"));
        assert!(!text.contains("*3."));
    }

    #[test]
    fn missing_contact_details_are_marked() {
        let mut result = ranked(1, 1.0, 2);
        result.entry.phone = None;
        result.entry.opening_hours = None;
        let text = results_text("x", &[result], 1);
        assert!(text.contains("الهاتف: غير متوفر"));
        assert!(text.contains("مواعيد العمل: غير متوفر - 23:00"));
    }

    #[test]
    fn buttons_bind_branch_and_medicine_ids() {
        let mut result = ranked(4, 1.0, 2);
        result.entry.medicine_id = 77;
        let ids: Vec<String> = action_buttons(&result).into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["directions_4", "call_4", "order_77"]);
    }

    #[test]
    fn not_found_quotes_the_name() {
        assert!(not_found("زيرتك").contains("\"زيرتك\""));
    }
}
