//! Prompt composition for the selected page.

use siteqa_shared::ScrapedDocument;

/// Default number of page-text characters forwarded to the model.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 10_000;

/// Answering rules. The reply shape (list, yes/no with a recommendation, or
/// a prose summary) is left to the model, guided by the question itself.
const INSTRUCTIONS: &str = "\
กรุณาตอบเป็นภาษาไทยเท่านั้น โดยอ้างอิงเฉพาะเนื้อหาของหน้าเว็บไซต์ด้านล่าง
ห้ามแต่งหรือคาดเดาข้อมูลที่ไม่มีอยู่ในเนื้อหา และไม่ต้องใส่ลิงก์ใดๆ ในคำตอบ

รูปแบบคำตอบให้เป็นไปตามลักษณะของคำถาม:
- ถ้าถามว่ามีอะไรบ้าง ให้ตอบเป็นรายการ
- ถ้าถามว่ามี/ไม่มี สินค้าหรือบริการ ให้ตอบว่ามีหรือไม่ แล้วแนะนำสินค้า/บริการที่เกี่ยวข้อง
- กรณีอื่น ให้สรุปเป็นความเรียงที่ชัดเจนและครบถ้วน ไม่สั้นจนเกินไป";

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the generation prompt: rules, question, page metadata, page text
/// (cut to `max_context_chars`), answer cue.
pub fn build_prompt(question: &str, document: &ScrapedDocument, max_context_chars: usize) -> String {
    let context = truncate_chars(&document.html_text, max_context_chars);

    format!(
        "{INSTRUCTIONS}

คำถาม:
{question}

ข้อมูลสรุปจากหน้าเว็บไซต์:
[ชื่อหน้าเว็บ]: {name_page}
[หมวดหมู่/ศูนย์]: {center}
[หัวข้อ]: {header}
[แท็ก]: {tag}

[HTML ของเว็บไซต์]:
{context}

คำตอบ:
",
        name_page = document.name_page,
        center = document.center,
        header = document.header,
        tag = document.tag,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html_text: &str) -> ScrapedDocument {
        ScrapedDocument {
            url: "https://www.tistr.or.th/bio".into(),
            header: "บริการ".into(),
            center: "ศูนย์ชีววิทยา".into(),
            name_page: "Biotechnology".into(),
            tag: "bio, lab".into(),
            html_text: html_text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("กขคง", 2), "กข");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn sections_appear_in_order() {
        let prompt = build_prompt("มีบริการอะไรบ้าง", &page("เนื้อหา"), DEFAULT_MAX_CONTEXT_CHARS);

        let positions: Vec<usize> = [
            "กรุณาตอบเป็นภาษาไทยเท่านั้น",
            "คำถาม:\nมีบริการอะไรบ้าง",
            "[ชื่อหน้าเว็บ]: Biotechnology",
            "[หมวดหมู่/ศูนย์]: ศูนย์ชีววิทยา",
            "[หัวข้อ]: บริการ",
            "[แท็ก]: bio, lab",
            "[HTML ของเว็บไซต์]:\nเนื้อหา",
            "คำตอบ:",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
        assert!(prompt.trim_end().ends_with("คำตอบ:"));
    }

    #[test]
    fn long_text_is_cut_to_exact_char_count() {
        let body = "ก".repeat(10_500);
        let prompt = build_prompt("q", &page(&body), DEFAULT_MAX_CONTEXT_CHARS);

        let start = prompt.find("[HTML ของเว็บไซต์]:\n").unwrap() + "[HTML ของเว็บไซต์]:\n".len();
        let end = prompt.rfind("\n\nคำตอบ:").unwrap();
        let context = &prompt[start..end];
        assert_eq!(context.chars().count(), 10_000);
        assert!(context.chars().all(|c| c == 'ก'));
    }

    #[test]
    fn short_text_is_untouched() {
        let prompt = build_prompt("q", &page("TISTR offers biotechnology services"), 10_000);
        assert!(prompt.contains("[HTML ของเว็บไซต์]:\nTISTR offers biotechnology services\n"));
    }
}
