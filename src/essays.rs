//! Essay records built from exported Markdown posts.

use crate::fields::{self, CategoryRules};
use crate::models::{assign_ids, Essay, SourceDocument};
use crate::text;

pub const DEFAULT_CATEGORY: &str = "随笔";

const CATEGORY_RULES: CategoryRules<'static> = CategoryRules {
    candidates: &["选择", "分类", "categories", "tags"],
    reserved_keys: &["title", "date", "updated", "description", "urlname", "cover"],
    known: &["旅行感受", "技术思考", "工作思考", "影评", "书评", "随笔"],
};

/// Build one essay. The id is left empty until [`finalize_essays`].
pub fn build_essay(doc: &SourceDocument) -> Essay {
    let fm = &doc.front_matter;

    let title = fields::resolve(fm, &["title"])
        .map(str::to_string)
        .unwrap_or_else(|| doc.stem.clone());

    let date = fields::resolve(fm, &["date", "updated"])
        .and_then(text::normalize_date)
        .unwrap_or_else(text::today);

    let category = fields::resolve_category(fm, &CATEGORY_RULES)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let content = text::strip_markdown(&doc.body);
    let excerpt = match fields::resolve(fm, &["description"]) {
        Some(desc) => desc.to_string(),
        None => text::make_excerpt(&content),
    };

    Essay {
        id: String::new(),
        title,
        excerpt,
        date,
        category,
        content,
    }
}

/// Sort newest first and number `"1".."N"`. Equal dates keep input order.
pub fn finalize_essays(essays: &mut [Essay]) {
    essays.sort_by(|a, b| b.date.cmp(&a.date));
    assign_ids(essays, |e, id| e.id = id);
}

pub fn build_essays(docs: &[SourceDocument]) -> Vec<Essay> {
    let mut essays: Vec<Essay> = docs.iter().map(build_essay).collect();
    finalize_essays(&mut essays);
    essays
}
