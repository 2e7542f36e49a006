//! Resume row classification.
//!
//! Rows carry a free-text or select "type" column such as `工作经历`,
//! `技能-开发` or `Education`. Classification is an ordered rule list over
//! the lowercased text; the first matching rule decides.

/// Section a resume row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSection {
    Summary,
    Experience,
    Education,
    SkillDevelopment,
    SkillDesign,
    SkillLanguage,
    Other,
}

/// `requires` must be contained in the text (when set), and then any of
/// `contains` must be contained or any of `equals` must equal the text.
struct KeywordRule {
    requires: Option<&'static str>,
    contains: &'static [&'static str],
    equals: &'static [&'static str],
    section: ResumeSection,
}

impl KeywordRule {
    fn matches(&self, text: &str) -> bool {
        if let Some(req) = self.requires {
            if !text.contains(req) {
                return false;
            }
        }
        self.contains.iter().any(|k| text.contains(k)) || self.equals.contains(&text)
    }
}

const TYPE_RULES: &[KeywordRule] = &[
    KeywordRule {
        requires: None,
        contains: &["总结"],
        equals: &["summary"],
        section: ResumeSection::Summary,
    },
    KeywordRule {
        requires: None,
        contains: &["经历", "经验"],
        equals: &["experience"],
        section: ResumeSection::Experience,
    },
    KeywordRule {
        requires: None,
        contains: &["教育"],
        equals: &["education"],
        section: ResumeSection::Education,
    },
    KeywordRule {
        requires: Some("技能"),
        contains: &["开发", "development"],
        equals: &[],
        section: ResumeSection::SkillDevelopment,
    },
    KeywordRule {
        requires: Some("技能"),
        contains: &["设计", "design"],
        equals: &[],
        section: ResumeSection::SkillDesign,
    },
    KeywordRule {
        requires: Some("技能"),
        contains: &["语言", "language"],
        equals: &[],
        section: ResumeSection::SkillLanguage,
    },
];

const CATEGORY_RULES: &[KeywordRule] = &[
    KeywordRule {
        requires: None,
        contains: &["开发"],
        equals: &["development"],
        section: ResumeSection::SkillDevelopment,
    },
    KeywordRule {
        requires: None,
        contains: &["设计"],
        equals: &["design"],
        section: ResumeSection::SkillDesign,
    },
    KeywordRule {
        requires: None,
        contains: &["语言"],
        equals: &["language", "languages"],
        section: ResumeSection::SkillLanguage,
    },
];

const ROLE_RULES: &[KeywordRule] = &[
    KeywordRule {
        requires: None,
        contains: &["开发", "development"],
        equals: &[],
        section: ResumeSection::SkillDevelopment,
    },
    KeywordRule {
        requires: None,
        contains: &["设计", "design"],
        equals: &[],
        section: ResumeSection::SkillDesign,
    },
    KeywordRule {
        requires: None,
        contains: &["语言", "language"],
        equals: &[],
        section: ResumeSection::SkillLanguage,
    },
];

fn first_match(rules: &[KeywordRule], raw: &str) -> ResumeSection {
    let text = raw.trim().to_lowercase();
    rules
        .iter()
        .find(|r| r.matches(&text))
        .map(|r| r.section)
        .unwrap_or(ResumeSection::Other)
}

/// Classify by the type column alone.
pub fn classify_type(type_text: &str) -> ResumeSection {
    first_match(TYPE_RULES, type_text)
}

/// Classify a row from its type column, falling back to the category
/// column for skill rows whose type names no skill kind.
pub fn classify_row(type_text: &str, category: &str) -> ResumeSection {
    let section = classify_type(type_text);
    if section != ResumeSection::Other {
        return section;
    }
    let type_lower = type_text.to_lowercase();
    if type_lower.contains("技能") || !category.trim().is_empty() {
        return first_match(CATEGORY_RULES, category);
    }
    ResumeSection::Other
}

/// Skill kind named by a role/title text, used for unclassified rows that
/// still carry a skill.
pub fn classify_role(role: &str) -> ResumeSection {
    first_match(ROLE_RULES, role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResumeSection::*;

    #[test]
    fn type_keywords_in_both_languages() {
        assert_eq!(classify_type("总结"), Summary);
        assert_eq!(classify_type("Summary"), Summary);
        assert_eq!(classify_type("工作经历"), Experience);
        assert_eq!(classify_type("项目经验"), Experience);
        assert_eq!(classify_type("experience"), Experience);
        assert_eq!(classify_type("教育背景"), Education);
        assert_eq!(classify_type("技能-开发"), SkillDevelopment);
        assert_eq!(classify_type("技能 design"), SkillDesign);
        assert_eq!(classify_type("技能-语言"), SkillLanguage);
    }

    #[test]
    fn english_words_match_exactly_not_by_substring() {
        assert_eq!(classify_type("work experience"), Other);
        assert_eq!(classify_type("development"), Other);
    }

    #[test]
    fn first_rule_wins() {
        assert_eq!(classify_type("总结经历"), Summary);
    }

    #[test]
    fn category_fallback_for_skill_rows() {
        assert_eq!(classify_row("技能", "开发"), SkillDevelopment);
        assert_eq!(classify_row("", "Languages"), SkillLanguage);
        assert_eq!(classify_row("", "design"), SkillDesign);
        assert_eq!(classify_row("misc", ""), Other);
        assert_eq!(classify_row("技能", "烹饪"), Other);
    }

    #[test]
    fn type_takes_precedence_over_category() {
        assert_eq!(classify_row("教育", "开发"), Education);
    }

    #[test]
    fn role_classification() {
        assert_eq!(classify_role("前端开发"), SkillDevelopment);
        assert_eq!(classify_role("UI Design"), SkillDesign);
        assert_eq!(classify_role("Language skills"), SkillLanguage);
        assert_eq!(classify_role("manager"), Other);
    }
}
