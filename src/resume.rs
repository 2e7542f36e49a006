//! Resume assembly from Notion rows.

use crate::classify::{classify_role, classify_row, ResumeSection};
use crate::fields::{AliasRule, KeyMap};
use crate::models::{Education, Experience, Resume};
use crate::notion::PageRow;
use crate::text::split_lines;

const DEFAULT_ROLE: &str = "职位";
const DEFAULT_DEGREE: &str = "学位";

pub const ALIAS_RULES: &[AliasRule] = &[
    AliasRule {
        matches: &["类型", "type", "section"],
        aliases: &["type", "类型"],
    },
    AliasRule {
        matches: &["内容", "content", "summary", "总结"],
        aliases: &["content", "内容"],
    },
    AliasRule {
        matches: &["职位", "role", "title", "标题", "name", "名称"],
        aliases: &["role", "职位"],
    },
    AliasRule {
        matches: &["公司", "company"],
        aliases: &["company", "公司"],
    },
    AliasRule {
        matches: &["学校", "school"],
        aliases: &["school", "学校"],
    },
    AliasRule {
        matches: &["学位", "degree"],
        aliases: &["degree", "学位"],
    },
    AliasRule {
        matches: &["专业", "major"],
        aliases: &["major", "专业"],
    },
    AliasRule {
        matches: &["时间段", "period", "时间", "在职时间"],
        aliases: &["period", "时间段"],
    },
    AliasRule {
        matches: &["工作内容", "details", "内容"],
        aliases: &["details", "工作内容"],
    },
    AliasRule {
        matches: &["技能项", "skill", "技能"],
        aliases: &["skill", "技能项"],
    },
    AliasRule {
        matches: &["分类", "category", "技能分类"],
        aliases: &["category", "分类"],
    },
];

/// One resume row with its fields resolved and classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRow {
    pub page_id: String,
    pub section: ResumeSection,
    pub content: String,
    pub role: String,
    pub degree: String,
    pub company: String,
    pub school: String,
    pub major: String,
    pub period: String,
    pub details: Vec<String>,
    pub skill: String,
}

impl ResumeRow {
    pub fn from_page(page: &PageRow, keys: &KeyMap) -> Self {
        let type_text = page.text(keys, &["type", "类型"]);
        let category = page.text(keys, &["category", "分类", "技能分类"]);

        let mut role = page.text(keys, &["role", "职位"]);
        if role.is_empty() {
            role = page.text(keys, &["title", "标题", "name", "名称"]);
        }

        Self {
            page_id: page.id.clone(),
            section: classify_row(&type_text, &category),
            content: page.text(keys, &["content", "内容"]),
            role,
            degree: page.text(keys, &["degree", "学位"]),
            company: page.text(keys, &["company", "公司"]),
            school: page.text(keys, &["school", "学校"]),
            major: page.text(keys, &["major", "专业"]),
            period: page.text(keys, &["period", "时间段"]),
            details: split_lines(&page.text(keys, &["details", "工作内容"])),
            skill: page.text(keys, &["skill", "技能项"]),
        }
    }

    /// Role text, falling back to the degree column.
    fn role_or_degree(&self) -> &str {
        or_default(&self.role, &self.degree)
    }

    /// Degree column, falling back to the role text.
    fn degree_or_role(&self) -> &str {
        or_default(&self.degree, &self.role)
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Fold classified rows into a resume. Rows without identifying fields
/// for their section are skipped.
pub fn build_resume(rows: &[ResumeRow]) -> Resume {
    let mut resume = Resume::default();

    for row in rows {
        let role = row.role_or_degree();
        match row.section {
            ResumeSection::Summary => {
                resume.summary = or_default(&row.content, role).to_string();
            }
            ResumeSection::Experience => {
                if role.is_empty() && row.company.is_empty() {
                    tracing::warn!(page = %row.page_id, "skipping experience row without role or company");
                    continue;
                }
                resume.experience.push(Experience {
                    role: or_default(role, DEFAULT_ROLE).to_string(),
                    company: row.company.clone(),
                    period: row.period.clone(),
                    details: row.details.clone(),
                });
            }
            ResumeSection::Education => {
                let degree = row.degree_or_role();
                if degree.is_empty() && row.school.is_empty() {
                    tracing::warn!(page = %row.page_id, "skipping education row without degree or school");
                    continue;
                }
                resume.education.push(Education {
                    degree: or_default(degree, DEFAULT_DEGREE).to_string(),
                    school: row.school.clone(),
                    major: row.major.clone(),
                    period: row.period.clone(),
                });
            }
            section => {
                if row.skill.is_empty() {
                    tracing::warn!(page = %row.page_id, section = ?section, "skipping skill row without a skill value");
                    continue;
                }
                let section = match section {
                    ResumeSection::Other if !role.is_empty() => classify_role(role),
                    other => other,
                };
                let bucket = match section {
                    ResumeSection::SkillDevelopment => &mut resume.skills.development,
                    ResumeSection::SkillDesign => &mut resume.skills.design,
                    ResumeSection::SkillLanguage => &mut resume.skills.languages,
                    _ => {
                        tracing::warn!(page = %row.page_id, skill = %row.skill, "skipping row that matches no resume section");
                        continue;
                    }
                };
                bucket.push(row.skill.clone());
            }
        }
    }

    resume
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(section: ResumeSection) -> ResumeRow {
        ResumeRow {
            page_id: "p1".into(),
            section,
            content: String::new(),
            role: String::new(),
            degree: String::new(),
            company: String::new(),
            school: String::new(),
            major: String::new(),
            period: String::new(),
            details: Vec::new(),
            skill: String::new(),
        }
    }

    #[test]
    fn summary_prefers_content() {
        let mut r = row(ResumeSection::Summary);
        r.content = "全栈工程师".into();
        r.role = "标题".into();
        assert_eq!(build_resume(&[r]).summary, "全栈工程师");

        let mut r = row(ResumeSection::Summary);
        r.role = "只有标题".into();
        assert_eq!(build_resume(&[r]).summary, "只有标题");
    }

    #[test]
    fn experience_requires_role_or_company() {
        let empty = row(ResumeSection::Experience);
        let mut company_only = row(ResumeSection::Experience);
        company_only.company = "ACME".into();
        company_only.details = vec!["a".into(), "b".into()];

        let resume = build_resume(&[empty, company_only]);
        assert_eq!(resume.experience.len(), 1);
        assert_eq!(resume.experience[0].role, DEFAULT_ROLE);
        assert_eq!(resume.experience[0].details, vec!["a", "b"]);
    }

    #[test]
    fn education_degree_fallbacks() {
        let mut by_degree = row(ResumeSection::Education);
        by_degree.degree = "硕士".into();
        let mut by_school = row(ResumeSection::Education);
        by_school.school = "TU Berlin".into();
        let skipped = row(ResumeSection::Education);

        let resume = build_resume(&[by_degree, by_school, skipped]);
        assert_eq!(resume.education.len(), 2);
        assert_eq!(resume.education[0].degree, "硕士");
        assert_eq!(resume.education[1].degree, DEFAULT_DEGREE);
        assert_eq!(resume.education[1].school, "TU Berlin");
    }

    #[test]
    fn education_prefers_degree_column_over_title() {
        use crate::notion::PropertyValue;

        let keys = KeyMap::build(
            [
                ("类型", "k_type"),
                ("Name", "k_name"),
                ("学位", "k_degree"),
                ("学校", "k_school"),
            ],
            ALIAS_RULES,
        );
        let mut page = PageRow {
            id: "page-edu".into(),
            ..Default::default()
        };
        page.properties
            .insert("k_type".into(), PropertyValue::Select("教育背景".into()));
        page.properties
            .insert("k_name".into(), PropertyValue::Text("研究生阶段".into()));
        page.properties
            .insert("k_degree".into(), PropertyValue::Text("硕士".into()));
        page.properties
            .insert("k_school".into(), PropertyValue::Text("TU Berlin".into()));

        let r = ResumeRow::from_page(&page, &keys);
        assert_eq!(r.page_id, "page-edu");
        let resume = build_resume(&[r]);
        assert_eq!(resume.education.len(), 1);
        assert_eq!(resume.education[0].degree, "硕士");
        assert_eq!(resume.education[0].school, "TU Berlin");
    }

    #[test]
    fn education_falls_back_to_title_without_degree() {
        let mut r = row(ResumeSection::Education);
        r.role = "交换学期".into();
        let resume = build_resume(&[r]);
        assert_eq!(resume.education[0].degree, "交换学期");
    }

    #[test]
    fn experience_keeps_role_before_degree() {
        let mut r = row(ResumeSection::Experience);
        r.role = "工程师".into();
        r.degree = "硕士".into();
        assert_eq!(build_resume(&[r]).experience[0].role, "工程师");
    }

    #[test]
    fn skills_need_a_skill_value() {
        let mut dev = row(ResumeSection::SkillDevelopment);
        dev.skill = "Rust".into();
        let blank = row(ResumeSection::SkillDesign);
        let mut lang = row(ResumeSection::SkillLanguage);
        lang.skill = "Deutsch".into();

        let resume = build_resume(&[dev, blank, lang]);
        assert_eq!(resume.skills.development, vec!["Rust"]);
        assert!(resume.skills.design.is_empty());
        assert_eq!(resume.skills.languages, vec!["Deutsch"]);
    }

    #[test]
    fn other_rows_classified_by_role() {
        let mut r = row(ResumeSection::Other);
        r.skill = "Figma".into();
        r.role = "UI 设计".into();
        let mut unmatched = row(ResumeSection::Other);
        unmatched.skill = "Cooking".into();
        unmatched.role = "hobby".into();

        let resume = build_resume(&[r, unmatched]);
        assert_eq!(resume.skills.design, vec!["Figma"]);
        assert!(resume.skills.development.is_empty());
        assert!(resume.skills.languages.is_empty());
    }

    #[test]
    fn from_page_resolves_aliases() {
        use crate::notion::PropertyValue;

        let keys = KeyMap::build(
            [
                ("类型", "k_type"),
                ("Name", "k_name"),
                ("公司", "k_company"),
                ("在职时间", "k_period"),
                ("工作内容", "k_details"),
            ],
            ALIAS_RULES,
        );
        let mut page = PageRow::default();
        page.properties
            .insert("k_type".into(), PropertyValue::Select("工作经历".into()));
        page.properties
            .insert("k_name".into(), PropertyValue::Text("工程师".into()));
        page.properties
            .insert("k_company".into(), PropertyValue::Text("ACME".into()));
        page.properties.insert(
            "k_period".into(),
            PropertyValue::Date {
                start: "2020-01-01".into(),
                end: Some("2022-06-30".into()),
            },
        );
        page.properties
            .insert("k_details".into(), PropertyValue::Text("a\n\n b \n".into()));

        let r = ResumeRow::from_page(&page, &keys);
        assert_eq!(r.section, ResumeSection::Experience);
        assert_eq!(r.role, "工程师");
        assert_eq!(r.company, "ACME");
        assert_eq!(r.period, "2020-01-01 → 2022-06-30");
        assert_eq!(r.details, vec!["a", "b"]);
    }
}
